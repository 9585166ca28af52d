//! # 予約ユースケース
//!
//! 予約の取得・一覧・集計と、状態変更のワークフローを実装する。
//! 状態変更操作は `reservation/command.rs` に分離している。

mod command;

use std::sync::Arc;

use mediflow_domain::{
    clinic::ClinicId,
    clock::Clock,
    doctor::Doctor,
    reservation::{Reservation, ReservationId},
};
use mediflow_infra::{
    InfraErrorKind,
    db::TransactionManager,
    media::MediaStorage,
    repository::{
        DoctorRepository,
        PageRequest,
        ReservationCountSummary,
        ReservationFilter,
        ReservationRepository,
    },
};

use crate::{
    error::ServiceError,
    usecase::helpers::{FindResultExt as _, check_clinic_scope},
};

/// 予約写真の保存先ディレクトリ
const RESERVATION_PHOTO_DIR: &str = "upload/cases";

/// 予約ユースケース実装
///
/// 予約の参照と状態変更ワークフローのビジネスロジックを実装する。
pub struct ReservationUseCaseImpl {
    reservation_repo: Arc<dyn ReservationRepository>,
    doctor_repo:      Arc<dyn DoctorRepository>,
    media_storage:    Arc<dyn MediaStorage>,
    tx_manager:       Arc<dyn TransactionManager>,
    clock:            Arc<dyn Clock>,
}

impl ReservationUseCaseImpl {
    /// 新しい予約ユースケースを作成する
    pub fn new(
        reservation_repo: Arc<dyn ReservationRepository>,
        doctor_repo: Arc<dyn DoctorRepository>,
        media_storage: Arc<dyn MediaStorage>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reservation_repo,
            doctor_repo,
            media_storage,
            tx_manager,
            clock,
        }
    }

    pub(crate) fn reservation_repo(&self) -> &dyn ReservationRepository {
        self.reservation_repo.as_ref()
    }

    pub(crate) fn tx_manager(&self) -> &dyn TransactionManager {
        self.tx_manager.as_ref()
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// 予約を 1 件取得する
    ///
    /// ## エラー
    ///
    /// - 予約が見つからない場合
    /// - 予約がリクエスト元クリニックに属さない場合
    pub async fn get_reservation(
        &self,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<Reservation, ServiceError> {
        let reservation = self
            .reservation_repo
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        Ok(reservation)
    }

    /// 条件に一致する予約の一覧と総件数を取得する
    pub async fn list_reservations(
        &self,
        filter: ReservationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Reservation>, u64), ServiceError> {
        self.reservation_repo
            .list(&filter, page)
            .await
            .map_err(|e| ServiceError::Internal(format!("予約一覧の取得に失敗: {}", e)))
    }

    /// クリニック単位の件数サマリを取得する
    pub async fn count_summary(
        &self,
        clinic_id: ClinicId,
    ) -> Result<ReservationCountSummary, ServiceError> {
        self.reservation_repo
            .count_summary(&clinic_id)
            .await
            .map_err(|e| ServiceError::Internal(format!("予約件数の集計に失敗: {}", e)))
    }

    /// クリニック所属のドクター一覧を取得する
    ///
    /// 予約編集フォームの担当ドクター選択肢に使用する。
    pub async fn list_doctors(&self, clinic_id: ClinicId) -> Result<Vec<Doctor>, ServiceError> {
        self.doctor_repo
            .find_by_clinic(&clinic_id)
            .await
            .map_err(|e| ServiceError::Internal(format!("ドクター一覧の取得に失敗: {}", e)))
    }

    /// 予約写真を保存し、保存先のパスを返す
    ///
    /// 写真はストレージに保存されるのみで、予約レコードには紐づけない
    /// （紐づけはクライアントが後続の予約更新で行う）。
    pub async fn upload_photo(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        self.media_storage
            .store_photo(RESERVATION_PHOTO_DIR, content_type, bytes)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::InvalidInput(msg) => ServiceError::BadRequest(msg.clone()),
                _ => ServiceError::Internal(format!("写真の保存に失敗: {}", e)),
            })
    }
}
