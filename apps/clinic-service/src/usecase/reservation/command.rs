//! 予約の状態変更ワークフロー
//!
//! すべての変更操作は同じ形をしている:
//!
//! 1. 予約を取得する（存在しなければ NotFound、書き込みは行わない）
//! 2. リクエスト元クリニックへの所属を確認する（書き込み前に Forbidden）
//! 3. ドメインメソッドで新しい予約を組み立てる（純粋な変換）
//! 4. トランザクション内でバージョンチェック付き更新を行い、コミットする
//!
//! コミット前にエラーになった場合は `TxContext` のドロップが
//! ロールバックするため、部分的な書き込みが観測されることはない。

use mediflow_domain::{
    clinic::ClinicId,
    reservation::{
        PatientChangeSet,
        PaymentDetails,
        Reservation,
        ReservationChangeSet,
        ReservationId,
        ReservationStatus,
    },
};
use mediflow_infra::InfraError;

use crate::{
    error::ServiceError,
    usecase::{
        helpers::{FindResultExt as _, check_clinic_scope},
        reservation::ReservationUseCaseImpl,
    },
};

/// 更新系リポジトリエラーを ServiceError に変換する
///
/// 楽観的ロック競合は 409 として返し、それ以外は内部エラーに丸める。
fn map_update_error(e: InfraError) -> ServiceError {
    if e.as_conflict().is_some() {
        ServiceError::Conflict(
            "予約は既に更新されています。最新の情報を取得してください。".to_string(),
        )
    } else {
        ServiceError::Internal(format!("予約の保存に失敗: {}", e))
    }
}

impl ReservationUseCaseImpl {
    /// 予約内容を更新する
    ///
    /// 変更セットの適用とステータスの「対応中」への遷移を
    /// 1 トランザクションで確定する。どちらか片方だけが残ることはない。
    ///
    /// ## エラー
    ///
    /// - 予約が見つからない場合
    /// - 予約がリクエスト元クリニックに属さない場合
    /// - 並行更新による競合が発生した場合
    /// - データベースエラー
    pub async fn update_reservation(
        &self,
        change_set: ReservationChangeSet,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<Reservation, ServiceError> {
        let reservation = self
            .reservation_repo()
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        let expected_version = reservation.version();
        let updated = reservation.edited(change_set, self.now());

        let mut tx = self.tx_manager().begin().await?;
        self.reservation_repo()
            .update_with_version_check(&updated, expected_version, &mut tx)
            .await
            .map_err(map_update_error)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// 患者情報を伴う予約更新
    ///
    /// [`Self::update_reservation`] と同じ契約だが、ステータスは変更しない。
    /// 患者の連絡先修正が予約を「対応中」へ進めてしまうことを防ぐための、
    /// 意図的な非対称である。
    pub async fn update_reservation_with_patient(
        &self,
        change_set: PatientChangeSet,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<Reservation, ServiceError> {
        let reservation = self
            .reservation_repo()
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        let expected_version = reservation.version();
        let updated = reservation.edited_with_patient(change_set, self.now());

        let mut tx = self.tx_manager().begin().await?;
        self.reservation_repo()
            .update_with_version_check(&updated, expected_version, &mut tx)
            .await
            .map_err(map_update_error)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// 支払いを記録する
    ///
    /// 支払いフィールドのみを更新し、ステータスは変更しない。
    pub async fn record_payment(
        &self,
        payment: PaymentDetails,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<Reservation, ServiceError> {
        let reservation = self
            .reservation_repo()
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        let expected_version = reservation.version();
        let updated = reservation.paid(payment, self.now());

        let mut tx = self.tx_manager().begin().await?;
        self.reservation_repo()
            .update_with_version_check(&updated, expected_version, &mut tx)
            .await
            .map_err(map_update_error)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// ステータスを直接変更する
    ///
    /// 遷移の正当性チェックは行わない。
    pub async fn update_status(
        &self,
        status: ReservationStatus,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<Reservation, ServiceError> {
        let reservation = self
            .reservation_repo()
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        let expected_version = reservation.version();
        let updated = reservation.with_status(status, self.now());

        let mut tx = self.tx_manager().begin().await?;
        self.reservation_repo()
            .update_with_version_check(&updated, expected_version, &mut tx)
            .await
            .map_err(map_update_error)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// 予約を削除する
    pub async fn delete_reservation(
        &self,
        id: ReservationId,
        clinic_id: ClinicId,
    ) -> Result<(), ServiceError> {
        let reservation = self
            .reservation_repo()
            .find_by_id(&id)
            .await
            .or_not_found("予約")?;

        check_clinic_scope(&reservation, &clinic_id)?;

        let mut tx = self.tx_manager().begin().await?;
        self.reservation_repo()
            .delete(&id, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("予約の削除に失敗: {}", e)))?;
        tx.commit().await?;

        Ok(())
    }
}
