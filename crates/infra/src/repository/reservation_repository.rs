//! # ReservationRepository
//!
//! 予約の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **クリニック分離**: 一覧・集計クエリは必ずクリニック ID でスコープする
//! - **楽観的ロック**: 更新は `WHERE version = $expected` の
//!   compare-and-swap で行い、競合を検出する
//! - **フラットレコード復元**: 行は [`ReservationRecord`] に詰め替え、
//!   `Reservation::from_db()` で不変条件を検証してから返す

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediflow_domain::{
    clinic::ClinicId,
    doctor::DoctorId,
    reservation::{
        PaymentMethod,
        Reservation,
        ReservationId,
        ReservationRecord,
        ReservationStatus,
    },
    user::UserId,
    value_objects::{PatientName, PaymentAmount, Version},
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _, postgres::PgRow};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 予約一覧の絞り込み条件
///
/// `clinic_id` 以外はすべて任意。`None` の条件は適用しない。
#[derive(Debug, Clone)]
pub struct ReservationFilter {
    /// 対象クリニック（必須）
    pub clinic_id:       ClinicId,
    /// 担当ドクターで絞り込む
    pub doctor_id:       Option<DoctorId>,
    /// ステータスで絞り込む
    pub status:          Option<ReservationStatus>,
    /// 予約確定フラグで絞り込む（支払い一覧は `Some(true)` を指定する）
    pub confirmed:       Option<bool>,
    /// 診療予定日時の下限
    pub scheduled_from:  Option<DateTime<Utc>>,
    /// 診療予定日時の上限
    pub scheduled_until: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    /// クリニックのみで絞り込むフィルタを作成する
    pub fn for_clinic(clinic_id: ClinicId) -> Self {
        Self {
            clinic_id,
            doctor_id: None,
            status: None,
            confirmed: None,
            scheduled_from: None,
            scheduled_until: None,
        }
    }
}

/// ページネーション指定
///
/// ページ番号は 1 始まり。1 ページあたりの件数は 1〜100 に丸める。
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    page:     u32,
    per_page: u32,
}

impl PageRequest {
    /// 1 ページあたりのデフォルト件数
    pub const DEFAULT_PER_PAGE: u32 = 20;
    /// 1 ページあたりの最大件数
    pub const MAX_PER_PAGE: u32 = 100;

    /// ページネーション指定を作成する
    ///
    /// 範囲外の値は有効範囲に丸める（エラーにはしない）。
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page:     page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL の LIMIT 値
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL の OFFSET 値
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// クリニック単位の予約件数サマリ
///
/// ダッシュボードの一覧画面に表示する集計値。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationCountSummary {
    pub total:       i64,
    pub pending:     i64,
    pub confirmed:   i64,
    pub in_progress: i64,
    pub completed:   i64,
    pub cancelled:   i64,
}

/// 予約リポジトリトレイト
///
/// 予約の永続化操作を定義する。予約の新規作成は外部の予約受付フローが
/// 担当するため、このトレイトには含まれない。
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// ID で予約を取得する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(reservation))`: 予約が見つかった場合
    /// - `Ok(None)`: 予約が見つからない場合
    /// - `Err(_)`: データベースエラー
    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError>;

    /// バージョンチェック付きで予約を更新する
    ///
    /// DB 上の version が `expected_version` と一致する場合のみ更新する。
    /// 一致しない場合は `InfraErrorKind::Conflict` を返す。
    ///
    /// # 引数
    ///
    /// - `reservation`: 更新後の予約（version はインクリメント済み）
    /// - `expected_version`: 読み取り時点の version
    /// - `tx`: トランザクションコンテキスト
    async fn update_with_version_check(
        &self,
        reservation: &Reservation,
        expected_version: Version,
        tx: &mut TxContext,
    ) -> Result<(), InfraError>;

    /// 予約を削除する
    async fn delete(&self, id: &ReservationId, tx: &mut TxContext) -> Result<(), InfraError>;

    /// 条件に一致する予約の一覧と総件数を取得する
    ///
    /// 診療予定日時の降順で返す。
    async fn list(
        &self,
        filter: &ReservationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Reservation>, u64), InfraError>;

    /// クリニック単位の件数サマリを取得する
    async fn count_summary(
        &self,
        clinic_id: &ClinicId,
    ) -> Result<ReservationCountSummary, InfraError>;
}

/// PostgreSQL 実装の ReservationRepository
#[derive(Debug, Clone)]
pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    /// 新しいリポジトリインスタンスを作成する
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RESERVATION_COLUMNS: &str = "\
    id, clinic_id, doctor_id, patient_id, scheduled_at, \
    status, confirmed, complaint, memo, patient_name, patient_phone, \
    payment_amount, payment_method, paid, paid_at, \
    version, created_at, updated_at";

/// DB の行を `Reservation` に復元する
///
/// ステータス等の文字列カラムはドメインの `FromStr` で検証する。
/// 検証に失敗する行はデータ破損とみなし `Unexpected` を返す。
fn row_to_reservation(row: &PgRow) -> Result<Reservation, InfraError> {
    let status = row
        .try_get::<String, _>("status")?
        .parse::<ReservationStatus>()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let payment_method = row
        .try_get::<Option<String>, _>("payment_method")?
        .map(|m| m.parse::<PaymentMethod>())
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let payment_amount = row
        .try_get::<Option<i64>, _>("payment_amount")?
        .map(PaymentAmount::new)
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let patient_name = row
        .try_get::<Option<String>, _>("patient_name")?
        .map(PatientName::new)
        .transpose()
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let version = Version::try_from(row.try_get::<i32, _>("version")?)
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    let reservation = Reservation::from_db(ReservationRecord {
        id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
        clinic_id: ClinicId::from_uuid(row.try_get::<Uuid, _>("clinic_id")?),
        doctor_id: DoctorId::from_uuid(row.try_get::<Uuid, _>("doctor_id")?),
        patient_id: UserId::from_uuid(row.try_get::<Uuid, _>("patient_id")?),
        scheduled_at: row.try_get("scheduled_at")?,
        status,
        confirmed: row.try_get("confirmed")?,
        complaint: row.try_get("complaint")?,
        memo: row.try_get("memo")?,
        patient_name,
        patient_phone: row.try_get("patient_phone")?,
        payment_amount,
        payment_method,
        paid: row.try_get("paid")?,
        paid_at: row.try_get("paid_at")?,
        version,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
    .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(reservation)
}

/// フィルタ条件を WHERE 句として組み立てる
///
/// 一覧クエリと件数クエリで同じ条件を使うための共通化。
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReservationFilter) {
    builder.push(" WHERE clinic_id = ");
    builder.push_bind(*filter.clinic_id.as_uuid());

    if let Some(doctor_id) = &filter.doctor_id {
        builder.push(" AND doctor_id = ");
        builder.push_bind(*doctor_id.as_uuid());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(confirmed) = filter.confirmed {
        builder.push(" AND confirmed = ");
        builder.push_bind(confirmed);
    }
    if let Some(from) = filter.scheduled_from {
        builder.push(" AND scheduled_at >= ");
        builder.push_bind(from);
    }
    if let Some(until) = filter.scheduled_until {
        builder.push(" AND scheduled_at <= ");
        builder.push_bind(until);
    }
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_reservation).transpose()
    }

    async fn update_with_version_check(
        &self,
        reservation: &Reservation,
        expected_version: Version,
        tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                doctor_id = $1,
                scheduled_at = $2,
                status = $3,
                confirmed = $4,
                complaint = $5,
                memo = $6,
                patient_name = $7,
                patient_phone = $8,
                payment_amount = $9,
                payment_method = $10,
                paid = $11,
                paid_at = $12,
                version = $13,
                updated_at = $14
            WHERE id = $15 AND version = $16
            "#,
        )
        .bind(reservation.doctor_id().as_uuid())
        .bind(reservation.scheduled_at())
        .bind(reservation.status().as_str())
        .bind(reservation.confirmed())
        .bind(reservation.complaint())
        .bind(reservation.memo())
        .bind(reservation.patient_name().map(|n| n.as_str()))
        .bind(reservation.patient_phone())
        .bind(reservation.payment_amount().map(|a| a.as_i64()))
        .bind(reservation.payment_method().map(|m| m.as_str()))
        .bind(reservation.paid())
        .bind(reservation.paid_at())
        .bind(reservation.version().as_i32())
        .bind(reservation.updated_at())
        .bind(reservation.id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                reservation_id = %reservation.id(),
                expected_version = expected_version.as_u32(),
                "予約の更新で楽観的ロック競合が発生しました"
            );
            return Err(InfraError::conflict(
                "Reservation",
                reservation.id().to_string(),
            ));
        }

        Ok(())
    }

    async fn delete(&self, id: &ReservationId, tx: &mut TxContext) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &ReservationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Reservation>, u64), InfraError> {
        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reservations");
        push_filter(&mut count_builder, filter);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations"
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY scheduled_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;
        let reservations = rows
            .iter()
            .map(row_to_reservation)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((reservations, total as u64))
    }

    async fn count_summary(
        &self,
        clinic_id: &ClinicId,
    ) -> Result<ReservationCountSummary, InfraError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM reservations WHERE clinic_id = $1 GROUP BY status",
        )
        .bind(clinic_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut summary = ReservationCountSummary::default();
        for row in rows {
            let status = row
                .try_get::<String, _>("status")?
                .parse::<ReservationStatus>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?;
            let count: i64 = row.try_get("count")?;

            summary.total += count;
            match status {
                ReservationStatus::Pending => summary.pending += count,
                ReservationStatus::Confirmed => summary.confirmed += count,
                ReservationStatus::InProgress => summary.in_progress += count,
                ReservationStatus::Completed => summary.completed += count,
                ReservationStatus::Cancelled => summary.cancelled += count,
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// トレイトオブジェクトとして使用できることを確認
    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ReservationRepository>>();
    }

    #[test]
    fn test_ページ指定は範囲外の値を丸める() {
        let page = PageRequest::new(Some(0), Some(1000));
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), PageRequest::MAX_PER_PAGE);
    }

    #[test]
    fn test_ページ指定のデフォルト値() {
        let page = PageRequest::default();
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), PageRequest::DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_オフセットはページ番号から計算する() {
        let page = PageRequest::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }
}
