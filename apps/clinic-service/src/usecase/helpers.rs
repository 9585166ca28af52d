//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換や権限チェックなど、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use mediflow_domain::{clinic::ClinicId, reservation::Reservation};
use mediflow_infra::InfraError;

use crate::error::ServiceError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, ServiceError>` に変換する
///
/// `find_by_id` 等の `Option` を返すリポジトリメソッドの結果を、
/// `ServiceError::NotFound` または `ServiceError::Internal` に変換する。
///
/// ```ignore
/// let reservation = self.reservation_repo.find_by_id(&id).await
///     .or_not_found("予約")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `ServiceError::NotFound`、`InfraError` の場合は
    /// `ServiceError::Internal` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, ServiceError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, ServiceError> {
        self.map_err(|e| ServiceError::Internal(format!("{}の取得に失敗: {}", entity_name, e)))?
            .ok_or_else(|| ServiceError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}

/// 予約がリクエスト元クリニックに属することを確認する
///
/// すべての変更操作でいかなる書き込みよりも先に呼び出す。
/// 不一致の場合は `ServiceError::Forbidden` を返す。
pub(crate) fn check_clinic_scope(
    reservation: &Reservation,
    clinic_id: &ClinicId,
) -> Result<(), ServiceError> {
    if reservation.clinic_id() != clinic_id {
        return Err(ServiceError::Forbidden(
            "この予約を操作する権限がありません".to_string(),
        ));
    }
    Ok(())
}
