//! # クリニック
//!
//! クリニックの識別子を定義する。
//!
//! すべての予約とドクターはちょうど 1 つのクリニックに属する。
//! クリニック自体の管理（開設・設定変更）は別系統の管理画面が担当するため、
//! このクレートでは識別子のみを扱う。

define_uuid_id! {
    /// クリニック ID
    ///
    /// 予約・ドクターのスコープ単位。API 層はすべての操作で
    /// 操作対象がこの ID に属することを検証する。
    pub struct ClinicId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_クリニックidはuuidから復元できる() {
        let id = ClinicId::new();
        let restored = ClinicId::from_uuid(*id.as_uuid());
        assert_eq!(id, restored);
    }

    #[test]
    fn test_クリニックidのdisplayはuuid文字列() {
        let id = ClinicId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
