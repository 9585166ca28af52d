//! # API レスポンスエンベロープ
//!
//! API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// API の統一レスポンス型
///
/// すべてのエンドポイントは成功時に `{ "data": T }` 形式でレスポンスを返す。
/// エラー時のレスポンスは各サービスのエラー型（RFC 7807）が担当する。
///
/// ## 使用例
///
/// ```
/// use mediflow_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーの下にペイロードが入る() {
        let response = ApiResponse::new("hello");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": "hello" }));
    }

    #[test]
    fn test_deserializeでjsonから復元できる() {
        let json = r#"{"data": 42}"#;
        let response: ApiResponse<i32> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data, 42);
    }

    #[test]
    fn test_vecペイロードをシリアライズできる() {
        let response = ApiResponse::new(vec!["a", "b"]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": ["a", "b"] }));
    }
}
