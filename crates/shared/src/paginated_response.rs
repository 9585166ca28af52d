//! # ページネーション付きレスポンス
//!
//! ページ番号ベースのページネーションに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリスト + ページ情報の形式。
/// クリニックのダッシュボードがページ送りで予約一覧をポーリングするため、
/// カーソルではなくページ番号方式を採用している。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "page": 1,
///   "per_page": 20,
///   "total": 57
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:     Vec<T>,
    /// 現在のページ番号（1 始まり）
    pub page:     u32,
    /// 1 ページあたりの件数
    pub per_page: u32,
    /// フィルタ条件に一致する総件数
    pub total:    u64,
}

impl<T> PaginatedResponse<T> {
    /// 新しい `PaginatedResponse` を作成する
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            page,
            per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでページ情報を含む() {
        let response = PaginatedResponse::new(vec![1, 2, 3], 2, 3, 10);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "data": [1, 2, 3],
                "page": 2,
                "per_page": 3,
                "total": 10,
            })
        );
    }

    #[test]
    fn test_空リストでもシリアライズできる() {
        let response: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 20, 0);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["total"], 0);
    }
}
