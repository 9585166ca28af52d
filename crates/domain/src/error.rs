//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 楽観的ロックの失敗 |
//! | `Forbidden` | 403 Forbidden | 権限不足 |

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    /// 必須フィールドの未入力、文字数制限の超過、不正なフォーマットなど。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// 指定された ID のエンティティがデータベースに存在しない場合に使用する。
    /// `entity_type` にはエンティティの種類（"Reservation", "Doctor" など）を
    /// 指定し、エラーメッセージを具体的にする。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Reservation", "Doctor" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー（楽観的ロック失敗など）
    ///
    /// 同時更新による競合が発生した場合に使用する。
    /// このエラーを受けたクライアントは最新データを再取得してから
    /// 再度更新を試みる必要がある。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// ユーザーに操作の実行権限がない場合に使用する。
    /// 認証（401）ではなく認可（403）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
