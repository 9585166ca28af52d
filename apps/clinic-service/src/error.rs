//! # Clinic Service エラー定義
//!
//! Clinic Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! インフラ層・ドメイン層の詳細なエラーはここで HTTP ステータスと
//! ユーザー向けメッセージに変換される。500 系のレスポンスには内部詳細を
//! 含めず、詳細はログにのみ出力する。

use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// エラーレスポンス（RFC 7807 Problem Details）
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
    /// フィールド単位のバリデーションエラー
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors:     Option<HashMap<String, Vec<String>>>,
}

/// Clinic Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// フィールド単位のバリデーションエラー
    ///
    /// レスポンスの `errors` にフィールド名をキーとしたメッセージを含める。
    #[error("バリデーションエラー: {message}")]
    Validation {
        /// エラーが発生したフィールド名
        field:   &'static str,
        message: String,
    },

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] mediflow_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_type, title, detail, errors) = match &self {
            ServiceError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "https://mediflow.example.com/errors/not-found",
                "Not Found",
                msg.clone(),
                None,
            ),
            ServiceError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "https://mediflow.example.com/errors/bad-request",
                "Bad Request",
                msg.clone(),
                None,
            ),
            ServiceError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                "https://mediflow.example.com/errors/validation",
                "Bad Request",
                "エラーが発生しました。".to_string(),
                Some(HashMap::from([(
                    (*field).to_string(),
                    vec![message.clone()],
                )])),
            ),
            ServiceError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "https://mediflow.example.com/errors/forbidden",
                "Forbidden",
                msg.clone(),
                None,
            ),
            ServiceError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "https://mediflow.example.com/errors/conflict",
                "Conflict",
                msg.clone(),
                None,
            ),
            ServiceError::Database(e) => {
                tracing::error!(span_trace = %e.span_trace(), "データベースエラー: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://mediflow.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                    None,
                )
            }
            ServiceError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://mediflow.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error_type: error_type.to_string(),
                title: title.to_string(),
                status: status.as_u16(),
                detail,
                errors,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_foundは404になる() {
        let response = ServiceError::NotFound("予約が見つかりません".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validationは400になる() {
        let response = ServiceError::Validation {
            field:   "name",
            message: "ID名の値は既に存在しています。".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflictは409になる() {
        let response = ServiceError::Conflict("更新が競合しました".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_内部エラーは500になり詳細を漏らさない() {
        let response =
            ServiceError::Internal("接続文字列 postgres://secret".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_エラーレスポンスはerrorsマップを含められる() {
        let body = ErrorResponse {
            error_type: "https://mediflow.example.com/errors/validation".to_string(),
            title:      "Bad Request".to_string(),
            status:     400,
            detail:     "エラーが発生しました。".to_string(),
            errors:     Some(HashMap::from([(
                "email".to_string(),
                vec!["メールアドレスの値は既に存在しています。".to_string()],
            )])),
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json["errors"]["email"][0],
            "メールアドレスの値は既に存在しています。"
        );
    }

    #[test]
    fn test_エラーレスポンスはerrorsがnoneなら省略する() {
        let body = ErrorResponse {
            error_type: "https://mediflow.example.com/errors/not-found".to_string(),
            title:      "Not Found".to_string(),
            status:     404,
            detail:     "予約が見つかりません".to_string(),
            errors:     None,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert!(json.get("errors").is_none());
    }
}
