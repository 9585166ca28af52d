//! ヘルスチェックハンドラ

use axum::Json;
use mediflow_shared::HealthResponse;

/// ヘルスチェック
///
/// ## エンドポイント
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ヘルスチェックはhealthyを返す() {
        let Json(response) = health_check().await;

        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
