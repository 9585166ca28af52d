//! # Clinic Service 設定
//!
//! 環境変数から Clinic Service サーバーの設定を読み込む。

use std::env;

/// Clinic Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// S3 エンドポイント URL（MinIO 使用時に設定、未設定で AWS S3 デフォルト）
    pub s3_endpoint_url: Option<String>,
    /// 写真保存先の S3 バケット名
    pub s3_bucket_name: String,
}

impl ClinicConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("CLINIC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("CLINIC_PORT")
                .expect("CLINIC_PORT が設定されていません")
                .parse()
                .expect("CLINIC_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL が設定されていません"),
            s3_endpoint_url: env::var("S3_ENDPOINT_URL").ok(),
            s3_bucket_name: env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "mediflow-photos".to_string()),
        })
    }
}
