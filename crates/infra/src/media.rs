//! # メディアストレージ
//!
//! 写真アップロードの保存先（Amazon S3 / MinIO）を管理する。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: MinIO を使用（`S3_ENDPOINT_URL` で接続先を指定）
//! - **本番環境**: IAM ロールによる認証で Amazon S3 に接続（`S3_ENDPOINT_URL` 未設定）
//! - **サーバー経由アップロード**: ハンドラが受け取った生のバイト列を
//!   そのまま保存し、オブジェクトキーを返す

use async_trait::async_trait;
use aws_sdk_s3::{Client, primitives::ByteStream};
use rand::{Rng as _, distr::Alphanumeric};

use crate::error::InfraError;

/// オブジェクトキーのランダム部分の長さ
const KEY_RANDOM_LENGTH: usize = 25;

/// アップロード可能な MIME タイプと拡張子の対応
///
/// 対応外の MIME タイプは `InvalidInput` として拒否する。
pub(crate) fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// メディアストレージのインターフェース
///
/// 生のアップロードバイト列を保存し、保存先のパス（オブジェクトキー）を返す。
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// 写真を保存して保存先のパスを返す
    ///
    /// # 引数
    ///
    /// * `directory` - 保存先ディレクトリ（例: `doctor/profile`）
    /// * `content_type` - MIME タイプ（例: `image/jpeg`）
    /// * `bytes` - アップロードされたファイルの中身
    ///
    /// # エラー
    ///
    /// - `InvalidInput`: 対応していない MIME タイプ
    /// - `Storage`: アップロードの失敗
    async fn store_photo(
        &self,
        directory: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, InfraError>;
}

/// S3 クライアントを作成する
///
/// `endpoint_url` を指定すると MinIO などの互換ストレージに接続する。
/// 未指定の場合は AWS のデフォルト解決（IAM ロール等）を使用する。
pub async fn create_client(endpoint_url: Option<&str>) -> Client {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    match endpoint_url {
        Some(url) => {
            // MinIO は virtual-hosted style を解決できないため path style を強制する
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(url)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        }
        None => Client::new(&config),
    }
}

/// S3 実装の MediaStorage
///
/// MinIO とも互換動作する。
pub struct S3MediaStorage {
    client:      Client,
    bucket_name: String,
}

impl S3MediaStorage {
    /// 新しいメディアストレージを作成する
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    /// ランダムなオブジェクトキーを生成する
    fn generate_key(directory: &str, extension: &str) -> String {
        let name: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(KEY_RANDOM_LENGTH)
            .map(char::from)
            .collect();
        format!("{directory}/{name}.{extension}")
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn store_photo(
        &self,
        directory: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, InfraError> {
        let Some(extension) = extension_for(content_type) else {
            return Err(InfraError::invalid_input(format!(
                "対応していないファイル形式です: {content_type}"
            )));
        };

        let key = Self::generate_key(directory, extension);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| InfraError::storage(format!("写真のアップロードに失敗: {e}")))?;

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_対応するmimeタイプの拡張子() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/gif"), Some("gif"));
        assert_eq!(extension_for("image/svg+xml"), Some("svg"));
    }

    #[test]
    fn test_対応外のmimeタイプはnone() {
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_オブジェクトキーはディレクトリと拡張子を含む() {
        let key = S3MediaStorage::generate_key("doctor/profile", "jpg");

        assert!(key.starts_with("doctor/profile/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn test_オブジェクトキーは毎回異なる() {
        let key1 = S3MediaStorage::generate_key("upload/cases", "png");
        let key2 = S3MediaStorage::generate_key("upload/cases", "png");

        assert_ne!(key1, key2);
    }
}
