//! # MediFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはドメイン層のエンティティを永続化するリポジトリと、
//! 外部サービス（オブジェクトストレージ、パスワードハッシュ）への
//! アクセスを提供する。外部システムの詳細をカプセル化し、
//! ドメイン層をインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プールとトランザクション管理
//! - **リポジトリ実装**: 予約・ドクター・ユーザーの永続化
//! - **メディアストレージ**: 写真アップロードの保存（S3 / MinIO）
//! - **パスワード**: Argon2id によるハッシュ生成と検証
//!
//! ## 依存関係
//!
//! ```text
//! clinic-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続とトランザクションコンテキスト
//! - [`error`] - インフラ層エラー定義
//! - [`media`] - 写真アップロードの保存先
//! - [`password`] - パスワードハッシュ
//! - [`repository`] - リポジトリ実装

pub mod db;
pub mod error;
pub mod media;
pub mod password;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{InfraError, InfraErrorKind};
pub use password::{Argon2PasswordChecker, PasswordChecker};
