//! # MediFlow ドメイン層
//!
//! クリニック予約管理のビジネスロジックの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Reservation, Doctor）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: ClinicId,
//!   PaymentAmount）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! clinic-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//! これにより、ビジネスロジックの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`reservation`] - 予約エンティティとステータス遷移（このシステムの中核）
//! - [`doctor`] - ドクタープロフィール
//! - [`user`] - ログインアカウント
//! - [`clinic`] - クリニック識別子
//! - [`value_objects`] - 共通値オブジェクト
//! - [`password`] - パスワード関連の値オブジェクト
//! - [`clock`] - テスト可能な時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義

#[macro_use]
mod macros;

pub mod clinic;
pub mod clock;
pub mod doctor;
pub mod error;
pub mod password;
pub mod reservation;
pub mod user;
pub mod value_objects;

pub use error::DomainError;

/// PII マスキング時の表示文字列
pub const REDACTED: &str = "[REDACTED]";
