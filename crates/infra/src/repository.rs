//! # リポジトリ
//!
//! ドメインエンティティの永続化を担当するリポジトリを定義する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: ユースケース層は trait にのみ依存し、
//!   テストではインメモリモックに差し替える
//! - **書き込みは TxContext 必須**: 更新・削除メソッドは
//!   [`crate::db::TxContext`] を要求し、トランザクション外の書き込みを
//!   コンパイル時に排除する
//! - **読み取りはプール直結**: 参照系はトランザクションを要求しない

pub mod doctor_repository;
pub mod reservation_repository;
pub mod user_repository;

pub use doctor_repository::{DoctorRepository, PostgresDoctorRepository};
pub use reservation_repository::{
    PageRequest,
    PostgresReservationRepository,
    ReservationCountSummary,
    ReservationFilter,
    ReservationRepository,
};
pub use user_repository::{PostgresUserRepository, UserRepository};
