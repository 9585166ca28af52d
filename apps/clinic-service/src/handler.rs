//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - リクエスト DTO は `deny_unknown_fields` で許可フィールドを閉じる

pub mod health;
pub mod profile;
pub mod reservation;

pub use health::health_check;
pub use profile::{
    ProfileState,
    get_profile,
    update_email,
    update_password,
    update_profile,
    upload_profile_photo,
};
pub use reservation::{
    ReservationState,
    count_reservations,
    delete_reservation,
    get_reservation,
    list_doctors,
    list_payment_reservations,
    list_reservations,
    record_payment,
    update_reservation,
    update_reservation_with_patient,
    update_status,
    upload_reservation_photo,
};
