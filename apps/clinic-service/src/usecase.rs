//! # ユースケース層
//!
//! ハンドラから呼び出されるビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **リポジトリは trait 経由**: テストではインメモリモックに差し替える
//! - **変更操作は 1 トランザクション**: `TransactionManager::begin()` で
//!   取得した `TxContext` にすべての書き込みを通し、`commit()` で確定する。
//!   途中でエラーになった場合は `TxContext` のドロップがロールバックする
//! - **権限チェックは書き込み前**: 操作対象がリクエスト元クリニックに
//!   属することを、いかなる書き込みよりも先に検証する

mod helpers;
pub mod profile;
pub mod reservation;

pub use profile::{DoctorProfile, ProfileUseCaseImpl, UpdateProfileInput};
pub use reservation::ReservationUseCaseImpl;
