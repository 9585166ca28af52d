//! # パスワードハッシュ
//!
//! Argon2id によるパスワードの検証とハッシュ生成を提供する。

use argon2::{
    Argon2,
    Params,
    PasswordHasher as _,
    PasswordVerifier as _,
    password_hash::{PasswordHash as Argon2PasswordHash, SaltString, rand_core::OsRng},
};
use mediflow_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// パスワードの検証とハッシュ生成を担当するトレイト
pub trait PasswordChecker: Send + Sync {
    /// パスワードを検証する
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;

    /// パスワードのハッシュを生成する
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError>;
}

/// Argon2id による実装
///
/// OWASP 推奨パラメータ（RFC 9106）を使用:
/// - Memory: 64 MB
/// - Iterations: 1
/// - Parallelism: 1
pub struct Argon2PasswordChecker {
    argon2: Argon2<'static>,
}

impl Argon2PasswordChecker {
    pub fn new() -> Self {
        let params = Params::new(
            65536, // memory (KB) = 64 MB
            1,     // iterations
            1,     // parallelism
            None,  // output length (default: 32)
        )
        .expect("Argon2 パラメータが不正です");

        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordChecker for Argon2PasswordChecker {
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let parsed = Argon2PasswordHash::new(hash.as_str())
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        let matched = self
            .argon2
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok();

        Ok(PasswordVerifyResult::from(matched))
    }

    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| InfraError::unexpected(format!("ハッシュ生成に失敗: {e}")))?;

        Ok(PasswordHash::new(hash.to_string()))
    }
}
