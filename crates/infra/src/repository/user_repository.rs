//! # UserRepository
//!
//! ログインアカウントの永続化を担当するリポジトリ。
//!
//! メールアドレスと表示名の一意性チェックもここで提供する。
//! DB 側にも UNIQUE 制約があるが、事前チェックによって
//! フィールド単位のバリデーションエラーとして返せるようにする。

use async_trait::async_trait;
use mediflow_domain::{
    password::PasswordHash,
    user::{Email, User, UserId, UserName, UserRecord},
};
use sqlx::{PgPool, Row as _, postgres::PgRow};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ID でユーザーを取得する
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// ユーザーを更新する
    async fn update(&self, user: &User, tx: &mut TxContext) -> Result<(), InfraError>;

    /// 指定ユーザー以外でメールアドレスが使用済みか確認する
    async fn email_taken(&self, email: &Email, exclude: &UserId) -> Result<bool, InfraError>;

    /// 指定ユーザー以外で表示名が使用済みか確認する
    async fn name_taken(&self, name: &UserName, exclude: &UserId) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// 新しいリポジトリインスタンスを作成する
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> Result<User, InfraError> {
    let email = Email::new(row.try_get::<String, _>("email")?)
        .map_err(|e| InfraError::unexpected(e.to_string()))?;
    let name = UserName::new(row.try_get::<String, _>("name")?)
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(User::from_db(UserRecord {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        email,
        name,
        password_hash: PasswordHash::new(row.try_get::<String, _>("password_hash")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query(
            "SELECT id, email, name, password_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update(&self, user: &User, tx: &mut TxContext) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $1,
                name = $2,
                password_hash = $3,
                updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(user.email().as_str())
        .bind(user.name().as_str())
        .bind(user.password_hash().as_str())
        .bind(user.updated_at())
        .bind(user.id().as_uuid())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn email_taken(&self, email: &Email, exclude: &UserId) -> Result<bool, InfraError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
            .bind(email.as_str())
            .bind(exclude.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn name_taken(&self, name: &UserName, exclude: &UserId) -> Result<bool, InfraError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE name = $1 AND id <> $2)")
            .bind(name.as_str())
            .bind(exclude.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<bool, _>(0)?)
    }
}
