//! # ユーザーアカウント
//!
//! ログインアカウントのエンティティと関連する値オブジェクトを定義する。
//!
//! ドクターは 1 人につき 1 つのアカウントを持ち、
//! プロフィール編集画面からメールアドレス・表示名・パスワードを変更できる。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: フィールドは基本的に不変、変更はメソッド経由で新インスタンスを返す
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行

use chrono::{DateTime, Utc};

use crate::{DomainError, password::PasswordHash};

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    pub struct UserId;
}

define_validated_string! {
    /// アカウント表示名（値オブジェクト）
    ///
    /// クリニック内で一意である必要がある（一意性の検証はリポジトリが担当）。
    /// PII のため、Debug 出力はマスクされる。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 最大 100 文字
    pub struct UserName {
        label: "ユーザー名",
        max_length: 100,
        pii: true,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式であること
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーアカウントエンティティ
///
/// ドクターのログインアカウント。メールアドレス・表示名・パスワードハッシュを
/// 保持する。表示名はクリニック内で一意。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    name: UserName,
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// ユーザーアカウントの DB 復元パラメータ
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub name: UserName,
    pub password_hash: PasswordHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 既存のデータから復元する
    pub fn from_db(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            password_hash: record.password_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 表示名を変更した新しいインスタンスを返す
    pub fn with_name(self, name: UserName, now: DateTime<Utc>) -> Self {
        Self {
            name,
            updated_at: now,
            ..self
        }
    }

    /// メールアドレスを変更した新しいインスタンスを返す
    pub fn with_email(self, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            email,
            updated_at: now,
            ..self
        }
    }

    /// パスワードハッシュを変更した新しいインスタンスを返す
    pub fn with_password_hash(self, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            password_hash,
            updated_at: now,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    // Email のテスト

    #[rstest]
    #[case("user@example.com")]
    #[case("a@b")]
    fn test_メールアドレスは正常な形式を受け入れる(#[case] input: &str) {
        assert!(Email::new(input).is_ok());
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("no-at-mark", "アットマークなし")]
    #[case("@example.com", "ローカル部なし")]
    #[case("user@", "ドメイン部なし")]
    fn test_メールアドレスは不正な形式を拒否する(
        #[case] input: &str,
        #[case] _reason: &str,
    ) {
        assert!(Email::new(input).is_err());
    }

    #[test]
    fn test_メールアドレスは256文字以上を拒否する() {
        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(Email::new(long_email).is_err());
    }

    // User のテスト

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[fixture]
    fn test_user(now: DateTime<Utc>) -> User {
        User::from_db(UserRecord {
            id: UserId::new(),
            email: Email::new("doctor@example.com").unwrap(),
            name: UserName::new("yamada").unwrap(),
            password_hash: PasswordHash::new("$argon2id$..."),
            created_at: now,
            updated_at: now,
        })
    }

    #[rstest]
    fn test_表示名変更後の状態(test_user: User, now: DateTime<Utc>) {
        let later = now + chrono::Duration::hours(1);
        let new_name = UserName::new("yamada2").unwrap();

        let sut = test_user.clone().with_name(new_name.clone(), later);

        assert_eq!(sut.name(), &new_name);
        assert_eq!(sut.updated_at(), later);
        assert_eq!(sut.email(), test_user.email());
    }

    #[rstest]
    fn test_メールアドレス変更後の状態(test_user: User, now: DateTime<Utc>) {
        let later = now + chrono::Duration::hours(1);
        let new_email = Email::new("new@example.com").unwrap();

        let sut = test_user.clone().with_email(new_email.clone(), later);

        assert_eq!(sut.email(), &new_email);
        assert_eq!(sut.updated_at(), later);
        assert_eq!(sut.name(), test_user.name());
    }

    #[rstest]
    fn test_パスワードハッシュ変更後の状態(test_user: User, now: DateTime<Utc>) {
        let later = now + chrono::Duration::hours(1);
        let new_hash = PasswordHash::new("$argon2id$new");

        let sut = test_user.clone().with_password_hash(new_hash.clone(), later);

        assert_eq!(sut.password_hash(), &new_hash);
        assert_eq!(sut.updated_at(), later);
    }
}
