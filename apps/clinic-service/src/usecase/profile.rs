//! # ドクタープロフィールユースケース
//!
//! プロフィールの取得と編集（基本情報・メールアドレス・パスワード・写真）を
//! 実装する。基本情報の更新はドクターとアカウントの 2 テーブルにまたがるため、
//! 1 トランザクションで確定する。

use std::sync::Arc;

use mediflow_domain::{
    clock::Clock,
    doctor::{Doctor, DoctorChangeSet},
    password::PlainPassword,
    user::{Email, User, UserId, UserName},
};
use mediflow_infra::{
    PasswordChecker,
    db::TransactionManager,
    media::MediaStorage,
    repository::{DoctorRepository, UserRepository},
};

use crate::{error::ServiceError, usecase::helpers::FindResultExt as _};

/// プロフィール写真の保存先ディレクトリ
const PROFILE_PHOTO_DIR: &str = "doctor/profile";

/// プロフィール表示用のビュー
///
/// ドクターとアカウントの情報をまとめて返す。
#[derive(Debug, Clone)]
pub struct DoctorProfile {
    pub doctor:       Doctor,
    pub email:        Email,
    pub account_name: UserName,
}

/// プロフィール更新入力
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// ドクター側の変更（名前・専門・紹介文）
    pub doctor:       DoctorChangeSet,
    /// アカウントの表示名（ID 名）。システム全体で一意
    pub account_name: Option<UserName>,
}

/// プロフィールユースケース実装
pub struct ProfileUseCaseImpl {
    doctor_repo:      Arc<dyn DoctorRepository>,
    user_repo:        Arc<dyn UserRepository>,
    media_storage:    Arc<dyn MediaStorage>,
    password_checker: Arc<dyn PasswordChecker>,
    tx_manager:       Arc<dyn TransactionManager>,
    clock:            Arc<dyn Clock>,
}

impl ProfileUseCaseImpl {
    /// 新しいプロフィールユースケースを作成する
    pub fn new(
        doctor_repo: Arc<dyn DoctorRepository>,
        user_repo: Arc<dyn UserRepository>,
        media_storage: Arc<dyn MediaStorage>,
        password_checker: Arc<dyn PasswordChecker>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            doctor_repo,
            user_repo,
            media_storage,
            password_checker,
            tx_manager,
            clock,
        }
    }

    /// ドクターとアカウントをまとめて取得する
    async fn load(&self, user_id: &UserId) -> Result<(Doctor, User), ServiceError> {
        let doctor = self
            .doctor_repo
            .find_by_user_id(user_id)
            .await
            .or_not_found("ドクター")?;
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .or_not_found("ユーザー")?;
        Ok((doctor, user))
    }

    /// プロフィールを取得する
    pub async fn get_profile(&self, user_id: UserId) -> Result<DoctorProfile, ServiceError> {
        let (doctor, user) = self.load(&user_id).await?;

        Ok(DoctorProfile {
            doctor,
            email: user.email().clone(),
            account_name: user.name().clone(),
        })
    }

    /// プロフィールを更新する
    ///
    /// ドクターの基本情報とアカウントの表示名を 1 トランザクションで更新する。
    /// どちらか片方だけが残ることはない。
    ///
    /// ## エラー
    ///
    /// - ドクターまたはアカウントが見つからない場合
    /// - 表示名が既に使用されている場合（`name` フィールドのバリデーションエラー）
    /// - データベースエラー
    pub async fn update_profile(
        &self,
        input: UpdateProfileInput,
        user_id: UserId,
    ) -> Result<DoctorProfile, ServiceError> {
        let (doctor, user) = self.load(&user_id).await?;

        // 表示名の一意性チェックは書き込み前に行う
        if let Some(account_name) = &input.account_name {
            let taken = self
                .user_repo
                .name_taken(account_name, user.id())
                .await
                .map_err(|e| ServiceError::Internal(format!("表示名の確認に失敗: {}", e)))?;
            if taken {
                return Err(ServiceError::Validation {
                    field:   "name",
                    message: "ID名の値は既に存在しています。".to_string(),
                });
            }
        }

        let now = self.clock.now();
        let updated_doctor = doctor.edited(input.doctor, now);
        let updated_user = match input.account_name {
            Some(account_name) => user.with_name(account_name, now),
            None => user,
        };

        let mut tx = self.tx_manager.begin().await?;
        self.doctor_repo
            .update(&updated_doctor, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("プロフィールの保存に失敗: {}", e)))?;
        self.user_repo
            .update(&updated_user, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("アカウントの保存に失敗: {}", e)))?;
        tx.commit().await?;

        Ok(DoctorProfile {
            doctor: updated_doctor,
            email: updated_user.email().clone(),
            account_name: updated_user.name().clone(),
        })
    }

    /// メールアドレスを変更する
    ///
    /// ## エラー
    ///
    /// - メールアドレスが既に使用されている場合
    ///   （`email` フィールドのバリデーションエラー）
    pub async fn update_email(
        &self,
        email: Email,
        user_id: UserId,
    ) -> Result<DoctorProfile, ServiceError> {
        let (doctor, user) = self.load(&user_id).await?;

        let taken = self
            .user_repo
            .email_taken(&email, user.id())
            .await
            .map_err(|e| ServiceError::Internal(format!("メールアドレスの確認に失敗: {}", e)))?;
        if taken {
            return Err(ServiceError::Validation {
                field:   "email",
                message: "メールアドレスの値は既に存在しています。".to_string(),
            });
        }

        let now = self.clock.now();
        let updated_user = user.with_email(email, now);

        let mut tx = self.tx_manager.begin().await?;
        self.user_repo
            .update(&updated_user, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("アカウントの保存に失敗: {}", e)))?;
        tx.commit().await?;

        Ok(DoctorProfile {
            doctor,
            email: updated_user.email().clone(),
            account_name: updated_user.name().clone(),
        })
    }

    /// パスワードを変更する
    ///
    /// ## エラー
    ///
    /// - 現在のパスワードが一致しない場合
    ///   （`current_password` フィールドのバリデーションエラー）
    pub async fn update_password(
        &self,
        current_password: PlainPassword,
        new_password: PlainPassword,
        user_id: UserId,
    ) -> Result<(), ServiceError> {
        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await
            .or_not_found("ユーザー")?;

        let verify_result = self
            .password_checker
            .verify(&current_password, user.password_hash())
            .map_err(|e| ServiceError::Internal(format!("パスワードの検証に失敗: {}", e)))?;
        if verify_result.is_mismatch() {
            return Err(ServiceError::Validation {
                field:   "current_password",
                message: "現在のパスワードが間違っています。".to_string(),
            });
        }

        let new_hash = self
            .password_checker
            .hash(&new_password)
            .map_err(|e| ServiceError::Internal(format!("パスワードの更新に失敗: {}", e)))?;
        let updated_user = user.with_password_hash(new_hash, self.clock.now());

        let mut tx = self.tx_manager.begin().await?;
        self.user_repo
            .update(&updated_user, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("アカウントの保存に失敗: {}", e)))?;
        tx.commit().await?;

        Ok(())
    }

    /// プロフィール写真を保存し、ドクターに紐づける
    pub async fn upload_photo(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
        user_id: UserId,
    ) -> Result<String, ServiceError> {
        let doctor = self
            .doctor_repo
            .find_by_user_id(&user_id)
            .await
            .or_not_found("ドクター")?;

        let photo_path = self
            .media_storage
            .store_photo(PROFILE_PHOTO_DIR, content_type, bytes)
            .await
            .map_err(|e| match e.kind() {
                mediflow_infra::InfraErrorKind::InvalidInput(msg) => {
                    ServiceError::BadRequest(msg.clone())
                }
                _ => ServiceError::Internal(format!("写真の保存に失敗: {}", e)),
            })?;

        let updated_doctor = doctor.with_photo_path(photo_path.clone(), self.clock.now());

        let mut tx = self.tx_manager.begin().await?;
        self.doctor_repo
            .update(&updated_doctor, &mut tx)
            .await
            .map_err(|e| ServiceError::Internal(format!("プロフィールの保存に失敗: {}", e)))?;
        tx.commit().await?;

        Ok(photo_path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use mediflow_domain::{
        clinic::ClinicId,
        clock::FixedClock,
        doctor::{DoctorId, DoctorRecord},
        password::PasswordHash,
        user::UserRecord,
        value_objects::DoctorName,
    };
    use mediflow_infra::{
        Argon2PasswordChecker,
        mock::{
            MockDoctorRepository,
            MockMediaStorage,
            MockTransactionManager,
            MockUserRepository,
        },
    };

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    struct TestFixture {
        doctor_repo: MockDoctorRepository,
        user_repo:   MockUserRepository,
        sut:         ProfileUseCaseImpl,
    }

    fn fixture() -> TestFixture {
        let doctor_repo = MockDoctorRepository::new();
        let user_repo = MockUserRepository::new();
        let sut = ProfileUseCaseImpl::new(
            Arc::new(doctor_repo.clone()),
            Arc::new(user_repo.clone()),
            Arc::new(MockMediaStorage::new()),
            Arc::new(Argon2PasswordChecker::new()),
            Arc::new(MockTransactionManager::new()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        TestFixture {
            doctor_repo,
            user_repo,
            sut,
        }
    }

    // password123 のハッシュ（Argon2id）
    const TEST_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

    /// ドクターとアカウントを一式シードする
    fn seed_doctor(f: &TestFixture, name: &str, account_name: &str, email: &str) -> UserId {
        let now = fixed_now();
        let user_id = UserId::new();
        f.user_repo.add_user(User::from_db(UserRecord {
            id: user_id.clone(),
            email: Email::new(email).unwrap(),
            name: UserName::new(account_name).unwrap(),
            password_hash: PasswordHash::new(TEST_HASH),
            created_at: now,
            updated_at: now,
        }));
        f.doctor_repo.add_doctor(Doctor::from_db(DoctorRecord {
            id: DoctorId::new(),
            clinic_id: ClinicId::new(),
            user_id: user_id.clone(),
            name: DoctorName::new(name).unwrap(),
            specialty: None,
            biography: None,
            photo_path: None,
            created_at: now,
            updated_at: now,
        }));
        user_id
    }

    #[tokio::test]
    async fn test_get_profile_正常系() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let profile = f.sut.get_profile(user_id).await.unwrap();

        assert_eq!(profile.doctor.name().as_str(), "山田太郎");
        assert_eq!(profile.email.as_str(), "yamada@example.com");
        assert_eq!(profile.account_name.as_str(), "yamada");
    }

    #[tokio::test]
    async fn test_get_profile_存在しないユーザーはnot_found() {
        let f = fixture();

        let result = f.sut.get_profile(UserId::new()).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile_ドクターとアカウントを更新する() {
        // Arrange
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let input = UpdateProfileInput {
            doctor:       DoctorChangeSet {
                name:      Some(DoctorName::new("山田次郎").unwrap()),
                specialty: Some("皮膚科".to_string()),
                biography: None,
            },
            account_name: Some(UserName::new("yamada2").unwrap()),
        };

        // Act
        let profile = f.sut.update_profile(input, user_id.clone()).await.unwrap();

        // Assert: 戻り値と保存済みデータの両方が更新されている
        assert_eq!(profile.doctor.name().as_str(), "山田次郎");
        assert_eq!(profile.doctor.specialty(), Some("皮膚科"));
        assert_eq!(profile.account_name.as_str(), "yamada2");

        let stored_doctor = f
            .doctor_repo
            .find_by_user_id(&user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_doctor.name().as_str(), "山田次郎");
        let stored_user = f.user_repo.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(stored_user.name().as_str(), "yamada2");
    }

    #[tokio::test]
    async fn test_update_profile_表示名重複はvalidationエラーで未更新() {
        // Arrange: 別アカウントが "taken" を使用中
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");
        seed_doctor(&f, "既存太郎", "taken", "taken@example.com");

        let input = UpdateProfileInput {
            doctor:       DoctorChangeSet {
                name: Some(DoctorName::new("山田次郎").unwrap()),
                ..Default::default()
            },
            account_name: Some(UserName::new("taken").unwrap()),
        };

        // Act
        let result = f.sut.update_profile(input, user_id.clone()).await;

        // Assert: name フィールドのエラーで、ドクター側の変更も残らない
        assert!(matches!(
            result,
            Err(ServiceError::Validation { field: "name", .. })
        ));
        let stored_doctor = f
            .doctor_repo
            .find_by_user_id(&user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_doctor.name().as_str(), "山田太郎");
    }

    #[tokio::test]
    async fn test_update_profile_自分の表示名は重複扱いしない() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let input = UpdateProfileInput {
            doctor:       DoctorChangeSet::default(),
            account_name: Some(UserName::new("yamada").unwrap()),
        };

        let result = f.sut.update_profile(input, user_id).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_email_正常系() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let profile = f
            .sut
            .update_email(Email::new("new@example.com").unwrap(), user_id.clone())
            .await
            .unwrap();

        assert_eq!(profile.email.as_str(), "new@example.com");
        let stored = f.user_repo.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.email().as_str(), "new@example.com");
    }

    #[tokio::test]
    async fn test_update_email_重複はvalidationエラー() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");
        seed_doctor(&f, "既存太郎", "taken", "taken@example.com");

        let result = f
            .sut
            .update_email(Email::new("taken@example.com").unwrap(), user_id)
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Validation { field: "email", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_password_正常系() {
        // Arrange
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        // Act
        f.sut
            .update_password(
                PlainPassword::new("password123"),
                PlainPassword::new("new-password"),
                user_id.clone(),
            )
            .await
            .unwrap();

        // Assert: 新しいパスワードで検証に通る
        let stored = f.user_repo.find_by_id(&user_id).await.unwrap().unwrap();
        let checker = Argon2PasswordChecker::new();
        let result = checker
            .verify(&PlainPassword::new("new-password"), stored.password_hash())
            .unwrap();
        assert!(result.is_match());
    }

    #[tokio::test]
    async fn test_update_password_現在パスワード不一致はvalidationエラー() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let result = f
            .sut
            .update_password(
                PlainPassword::new("wrong-password"),
                PlainPassword::new("new-password"),
                user_id.clone(),
            )
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Validation {
                field: "current_password",
                ..
            })
        ));
        // パスワードは変更されていない
        let stored = f.user_repo.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash().as_str(), TEST_HASH);
    }

    #[tokio::test]
    async fn test_upload_photo_ドクターに写真パスが紐づく() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let path = f
            .sut
            .upload_photo("image/png", vec![0x89, 0x50], user_id.clone())
            .await
            .unwrap();

        assert!(path.starts_with("doctor/profile/"));
        let stored = f
            .doctor_repo
            .find_by_user_id(&user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.photo_path(), Some(path.as_str()));
    }

    #[tokio::test]
    async fn test_upload_photo_対応外の形式はbad_request() {
        let f = fixture();
        let user_id = seed_doctor(&f, "山田太郎", "yamada", "yamada@example.com");

        let result = f
            .sut
            .upload_photo("application/zip", vec![0x50, 0x4B], user_id)
            .await;

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
