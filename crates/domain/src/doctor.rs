//! # ドクター
//!
//! ドクタープロフィールのエンティティを定義する。
//!
//! ドクターはちょうど 1 つのクリニックに属し、1 つのログインアカウント
//! （[`crate::user::User`]）に紐づく。プロフィール編集画面から
//! 名前・専門・紹介文・写真を変更できる。

use chrono::{DateTime, Utc};

use crate::{clinic::ClinicId, user::UserId, value_objects::DoctorName};

define_uuid_id! {
    /// ドクター ID
    pub struct DoctorId;
}

/// ドクタープロフィールエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctor {
    id: DoctorId,
    clinic_id: ClinicId,
    user_id: UserId,
    name: DoctorName,
    specialty: Option<String>,
    biography: Option<String>,
    photo_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// ドクタープロフィールの DB 復元パラメータ
pub struct DoctorRecord {
    pub id: DoctorId,
    pub clinic_id: ClinicId,
    pub user_id: UserId,
    pub name: DoctorName,
    pub specialty: Option<String>,
    pub biography: Option<String>,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// プロフィール更新の変更セット
///
/// `None` のフィールドは変更しない。許可されたフィールドのみを列挙し、
/// リクエストペイロードの丸ごとマージを避ける。
#[derive(Debug, Clone, Default)]
pub struct DoctorChangeSet {
    pub name:      Option<DoctorName>,
    pub specialty: Option<String>,
    pub biography: Option<String>,
}

impl Doctor {
    /// 既存のデータから復元する
    pub fn from_db(record: DoctorRecord) -> Self {
        Self {
            id: record.id,
            clinic_id: record.clinic_id,
            user_id: record.user_id,
            name: record.name,
            specialty: record.specialty,
            biography: record.biography,
            photo_path: record.photo_path,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn id(&self) -> &DoctorId {
        &self.id
    }

    pub fn clinic_id(&self) -> &ClinicId {
        &self.clinic_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn name(&self) -> &DoctorName {
        &self.name
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn biography(&self) -> Option<&str> {
        self.biography.as_deref()
    }

    pub fn photo_path(&self) -> Option<&str> {
        self.photo_path.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 変更セットを適用した新しいインスタンスを返す
    pub fn edited(self, change_set: DoctorChangeSet, now: DateTime<Utc>) -> Self {
        Self {
            name: change_set.name.unwrap_or(self.name),
            specialty: change_set.specialty.or(self.specialty),
            biography: change_set.biography.or(self.biography),
            updated_at: now,
            ..self
        }
    }

    /// プロフィール写真のパスを設定した新しいインスタンスを返す
    pub fn with_photo_path(self, photo_path: String, now: DateTime<Utc>) -> Self {
        Self {
            photo_path: Some(photo_path),
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

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[fixture]
    fn test_doctor(now: DateTime<Utc>) -> Doctor {
        Doctor::from_db(DoctorRecord {
            id: DoctorId::new(),
            clinic_id: ClinicId::new(),
            user_id: UserId::new(),
            name: DoctorName::new("山田太郎").unwrap(),
            specialty: Some("内科".to_string()),
            biography: None,
            photo_path: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[rstest]
    fn test_変更セット適用後の状態(test_doctor: Doctor, now: DateTime<Utc>) {
        let later = now + chrono::Duration::hours(1);
        let change_set = DoctorChangeSet {
            name:      Some(DoctorName::new("山田次郎").unwrap()),
            specialty: None,
            biography: Some("20 年の臨床経験".to_string()),
        };

        let sut = test_doctor.edited(change_set, later);

        assert_eq!(sut.name().as_str(), "山田次郎");
        // None のフィールドは変更されない
        assert_eq!(sut.specialty(), Some("内科"));
        assert_eq!(sut.biography(), Some("20 年の臨床経験"));
        assert_eq!(sut.updated_at(), later);
    }

    #[rstest]
    fn test_空の変更セットは何も変えない(test_doctor: Doctor, now: DateTime<Utc>) {
        let before = test_doctor.clone();

        let sut = test_doctor.edited(DoctorChangeSet::default(), now);

        assert_eq!(sut.name(), before.name());
        assert_eq!(sut.specialty(), before.specialty());
        assert_eq!(sut.biography(), before.biography());
    }

    #[rstest]
    fn test_写真パス設定後の状態(test_doctor: Doctor, now: DateTime<Utc>) {
        let sut = test_doctor.with_photo_path("doctor/profile/abc.jpg".to_string(), now);

        assert_eq!(sut.photo_path(), Some("doctor/profile/abc.jpg"));
    }
}
