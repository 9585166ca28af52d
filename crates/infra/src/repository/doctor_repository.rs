//! # DoctorRepository
//!
//! ドクタープロフィールの永続化を担当するリポジトリ。

use async_trait::async_trait;
use mediflow_domain::{
    clinic::ClinicId,
    doctor::{Doctor, DoctorId, DoctorRecord},
    user::UserId,
    value_objects::DoctorName,
};
use sqlx::{PgPool, Row as _, postgres::PgRow};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ドクターリポジトリトレイト
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    /// ID でドクターを取得する
    async fn find_by_id(&self, id: &DoctorId) -> Result<Option<Doctor>, InfraError>;

    /// ログインアカウントの ID でドクターを取得する
    ///
    /// プロフィール編集画面は認証済みユーザー ID を起点にするため、
    /// この検索が主経路になる。
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Doctor>, InfraError>;

    /// クリニック所属のドクター一覧を取得する
    async fn find_by_clinic(&self, clinic_id: &ClinicId) -> Result<Vec<Doctor>, InfraError>;

    /// ドクターを更新する
    async fn update(&self, doctor: &Doctor, tx: &mut TxContext) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の DoctorRepository
#[derive(Debug, Clone)]
pub struct PostgresDoctorRepository {
    pool: PgPool,
}

impl PostgresDoctorRepository {
    /// 新しいリポジトリインスタンスを作成する
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const DOCTOR_COLUMNS: &str = "\
    id, clinic_id, user_id, name, specialty, biography, photo_path, \
    created_at, updated_at";

fn row_to_doctor(row: &PgRow) -> Result<Doctor, InfraError> {
    let name = DoctorName::new(row.try_get::<String, _>("name")?)
        .map_err(|e| InfraError::unexpected(e.to_string()))?;

    Ok(Doctor::from_db(DoctorRecord {
        id: DoctorId::from_uuid(row.try_get::<Uuid, _>("id")?),
        clinic_id: ClinicId::from_uuid(row.try_get::<Uuid, _>("clinic_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        name,
        specialty: row.try_get("specialty")?,
        biography: row.try_get("biography")?,
        photo_path: row.try_get("photo_path")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

#[async_trait]
impl DoctorRepository for PostgresDoctorRepository {
    async fn find_by_id(&self, id: &DoctorId) -> Result<Option<Doctor>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_doctor).transpose()
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Doctor>, InfraError> {
        let row = sqlx::query(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_doctor).transpose()
    }

    async fn find_by_clinic(&self, clinic_id: &ClinicId) -> Result<Vec<Doctor>, InfraError> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE clinic_id = $1 ORDER BY created_at"
        ))
        .bind(clinic_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_doctor).collect()
    }

    async fn update(&self, doctor: &Doctor, tx: &mut TxContext) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE doctors SET
                name = $1,
                specialty = $2,
                biography = $3,
                photo_path = $4,
                updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(doctor.name().as_str())
        .bind(doctor.specialty())
        .bind(doctor.biography())
        .bind(doctor.photo_path())
        .bind(doctor.updated_at())
        .bind(doctor.id().as_uuid())
        .execute(tx.conn())
        .await?;

        Ok(())
    }
}
