//! # ドクタープロフィール API ハンドラ
//!
//! プロフィールの取得・更新・メールアドレス変更・パスワード変更・
//! 写真アップロードのエンドポイントを実装する。

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use mediflow_domain::{
    doctor::DoctorChangeSet,
    password::PlainPassword,
    user::{Email, UserId, UserName},
    value_objects::DoctorName,
};
use mediflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::{DoctorProfile, ProfileUseCaseImpl, UpdateProfileInput},
};

/// プロフィールハンドラの共有状態
pub struct ProfileState {
    pub usecase: ProfileUseCaseImpl,
}

/// ユーザー指定クエリパラメータ
///
/// 認証ゲートウェイが解決したログインユーザー ID を内部 API パラメータとして
/// 受け取る。
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// ログインユーザー ID
    pub user_id: Uuid,
}

/// プロフィール更新リクエスト
///
/// `name` はアカウントの表示名（ID 名、システム全体で一意）、
/// `doctor_name` はプロフィールに表示するドクター名。
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    /// ログインユーザー ID（内部 API 用）
    pub user_id:     Uuid,
    /// アカウント表示名（ID 名）
    pub name:        Option<String>,
    /// ドクター表示名
    pub doctor_name: Option<String>,
    /// 専門
    pub specialty:   Option<String>,
    /// 紹介文
    pub biography:   Option<String>,
}

/// メールアドレス変更リクエスト
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmailRequest {
    /// ログインユーザー ID（内部 API 用）
    pub user_id: Uuid,
    /// 新しいメールアドレス
    pub email:   String,
}

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    /// ログインユーザー ID（内部 API 用）
    pub user_id:                   Uuid,
    /// 現在のパスワード
    pub current_password:          String,
    /// 新しいパスワード
    pub new_password:              String,
    /// 新しいパスワード（確認用）
    pub new_password_confirmation: String,
}

/// プロフィール DTO
#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub id:           String,
    pub clinic_id:    String,
    pub name:         String,
    pub specialty:    Option<String>,
    pub biography:    Option<String>,
    pub photo_path:   Option<String>,
    pub email:        String,
    pub account_name: String,
    pub created_at:   String,
    pub updated_at:   String,
}

impl From<&DoctorProfile> for ProfileDto {
    fn from(profile: &DoctorProfile) -> Self {
        Self {
            id:           profile.doctor.id().to_string(),
            clinic_id:    profile.doctor.clinic_id().to_string(),
            name:         profile.doctor.name().to_string(),
            specialty:    profile.doctor.specialty().map(String::from),
            biography:    profile.doctor.biography().map(String::from),
            photo_path:   profile.doctor.photo_path().map(String::from),
            email:        profile.email.to_string(),
            account_name: profile.account_name.as_str().to_string(),
            created_at:   profile.doctor.created_at().to_rfc3339(),
            updated_at:   profile.doctor.updated_at().to_rfc3339(),
        }
    }
}

/// 写真アップロード結果 DTO
#[derive(Debug, Serialize)]
pub struct ProfilePhotoDto {
    pub photo: String,
}

/// プロフィールを取得する
///
/// ## エンドポイント
/// GET /doctor/profile
pub async fn get_profile(
    State(state): State<Arc<ProfileState>>,
    Query(query): Query<UserQuery>,
) -> Result<Response, ServiceError> {
    let profile = state
        .usecase
        .get_profile(UserId::from_uuid(query.user_id))
        .await?;

    let response = ApiResponse::new(ProfileDto::from(&profile));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// プロフィールを更新する
///
/// ## エンドポイント
/// PUT /doctor/profile
pub async fn update_profile(
    State(state): State<Arc<ProfileState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Response, ServiceError> {
    let user_id = UserId::from_uuid(req.user_id);

    let account_name = req
        .name
        .map(UserName::new)
        .transpose()
        .map_err(|e| ServiceError::Validation {
            field:   "name",
            message: e.to_string(),
        })?;
    let doctor_name = req
        .doctor_name
        .map(DoctorName::new)
        .transpose()
        .map_err(|e| ServiceError::Validation {
            field:   "doctor_name",
            message: e.to_string(),
        })?;

    let input = UpdateProfileInput {
        doctor: DoctorChangeSet {
            name:      doctor_name,
            specialty: req.specialty,
            biography: req.biography,
        },
        account_name,
    };

    let profile = state.usecase.update_profile(input, user_id).await?;

    let response = ApiResponse::new(ProfileDto::from(&profile));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// メールアドレスを変更する
///
/// ## エンドポイント
/// PUT /doctor/profile/email
pub async fn update_email(
    State(state): State<Arc<ProfileState>>,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<Response, ServiceError> {
    let email = Email::new(req.email).map_err(|e| ServiceError::Validation {
        field:   "email",
        message: e.to_string(),
    })?;

    let profile = state
        .usecase
        .update_email(email, UserId::from_uuid(req.user_id))
        .await?;

    let response = ApiResponse::new(ProfileDto::from(&profile));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// パスワードを変更する
///
/// ## エンドポイント
/// PUT /doctor/profile/password
pub async fn update_password(
    State(state): State<Arc<ProfileState>>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Response, ServiceError> {
    if req.new_password != req.new_password_confirmation {
        return Err(ServiceError::Validation {
            field:   "new_password",
            message: "新しいパスワードが確認用と一致しません。".to_string(),
        });
    }

    let new_password =
        PlainPassword::new_validated(req.new_password).map_err(|e| ServiceError::Validation {
            field:   "new_password",
            message: e.to_string(),
        })?;

    state
        .usecase
        .update_password(
            PlainPassword::new(req.current_password),
            new_password,
            UserId::from_uuid(req.user_id),
        )
        .await?;

    let response = ApiResponse::new(serde_json::json!({ "updated": true }));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// プロフィール写真をアップロードする
///
/// リクエストボディは写真のバイナリをそのまま受け取り、
/// `Content-Type` ヘッダで形式を判定する。
///
/// ## エンドポイント
/// POST /doctor/profile/photo
pub async fn upload_profile_photo(
    State(state): State<Arc<ProfileState>>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::BadRequest("Content-Type が指定されていません".to_string()))?;

    let photo = state
        .usecase
        .upload_photo(content_type, body.to_vec(), UserId::from_uuid(query.user_id))
        .await?;

    let response = ApiResponse::new(ProfilePhotoDto { photo });

    Ok((StatusCode::OK, Json(response)).into_response())
}
