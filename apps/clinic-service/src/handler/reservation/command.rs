//! 予約ハンドラの状態変更操作

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use mediflow_domain::{
    clinic::ClinicId,
    doctor::DoctorId,
    reservation::{
        PatientChangeSet,
        PaymentMethod,
        PaymentDetails,
        ReservationChangeSet,
        ReservationId,
        ReservationStatus,
    },
    value_objects::{PatientName, PaymentAmount},
};
use mediflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClinicQuery, ReservationDto, ReservationState};
use crate::error::ServiceError;

/// 予約更新リクエスト
///
/// 許可されたフィールドのみを列挙し、未知のフィールドは拒否する。
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReservationRequest {
    /// クリニック ID（内部 API 用）
    pub clinic_id:    Uuid,
    /// 診療予定日時
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 担当ドクター
    pub doctor_id:    Option<Uuid>,
    /// 主訴
    pub complaint:    Option<String>,
    /// 院内メモ
    pub memo:         Option<String>,
}

impl UpdateReservationRequest {
    fn into_change_set(self) -> (ClinicId, ReservationChangeSet) {
        let clinic_id = ClinicId::from_uuid(self.clinic_id);
        let change_set = ReservationChangeSet {
            scheduled_at: self.scheduled_at,
            doctor_id:    self.doctor_id.map(DoctorId::from_uuid),
            complaint:    self.complaint,
            memo:         self.memo,
        };
        (clinic_id, change_set)
    }
}

/// 患者情報を伴う予約更新リクエスト
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReservationWithPatientRequest {
    /// クリニック ID（内部 API 用）
    pub clinic_id:     Uuid,
    /// 診療予定日時
    pub scheduled_at:  Option<DateTime<Utc>>,
    /// 担当ドクター
    pub doctor_id:     Option<Uuid>,
    /// 主訴
    pub complaint:     Option<String>,
    /// 院内メモ
    pub memo:          Option<String>,
    /// 患者名
    pub patient_name:  Option<String>,
    /// 患者電話番号
    pub patient_phone: Option<String>,
}

/// 支払い記録リクエスト
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPaymentRequest {
    /// クリニック ID（内部 API 用）
    pub clinic_id: Uuid,
    /// 支払金額（円）
    pub amount:    i64,
    /// 支払い方法
    pub method:    PaymentMethod,
    /// 支払い済みフラグ
    pub paid:      bool,
}

/// ステータス変更リクエスト
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    /// クリニック ID（内部 API 用）
    pub clinic_id: Uuid,
    /// 変更後のステータス
    pub status:    ReservationStatus,
}

/// 削除結果 DTO
#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub id: String,
}

/// 写真アップロード結果 DTO
#[derive(Debug, Serialize)]
pub struct PhotoDto {
    pub photo: String,
}

/// 予約内容を更新する
///
/// 更新に成功するとステータスは「対応中」になる。
///
/// ## エンドポイント
/// PUT /clinic/reservations/{id}
pub async fn update_reservation(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReservationRequest>,
) -> Result<Response, ServiceError> {
    let (clinic_id, change_set) = req.into_change_set();

    let reservation = state
        .usecase
        .update_reservation(change_set, ReservationId::from_uuid(id), clinic_id)
        .await?;

    let response = ApiResponse::new(ReservationDto::from(&reservation));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 患者情報を伴う予約更新
///
/// ステータスは変更しない。
///
/// ## エンドポイント
/// PUT /clinic/reservations/{id}/patient
pub async fn update_reservation_with_patient(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReservationWithPatientRequest>,
) -> Result<Response, ServiceError> {
    let clinic_id = ClinicId::from_uuid(req.clinic_id);
    let patient_name = req
        .patient_name
        .map(PatientName::new)
        .transpose()
        .map_err(|e| ServiceError::BadRequest(e.to_string()))?;

    let change_set = PatientChangeSet {
        details: ReservationChangeSet {
            scheduled_at: req.scheduled_at,
            doctor_id:    req.doctor_id.map(DoctorId::from_uuid),
            complaint:    req.complaint,
            memo:         req.memo,
        },
        patient_name,
        patient_phone: req.patient_phone,
    };

    let reservation = state
        .usecase
        .update_reservation_with_patient(change_set, ReservationId::from_uuid(id), clinic_id)
        .await?;

    let response = ApiResponse::new(ReservationDto::from(&reservation));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 支払いを記録する
///
/// ## エンドポイント
/// POST /clinic/reservations/{id}/payment
pub async fn record_payment(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Response, ServiceError> {
    let amount =
        PaymentAmount::new(req.amount).map_err(|e| ServiceError::BadRequest(e.to_string()))?;

    let payment = PaymentDetails {
        amount,
        method: req.method,
        paid: req.paid,
    };

    let reservation = state
        .usecase
        .record_payment(
            payment,
            ReservationId::from_uuid(id),
            ClinicId::from_uuid(req.clinic_id),
        )
        .await?;

    let response = ApiResponse::new(ReservationDto::from(&reservation));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// ステータスを直接変更する
///
/// ## エンドポイント
/// PUT /clinic/reservations/{id}/status
pub async fn update_status(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Response, ServiceError> {
    let reservation = state
        .usecase
        .update_status(
            req.status,
            ReservationId::from_uuid(id),
            ClinicId::from_uuid(req.clinic_id),
        )
        .await?;

    let response = ApiResponse::new(ReservationDto::from(&reservation));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 予約を削除する
///
/// ## エンドポイント
/// DELETE /clinic/reservations/{id}
pub async fn delete_reservation(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ClinicQuery>,
) -> Result<Response, ServiceError> {
    state
        .usecase
        .delete_reservation(
            ReservationId::from_uuid(id),
            ClinicId::from_uuid(query.clinic_id),
        )
        .await?;

    let response = ApiResponse::new(DeletedDto { id: id.to_string() });

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 予約写真をアップロードする
///
/// リクエストボディは写真のバイナリをそのまま受け取り、
/// `Content-Type` ヘッダで形式を判定する。
///
/// ## エンドポイント
/// POST /clinic/reservations/photos
pub async fn upload_reservation_photo(
    State(state): State<Arc<ReservationState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::BadRequest("Content-Type が指定されていません".to_string()))?;

    let photo = state
        .usecase
        .upload_photo(content_type, body.to_vec())
        .await?;

    let response = ApiResponse::new(PhotoDto { photo });

    Ok((StatusCode::OK, Json(response)).into_response())
}
