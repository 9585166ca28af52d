//! # 予約 API ハンドラ
//!
//! 予約の参照系エンドポイントと、リクエスト/レスポンス DTO を定義する。
//! 変更系エンドポイントは `reservation/command.rs` に分離している。

mod command;

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use mediflow_domain::{
    clinic::ClinicId,
    doctor::{Doctor, DoctorId},
    reservation::{Reservation, ReservationId, ReservationStatus},
};
use mediflow_infra::repository::{PageRequest, ReservationCountSummary, ReservationFilter};
use mediflow_shared::{ApiResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use command::{
    delete_reservation,
    record_payment,
    update_reservation,
    update_reservation_with_patient,
    update_status,
    upload_reservation_photo,
};

use crate::{error::ServiceError, usecase::ReservationUseCaseImpl};

/// 予約ハンドラの共有状態
pub struct ReservationState {
    pub usecase: ReservationUseCaseImpl,
}

/// クリニック指定クエリパラメータ
///
/// 認証ゲートウェイが解決したクリニック ID を内部 API パラメータとして
/// 受け取る。
#[derive(Debug, Deserialize)]
pub struct ClinicQuery {
    /// クリニック ID
    pub clinic_id: Uuid,
}

/// 予約一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListReservationsQuery {
    /// クリニック ID
    pub clinic_id:       Uuid,
    /// 担当ドクターで絞り込む
    pub doctor_id:       Option<Uuid>,
    /// ステータスで絞り込む（snake_case 文字列）
    pub status:          Option<String>,
    /// 予約確定フラグで絞り込む
    pub confirmed:       Option<bool>,
    /// 診療予定日時の下限（RFC 3339）
    pub scheduled_from:  Option<DateTime<Utc>>,
    /// 診療予定日時の上限（RFC 3339）
    pub scheduled_until: Option<DateTime<Utc>>,
    /// ページ番号（1 始まり）
    pub page:            Option<u32>,
    /// 1 ページあたりの件数（最大 100）
    pub per_page:        Option<u32>,
}

impl ListReservationsQuery {
    fn into_filter_and_page(self) -> Result<(ReservationFilter, PageRequest), ServiceError> {
        let status = self
            .status
            .map(|s| s.parse::<ReservationStatus>())
            .transpose()
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;

        let filter = ReservationFilter {
            clinic_id:       ClinicId::from_uuid(self.clinic_id),
            doctor_id:       self.doctor_id.map(DoctorId::from_uuid),
            status,
            confirmed:       self.confirmed,
            scheduled_from:  self.scheduled_from,
            scheduled_until: self.scheduled_until,
        };
        let page = PageRequest::new(self.page, self.per_page);

        Ok((filter, page))
    }
}

/// 予約 DTO
#[derive(Debug, Serialize)]
pub struct ReservationDto {
    pub id:             String,
    pub clinic_id:      String,
    pub doctor_id:      String,
    pub patient_id:     String,
    pub scheduled_at:   String,
    pub status:         String,
    pub confirmed:      bool,
    pub complaint:      Option<String>,
    pub memo:           Option<String>,
    pub patient_name:   Option<String>,
    pub patient_phone:  Option<String>,
    pub payment_amount: Option<i64>,
    pub payment_method: Option<String>,
    pub paid:           bool,
    pub paid_at:        Option<String>,
    pub version:        i32,
    pub created_at:     String,
    pub updated_at:     String,
}

impl From<&Reservation> for ReservationDto {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id:             reservation.id().to_string(),
            clinic_id:      reservation.clinic_id().to_string(),
            doctor_id:      reservation.doctor_id().to_string(),
            patient_id:     reservation.patient_id().to_string(),
            scheduled_at:   reservation.scheduled_at().to_rfc3339(),
            status:         reservation.status().to_string(),
            confirmed:      reservation.confirmed(),
            complaint:      reservation.complaint().map(String::from),
            memo:           reservation.memo().map(String::from),
            patient_name:   reservation.patient_name().map(|n| n.as_str().to_string()),
            patient_phone:  reservation.patient_phone().map(String::from),
            payment_amount: reservation.payment_amount().map(|a| a.as_i64()),
            payment_method: reservation.payment_method().map(|m| m.to_string()),
            paid:           reservation.paid(),
            paid_at:        reservation.paid_at().map(|t| t.to_rfc3339()),
            version:        reservation.version().as_i32(),
            created_at:     reservation.created_at().to_rfc3339(),
            updated_at:     reservation.updated_at().to_rfc3339(),
        }
    }
}

/// 件数サマリ DTO
#[derive(Debug, Serialize)]
pub struct CountSummaryDto {
    pub total:       i64,
    pub pending:     i64,
    pub confirmed:   i64,
    pub in_progress: i64,
    pub completed:   i64,
    pub cancelled:   i64,
}

impl From<ReservationCountSummary> for CountSummaryDto {
    fn from(summary: ReservationCountSummary) -> Self {
        Self {
            total:       summary.total,
            pending:     summary.pending,
            confirmed:   summary.confirmed,
            in_progress: summary.in_progress,
            completed:   summary.completed,
            cancelled:   summary.cancelled,
        }
    }
}

/// ドクター DTO
#[derive(Debug, Serialize)]
pub struct DoctorDto {
    pub id:         String,
    pub name:       String,
    pub specialty:  Option<String>,
    pub biography:  Option<String>,
    pub photo_path: Option<String>,
}

impl From<&Doctor> for DoctorDto {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id:         doctor.id().to_string(),
            name:       doctor.name().to_string(),
            specialty:  doctor.specialty().map(String::from),
            biography:  doctor.biography().map(String::from),
            photo_path: doctor.photo_path().map(String::from),
        }
    }
}

/// 予約一覧を取得する
///
/// ## エンドポイント
/// GET /clinic/reservations
pub async fn list_reservations(
    State(state): State<Arc<ReservationState>>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Response, ServiceError> {
    let (filter, page) = query.into_filter_and_page()?;

    let (reservations, total) = state.usecase.list_reservations(filter, page).await?;

    let dtos: Vec<ReservationDto> = reservations.iter().map(ReservationDto::from).collect();
    let response = PaginatedResponse::new(dtos, page.page(), page.per_page(), total);

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 支払い一覧用に確定済みの予約のみを取得する
///
/// ## エンドポイント
/// GET /clinic/reservations/payments
pub async fn list_payment_reservations(
    State(state): State<Arc<ReservationState>>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Response, ServiceError> {
    let (mut filter, page) = query.into_filter_and_page()?;
    // 確定済みの予約に限定する
    filter.confirmed = Some(true);

    let (reservations, total) = state.usecase.list_reservations(filter, page).await?;

    let dtos: Vec<ReservationDto> = reservations.iter().map(ReservationDto::from).collect();
    let response = PaginatedResponse::new(dtos, page.page(), page.per_page(), total);

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 予約件数サマリを取得する
///
/// ## エンドポイント
/// GET /clinic/reservations/count
pub async fn count_reservations(
    State(state): State<Arc<ReservationState>>,
    Query(query): Query<ClinicQuery>,
) -> Result<Response, ServiceError> {
    let summary = state
        .usecase
        .count_summary(ClinicId::from_uuid(query.clinic_id))
        .await?;

    let response = ApiResponse::new(CountSummaryDto::from(summary));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 予約を 1 件取得する
///
/// ## エンドポイント
/// GET /clinic/reservations/{id}
pub async fn get_reservation(
    State(state): State<Arc<ReservationState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ClinicQuery>,
) -> Result<Response, ServiceError> {
    let reservation = state
        .usecase
        .get_reservation(
            ReservationId::from_uuid(id),
            ClinicId::from_uuid(query.clinic_id),
        )
        .await?;

    let response = ApiResponse::new(ReservationDto::from(&reservation));

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// クリニック所属のドクター一覧を取得する
///
/// ## エンドポイント
/// GET /clinic/doctors
pub async fn list_doctors(
    State(state): State<Arc<ReservationState>>,
    Query(query): Query<ClinicQuery>,
) -> Result<Response, ServiceError> {
    let doctors = state
        .usecase
        .list_doctors(ClinicId::from_uuid(query.clinic_id))
        .await?;

    let dtos: Vec<DoctorDto> = doctors.iter().map(DoctorDto::from).collect();
    let response = ApiResponse::new(dtos);

    Ok((StatusCode::OK, Json(response)).into_response())
}
