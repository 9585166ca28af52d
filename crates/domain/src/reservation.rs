//! # 予約
//!
//! クリニック・ドクター・患者を結びつける予約エンティティを管理する。
//! ステータスと支払い状態を保持し、編集・支払い・ステータス変更の
//! ライフサイクルを持つ。
//!
//! ステータス遷移で契約として保証されるのは次の 2 点のみ:
//!
//! - 予約内容の編集（[`Reservation::edited`]）は必ずステータスを
//!   「対応中」に進める。患者情報を伴う編集
//!   （[`Reservation::edited_with_patient`]）はステータスを変えない。
//! - 支払いの記録（[`Reservation::paid`]）はステータスを一切変えない。
//!
//! それ以外の遷移（[`Reservation::with_status`]）は任意のステータスへ
//! 無条件に移動できる。遷移表による制限は設けていない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    clinic::ClinicId,
    doctor::DoctorId,
    user::UserId,
    value_objects::{PatientName, PaymentAmount, Version},
};

define_uuid_id! {
    /// 予約 ID
    pub struct ReservationId;
}

/// 予約ステータス
///
/// 閉じた列挙。DB には snake_case 文字列で保存し、
/// 未知の値は [`std::str::FromStr`] で拒否する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReservationStatus {
    /// 新規受付（初期状態）
    Pending,
    /// 予約確定
    Confirmed,
    /// 対応中（予約内容の編集後）
    InProgress,
    /// 診療完了
    Completed,
    /// キャンセル
    Cancelled,
}

impl ReservationStatus {
    /// DB 保存用の文字列表現を返す
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::Validation(format!(
                "不正な予約ステータス: {}",
                s
            ))),
        }
    }
}

/// 支払い方法
///
/// 閉じた列挙。DB には snake_case 文字列で保存する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    /// 現金
    Cash,
    /// クレジットカード
    Card,
    /// 振込
    Transfer,
}

impl PaymentMethod {
    /// DB 保存用の文字列表現を返す
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            _ => Err(DomainError::Validation(format!("不正な支払い方法: {}", s))),
        }
    }
}

/// 予約内容の変更セット
///
/// `None` のフィールドは変更しない。許可されたフィールドのみを列挙し、
/// リクエストペイロードの丸ごとマージを避ける。
#[derive(Debug, Clone, Default)]
pub struct ReservationChangeSet {
    /// 診療予定日時
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 担当ドクター
    pub doctor_id:    Option<DoctorId>,
    /// 主訴
    pub complaint:    Option<String>,
    /// 院内メモ
    pub memo:         Option<String>,
}

/// 患者情報を伴う変更セット
///
/// 予約内容に加えて、予約レコードに保持する患者の連絡先スナップショットを
/// 更新する。この変更セットを適用してもステータスは変わらない。
#[derive(Debug, Clone, Default)]
pub struct PatientChangeSet {
    /// 予約内容の変更
    pub details:       ReservationChangeSet,
    /// 患者名
    pub patient_name:  Option<PatientName>,
    /// 患者電話番号
    pub patient_phone: Option<String>,
}

/// 支払い内容
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    /// 支払金額
    pub amount: PaymentAmount,
    /// 支払い方法
    pub method: PaymentMethod,
    /// 支払い済みフラグ
    pub paid:   bool,
}

/// 予約エンティティ
///
/// クリニック・ドクター・患者を結びつける診療予約。
/// ちょうど 1 つのクリニックと 1 人のドクターに属する。
///
/// ## 楽観的ロック
///
/// `version` フィールドにより、並行更新時の競合を検出する。
/// 変更メソッドはすべて version をインクリメントした新インスタンスを返し、
/// リポジトリが更新時に DB 上の version と比較する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: ReservationId,
    clinic_id: ClinicId,
    doctor_id: DoctorId,
    patient_id: UserId,
    scheduled_at: DateTime<Utc>,
    status: ReservationStatus,
    confirmed: bool,
    complaint: Option<String>,
    memo: Option<String>,
    patient_name: Option<PatientName>,
    patient_phone: Option<String>,
    payment_amount: Option<PaymentAmount>,
    payment_method: Option<PaymentMethod>,
    paid: bool,
    paid_at: Option<DateTime<Utc>>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 予約の新規作成パラメータ
pub struct NewReservation {
    pub id: ReservationId,
    pub clinic_id: ClinicId,
    pub doctor_id: DoctorId,
    pub patient_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub complaint: Option<String>,
    pub now: DateTime<Utc>,
}

/// 予約の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して
/// エンティティに変換する。
pub struct ReservationRecord {
    pub id: ReservationId,
    pub clinic_id: ClinicId,
    pub doctor_id: DoctorId,
    pub patient_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub confirmed: bool,
    pub complaint: Option<String>,
    pub memo: Option<String>,
    pub patient_name: Option<PatientName>,
    pub patient_phone: Option<String>,
    pub payment_amount: Option<PaymentAmount>,
    pub payment_method: Option<PaymentMethod>,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// 新しい予約を作成する
    ///
    /// 初期ステータスは [`ReservationStatus::Pending`]、version は 1。
    pub fn new(params: NewReservation) -> Self {
        Self {
            id: params.id,
            clinic_id: params.clinic_id,
            doctor_id: params.doctor_id,
            patient_id: params.patient_id,
            scheduled_at: params.scheduled_at,
            status: ReservationStatus::Pending,
            confirmed: false,
            complaint: params.complaint,
            memo: None,
            patient_name: None,
            patient_phone: None,
            payment_amount: None,
            payment_method: None,
            paid: false,
            paid_at: None,
            version: Version::initial(),
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 支払い不変条件違反
    ///   （`paid = true` なのに `paid_at` または `payment_amount` が欠損）
    pub fn from_db(record: ReservationRecord) -> Result<Self, DomainError> {
        if record.paid {
            if record.paid_at.is_none() {
                return Err(DomainError::Validation(
                    "支払い済みの予約には paid_at が必要です".to_string(),
                ));
            }
            if record.payment_amount.is_none() {
                return Err(DomainError::Validation(
                    "支払い済みの予約には payment_amount が必要です".to_string(),
                ));
            }
        }

        Ok(Self {
            id: record.id,
            clinic_id: record.clinic_id,
            doctor_id: record.doctor_id,
            patient_id: record.patient_id,
            scheduled_at: record.scheduled_at,
            status: record.status,
            confirmed: record.confirmed,
            complaint: record.complaint,
            memo: record.memo,
            patient_name: record.patient_name,
            patient_phone: record.patient_phone,
            payment_amount: record.payment_amount,
            payment_method: record.payment_method,
            paid: record.paid,
            paid_at: record.paid_at,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    pub fn clinic_id(&self) -> &ClinicId {
        &self.clinic_id
    }

    pub fn doctor_id(&self) -> &DoctorId {
        &self.doctor_id
    }

    pub fn patient_id(&self) -> &UserId {
        &self.patient_id
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn complaint(&self) -> Option<&str> {
        self.complaint.as_deref()
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    pub fn patient_name(&self) -> Option<&PatientName> {
        self.patient_name.as_ref()
    }

    pub fn patient_phone(&self) -> Option<&str> {
        self.patient_phone.as_deref()
    }

    pub fn payment_amount(&self) -> Option<PaymentAmount> {
        self.payment_amount
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// 予約内容を編集した新しいインスタンスを返す
    ///
    /// 変更セットの適用とステータスの「対応中」への遷移は不可分であり、
    /// 片方だけが永続化されることはない（呼び出し側が 1 トランザクションで
    /// 保存する前提）。version をインクリメントして楽観的ロックに対応。
    pub fn edited(self, change_set: ReservationChangeSet, now: DateTime<Utc>) -> Self {
        let applied = self.apply_change_set(change_set);
        Self {
            status: ReservationStatus::InProgress,
            version: applied.version.next(),
            updated_at: now,
            ..applied
        }
    }

    /// 患者情報を伴う編集をした新しいインスタンスを返す
    ///
    /// [`Self::edited`] と異なりステータスは変更しない。
    /// この非対称は意図的な契約であり、患者情報の修正だけで予約が
    /// 「対応中」へ進むことを防ぐ。
    pub fn edited_with_patient(self, change_set: PatientChangeSet, now: DateTime<Utc>) -> Self {
        let applied = self.apply_change_set(change_set.details);
        Self {
            patient_name: change_set.patient_name.or(applied.patient_name),
            patient_phone: change_set.patient_phone.or(applied.patient_phone),
            version: applied.version.next(),
            updated_at: now,
            ..applied
        }
    }

    /// 支払いを記録した新しいインスタンスを返す
    ///
    /// 支払いフィールドのみを更新し、ステータスは一切変更しない。
    /// `paid = true` の場合は `paid_at` に現在時刻を刻印する。
    pub fn paid(self, payment: PaymentDetails, now: DateTime<Utc>) -> Self {
        let paid_at = if payment.paid { Some(now) } else { None };
        Self {
            payment_amount: Some(payment.amount),
            payment_method: Some(payment.method),
            paid: payment.paid,
            paid_at,
            version: self.version.next(),
            updated_at: now,
            ..self
        }
    }

    /// ステータスを直接変更した新しいインスタンスを返す
    ///
    /// 遷移の正当性チェックは行わない。任意のステータスから任意の
    /// ステータスへ移動できる。
    pub fn with_status(self, status: ReservationStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            version: self.version.next(),
            updated_at: now,
            ..self
        }
    }

    fn apply_change_set(self, change_set: ReservationChangeSet) -> Self {
        Self {
            scheduled_at: change_set.scheduled_at.unwrap_or(self.scheduled_at),
            doctor_id: change_set.doctor_id.unwrap_or(self.doctor_id),
            complaint: change_set.complaint.or(self.complaint),
            memo: change_set.memo.or(self.memo),
            ..self
        }
    }
}
