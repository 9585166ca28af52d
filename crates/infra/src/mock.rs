//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! mediflow-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! `MockReservationRepository` は書き込み失敗の注入
//! （[`MockReservationRepository::set_fail_writes`]）に対応しており、
//! ストアのコミット失敗時に部分更新が残らないことを検証するテストで使用する。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mediflow_domain::{
    clinic::ClinicId,
    doctor::{Doctor, DoctorId},
    reservation::{Reservation, ReservationId, ReservationStatus},
    user::{Email, User, UserId, UserName},
    value_objects::Version,
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    media::MediaStorage,
    repository::{
        DoctorRepository,
        PageRequest,
        ReservationCountSummary,
        ReservationFilter,
        ReservationRepository,
        UserRepository,
    },
};

// ===== MockTransactionManager =====

/// モックのトランザクションマネージャ
///
/// 実際のトランザクションは開始せず、[`TxContext::mock`] を返す。
#[derive(Clone, Default)]
pub struct MockTransactionManager;

impl MockTransactionManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockReservationRepository =====

#[derive(Clone, Default)]
pub struct MockReservationRepository {
    reservations:    Arc<Mutex<Vec<Reservation>>>,
    fail_writes:     Arc<Mutex<bool>>,
    conflict_writes: Arc<Mutex<bool>>,
}

impl MockReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストデータを追加する
    pub fn add_reservation(&self, reservation: Reservation) {
        self.reservations.lock().unwrap().push(reservation);
    }

    /// 以降の書き込みを失敗させる（コミット失敗の注入）
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// 以降の書き込みを楽観的ロック競合として失敗させる（並行更新の注入）
    pub fn set_conflict_writes(&self, conflict: bool) {
        *self.conflict_writes.lock().unwrap() = conflict;
    }

    fn check_write_failure(&self) -> Result<(), InfraError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(InfraError::unexpected("注入された書き込み失敗"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for MockReservationRepository {
    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError> {
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn update_with_version_check(
        &self,
        reservation: &Reservation,
        expected_version: Version,
        _tx: &mut TxContext,
    ) -> Result<(), InfraError> {
        self.check_write_failure()?;
        if *self.conflict_writes.lock().unwrap() {
            return Err(InfraError::conflict(
                "Reservation",
                reservation.id().to_string(),
            ));
        }

        let mut reservations = self.reservations.lock().unwrap();
        if let Some(pos) = reservations.iter().position(|r| r.id() == reservation.id()) {
            if reservations[pos].version() != expected_version {
                return Err(InfraError::conflict(
                    "Reservation",
                    reservation.id().to_string(),
                ));
            }
            reservations[pos] = reservation.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &ReservationId, _tx: &mut TxContext) -> Result<(), InfraError> {
        self.check_write_failure()?;

        self.reservations.lock().unwrap().retain(|r| r.id() != id);
        Ok(())
    }

    async fn list(
        &self,
        filter: &ReservationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Reservation>, u64), InfraError> {
        let mut matched: Vec<Reservation> = self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.clinic_id() == &filter.clinic_id)
            .filter(|r| {
                filter
                    .doctor_id
                    .as_ref()
                    .is_none_or(|doctor_id| r.doctor_id() == doctor_id)
            })
            .filter(|r| filter.status.is_none_or(|status| r.status() == status))
            .filter(|r| {
                filter
                    .confirmed
                    .is_none_or(|confirmed| r.confirmed() == confirmed)
            })
            .filter(|r| {
                filter
                    .scheduled_from
                    .is_none_or(|from| r.scheduled_at() >= from)
            })
            .filter(|r| {
                filter
                    .scheduled_until
                    .is_none_or(|until| r.scheduled_at() <= until)
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.scheduled_at().cmp(&a.scheduled_at()));

        let total = matched.len() as u64;
        let page_items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok((page_items, total))
    }

    async fn count_summary(
        &self,
        clinic_id: &ClinicId,
    ) -> Result<ReservationCountSummary, InfraError> {
        let mut summary = ReservationCountSummary::default();
        for reservation in self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.clinic_id() == clinic_id)
        {
            summary.total += 1;
            match reservation.status() {
                ReservationStatus::Pending => summary.pending += 1,
                ReservationStatus::Confirmed => summary.confirmed += 1,
                ReservationStatus::InProgress => summary.in_progress += 1,
                ReservationStatus::Completed => summary.completed += 1,
                ReservationStatus::Cancelled => summary.cancelled += 1,
            }
        }
        Ok(summary)
    }
}

// ===== MockDoctorRepository =====

#[derive(Clone, Default)]
pub struct MockDoctorRepository {
    doctors: Arc<Mutex<Vec<Doctor>>>,
}

impl MockDoctorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストデータを追加する
    pub fn add_doctor(&self, doctor: Doctor) {
        self.doctors.lock().unwrap().push(doctor);
    }
}

#[async_trait]
impl DoctorRepository for MockDoctorRepository {
    async fn find_by_id(&self, id: &DoctorId) -> Result<Option<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id)
            .cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.user_id() == user_id)
            .cloned())
    }

    async fn find_by_clinic(&self, clinic_id: &ClinicId) -> Result<Vec<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.clinic_id() == clinic_id)
            .cloned()
            .collect())
    }

    async fn update(&self, doctor: &Doctor, _tx: &mut TxContext) -> Result<(), InfraError> {
        let mut doctors = self.doctors.lock().unwrap();
        if let Some(pos) = doctors.iter().position(|d| d.id() == doctor.id()) {
            doctors[pos] = doctor.clone();
        }
        Ok(())
    }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストデータを追加する
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned())
    }

    async fn update(&self, user: &User, _tx: &mut TxContext) -> Result<(), InfraError> {
        let mut users = self.users.lock().unwrap();
        if let Some(pos) = users.iter().position(|u| u.id() == user.id()) {
            users[pos] = user.clone();
        }
        Ok(())
    }

    async fn email_taken(&self, email: &Email, exclude: &UserId) -> Result<bool, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email() == email && u.id() != exclude))
    }

    async fn name_taken(&self, name: &UserName, exclude: &UserId) -> Result<bool, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.name() == name && u.id() != exclude))
    }
}

// ===== MockMediaStorage =====

/// インメモリのメディアストレージ
///
/// 保存されたキーを記録し、決定的なパスを返す。
#[derive(Clone, Default)]
pub struct MockMediaStorage {
    stored: Arc<Mutex<Vec<String>>>,
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに保存されたオブジェクトキーを返す
    pub fn stored_keys(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStorage for MockMediaStorage {
    async fn store_photo(
        &self,
        directory: &str,
        content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, InfraError> {
        let Some(extension) = crate::media::extension_for(content_type) else {
            return Err(InfraError::invalid_input(format!(
                "対応していないファイル形式です: {content_type}"
            )));
        };

        let mut stored = self.stored.lock().unwrap();
        let key = format!("{}/photo-{}.{}", directory, stored.len() + 1, extension);
        stored.push(key.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mediflow_domain::reservation::NewReservation;

    use super::*;

    fn test_reservation(clinic_id: ClinicId) -> Reservation {
        Reservation::new(NewReservation {
            id: ReservationId::new(),
            clinic_id,
            doctor_id: DoctorId::new(),
            patient_id: UserId::new(),
            scheduled_at: Utc::now(),
            complaint: None,
            now: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_書き込み失敗の注入で更新がエラーになる() {
        let repo = MockReservationRepository::new();
        let clinic_id = ClinicId::new();
        let reservation = test_reservation(clinic_id);
        repo.add_reservation(reservation.clone());
        repo.set_fail_writes(true);

        let mut tx = TxContext::mock();
        let result = repo
            .update_with_version_check(&reservation, reservation.version(), &mut tx)
            .await;

        assert!(result.is_err());
        // 失敗後も既存データは変わらない
        let stored = repo.find_by_id(reservation.id()).await.unwrap().unwrap();
        assert_eq!(stored, reservation);
    }

    #[tokio::test]
    async fn test_バージョン不一致はconflictを返す() {
        let repo = MockReservationRepository::new();
        let clinic_id = ClinicId::new();
        let reservation = test_reservation(clinic_id);
        repo.add_reservation(reservation.clone());

        let stale_version = reservation.version().next();
        let mut tx = TxContext::mock();
        let result = repo
            .update_with_version_check(&reservation, stale_version, &mut tx)
            .await;

        assert!(result.unwrap_err().as_conflict().is_some());
    }

    #[tokio::test]
    async fn test_一覧はクリニックで分離される() {
        let repo = MockReservationRepository::new();
        let clinic_a = ClinicId::new();
        let clinic_b = ClinicId::new();
        repo.add_reservation(test_reservation(clinic_a.clone()));
        repo.add_reservation(test_reservation(clinic_b.clone()));

        let (items, total) = repo
            .list(&ReservationFilter::for_clinic(clinic_a.clone()), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].clinic_id(), &clinic_a);
    }
}
