//! In-memory backend for tests and local development. All six record maps
//! live behind tokio `RwLock`s; nothing here survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, ClientRecord, LoyaltyTier, SalonSettings, ServiceSpec,
    StaffProfile, WaitlistEntry,
};

use crate::traits::{AppointmentStore, Directory, StoreError, WaitlistStore};

#[derive(Default)]
pub struct MemoryStore {
    salons: RwLock<HashMap<Uuid, SalonSettings>>,
    staff: RwLock<HashMap<Uuid, StaffProfile>>,
    services: RwLock<HashMap<Uuid, ServiceSpec>>,
    clients: RwLock<HashMap<Uuid, ClientRecord>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    waitlist: RwLock<HashMap<Uuid, WaitlistEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_salon(&self, settings: SalonSettings) {
        self.salons
            .write()
            .await
            .insert(settings.salon_id, settings);
    }

    pub async fn seed_staff(&self, profile: StaffProfile) {
        self.staff.write().await.insert(profile.id, profile);
    }

    pub async fn seed_service(&self, spec: ServiceSpec) {
        self.services.write().await.insert(spec.id, spec);
    }

    pub async fn seed_client(&self, record: ClientRecord) {
        self.clients.write().await.insert(record.id, record);
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn salon_settings(&self, salon_id: Uuid) -> Result<SalonSettings, StoreError> {
        self.salons
            .read()
            .await
            .get(&salon_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("salon {}", salon_id)))
    }

    async fn staff_profile(&self, staff_id: Uuid) -> Result<StaffProfile, StoreError> {
        self.staff
            .read()
            .await
            .get(&staff_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("staff {}", staff_id)))
    }

    async fn bookable_staff(&self, salon_id: Uuid) -> Result<Vec<StaffProfile>, StoreError> {
        let mut members: Vec<StaffProfile> = self
            .staff
            .read()
            .await
            .values()
            .filter(|s| s.salon_id == salon_id && s.is_bookable())
            .cloned()
            .collect();
        members.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(members)
    }

    async fn service_spec(&self, service_id: Uuid) -> Result<ServiceSpec, StoreError> {
        self.services
            .read()
            .await
            .get(&service_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("service {}", service_id)))
    }

    async fn client_record(&self, client_id: Uuid) -> Result<ClientRecord, StoreError> {
        self.clients
            .read()
            .await
            .get(&client_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("client {}", client_id)))
    }

    async fn apply_completed_visit(
        &self,
        client_id: Uuid,
        amount: f64,
        visited_at: DateTime<Utc>,
    ) -> Result<ClientRecord, StoreError> {
        let mut clients = self.clients.write().await;
        let record = clients
            .get_mut(&client_id)
            .ok_or_else(|| StoreError::NotFound(format!("client {}", client_id)))?;

        record.visit_count += 1;
        record.total_spent += amount;
        record.loyalty_tier = LoyaltyTier::from_total_spent(record.total_spent);
        record.last_visit = Some(visited_at);

        Ok(record.clone())
    }

    async fn record_cancellation(&self, client_id: Uuid) -> Result<(), StoreError> {
        let mut clients = self.clients.write().await;
        let record = clients
            .get_mut(&client_id)
            .ok_or_else(|| StoreError::NotFound(format!("client {}", client_id)))?;
        record.cancellation_count += 1;
        Ok(())
    }

    async fn record_no_show(&self, client_id: Uuid) -> Result<(), StoreError> {
        let mut clients = self.clients.write().await;
        let record = clients
            .get_mut(&client_id)
            .ok_or_else(|| StoreError::NotFound(format!("client {}", client_id)))?;
        record.no_show_count += 1;
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn fetch(&self, id: Uuid) -> Result<Appointment, StoreError> {
        self.appointments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", id)))
    }

    async fn update(
        &self,
        mut appointment: Appointment,
        expected_version: i64,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;
        let stored = appointments
            .get(&appointment.id)
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment.id)))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict(appointment.id));
        }

        appointment.version = expected_version + 1;
        appointment.updated_at = Utc::now();
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list_for_staff_day(
        &self,
        staff_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut result: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.staff_id == staff_id && a.start_time.date_naive() == day)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        Ok(result)
    }

    async fn list_in_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut result: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.staff_id == staff_id && a.start_time < end && a.end_time > start)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        Ok(result)
    }

    async fn list_needing_reminder(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut result: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| {
                matches!(
                    a.status,
                    AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
                ) && !a.reminder_sent
                    && a.start_time >= now
                    && a.start_time < until
            })
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        Ok(result)
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn insert(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, StoreError> {
        let mut waitlist = self.waitlist.write().await;
        waitlist.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn fetch(&self, id: Uuid) -> Result<WaitlistEntry, StoreError> {
        self.waitlist
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("waitlist entry {}", id)))
    }

    async fn update(&self, mut entry: WaitlistEntry) -> Result<WaitlistEntry, StoreError> {
        let mut waitlist = self.waitlist.write().await;
        if !waitlist.contains_key(&entry.id) {
            return Err(StoreError::NotFound(format!("waitlist entry {}", entry.id)));
        }
        entry.updated_at = Utc::now();
        waitlist.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_for_date(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let mut result: Vec<WaitlistEntry> = self
            .waitlist
            .read()
            .await
            .values()
            .filter(|e| e.salon_id == salon_id && e.is_active() && e.preferred_date == date)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }

    async fn list_flexible_between(
        &self,
        salon_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let mut result: Vec<WaitlistEntry> = self
            .waitlist
            .read()
            .await
            .values()
            .filter(|e| {
                e.salon_id == salon_id
                    && e.is_active()
                    && e.flexible_dates
                    && e.preferred_date >= from
                    && e.preferred_date <= to
            })
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }

    async fn list_active_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let result: Vec<WaitlistEntry> = self
            .waitlist
            .read()
            .await
            .values()
            .filter(|e| e.is_active() && e.expires_at.map_or(false, |exp| exp <= now))
            .cloned()
            .collect();
        Ok(result)
    }
}
