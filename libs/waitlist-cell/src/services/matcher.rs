// libs/waitlist-cell/src/services/matcher.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{WaitlistEntry, WaitlistStatus};
use shared_store::{Directory, Notifier, WaitlistStore};

use crate::models::{CreateWaitlistRequest, WaitlistError};

/// Days an entry stays active past its preferred date when the caller gives
/// no explicit expiry.
const DEFAULT_EXPIRY_DAYS: i64 = 7;

pub struct WaitlistMatcher {
    waitlist: Arc<dyn WaitlistStore>,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
}

impl WaitlistMatcher {
    pub fn new(
        waitlist: Arc<dyn WaitlistStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            waitlist,
            directory,
            notifier,
        }
    }

    pub async fn create_entry(
        &self,
        request: CreateWaitlistRequest,
        now: DateTime<Utc>,
    ) -> Result<WaitlistEntry, WaitlistError> {
        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            salon_id: request.salon_id,
            client_id: request.client_id,
            client_name: request.client_name,
            client_phone: request.client_phone,
            client_email: request.client_email,
            service_id: request.service_id,
            staff_id: request.staff_id,
            preferred_date: request.preferred_date,
            preferred_time_start: request.preferred_time_start,
            preferred_time_end: request.preferred_time_end,
            flexible_dates: request.flexible_dates,
            flexible_staff: request.flexible_staff,
            priority: request.priority,
            status: WaitlistStatus::Pending,
            notification_count: 0,
            last_notified_at: None,
            expires_at: Some(
                (request.preferred_date + Duration::days(DEFAULT_EXPIRY_DAYS))
                    .and_time(chrono::NaiveTime::MIN)
                    .and_utc(),
            ),
            booked_appointment_id: None,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        if !entry.has_contact_method() {
            return Err(WaitlistError::Validation(
                "a phone number or email is required".to_string(),
            ));
        }
        if entry.preferred_date < now.date_naive() {
            return Err(WaitlistError::Validation(
                "preferred date must not be in the past".to_string(),
            ));
        }

        // One active entry per contact and date.
        let same_day = self
            .waitlist
            .list_for_date(entry.salon_id, entry.preferred_date)
            .await?;
        let duplicate = same_day.iter().any(|existing| {
            let phone_match = match (&existing.client_phone, &entry.client_phone) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            let email_match = match (&existing.client_email, &entry.client_email) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            phone_match || email_match
        });
        if duplicate {
            return Err(WaitlistError::Validation(
                "an active entry already exists for this contact and date".to_string(),
            ));
        }

        let created = self.waitlist.insert(entry).await?;
        info!(entry_id = %created.id, preferred_date = %created.preferred_date, "Waitlist entry created");
        Ok(created)
    }

    /// Active entries for an exact date, oldest first.
    pub async fn entries_for_date(
        &self,
        salon_id: Uuid,
        date: chrono::NaiveDate,
    ) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        Ok(self.waitlist.list_for_date(salon_id, date).await?)
    }

    /// Candidates for a freed slot, best match first: exact-date entries by
    /// priority (VIP highest) then age, followed by flexible-date entries
    /// whose preferred date falls within the salon's flex window of the slot.
    /// `service_ids` are the services the freed slot was booked for; entries
    /// waiting on a specific service are matched against them (an empty list
    /// means any service fits).
    pub async fn candidates_for_slot(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        slot_start: DateTime<Utc>,
        service_ids: &[Uuid],
    ) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let settings = self.directory.salon_settings(salon_id).await?;
        let date = slot_start.date_naive();

        let mut exact: Vec<WaitlistEntry> = self
            .waitlist
            .list_for_date(salon_id, date)
            .await?
            .into_iter()
            .filter(|e| Self::entry_accepts(e, staff_id, slot_start, service_ids))
            .collect();
        exact.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });

        let window = Duration::days(settings.waitlist_flex_window_days);
        let from = date - window;
        let to = date + window;
        let mut flexible: Vec<WaitlistEntry> = self
            .waitlist
            .list_flexible_between(salon_id, from, to)
            .await?
            .into_iter()
            .filter(|e| {
                e.preferred_date != date && Self::entry_accepts(e, staff_id, slot_start, service_ids)
            })
            .collect();
        flexible.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });

        exact.extend(flexible);
        Ok(exact)
    }

    /// Offers a freed slot to the best matching entry, if any. Runs after a
    /// cancellation or no-show commits; failures here never surface to the
    /// caller that freed the slot.
    pub async fn handle_freed_slot(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        slot_start: DateTime<Utc>,
        service_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Option<WaitlistEntry>, WaitlistError> {
        let candidates = self
            .candidates_for_slot(salon_id, staff_id, slot_start, service_ids)
            .await?;

        let best = match candidates.into_iter().next() {
            Some(entry) => entry,
            None => {
                debug!(%salon_id, %slot_start, "No waitlist candidates for freed slot");
                return Ok(None);
            }
        };

        let notified = self.mark_notified(best.id, now).await?;

        if let Err(e) = self.notifier.notify_waitlist_entry(&notified, slot_start).await {
            warn!(entry_id = %notified.id, "Waitlist notification delivery failed: {}", e);
        }

        Ok(Some(notified))
    }

    pub async fn mark_notified(
        &self,
        entry_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WaitlistEntry, WaitlistError> {
        let mut entry = self.waitlist.fetch(entry_id).await?;
        if !entry.is_active() {
            return Err(WaitlistError::Inactive(format!(
                "entry {} is {}",
                entry.id, entry.status
            )));
        }

        entry.status = WaitlistStatus::Notified;
        entry.notification_count += 1;
        entry.last_notified_at = Some(now);

        let updated = self.waitlist.update(entry).await?;
        info!(entry_id = %updated.id, notification_count = updated.notification_count, "Waitlist entry notified");
        Ok(updated)
    }

    /// Links an entry to the appointment the client went on to book.
    pub async fn mark_booked(
        &self,
        entry_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<WaitlistEntry, WaitlistError> {
        let mut entry = self.waitlist.fetch(entry_id).await?;
        if !entry.is_active() {
            return Err(WaitlistError::Inactive(format!(
                "entry {} is {}",
                entry.id, entry.status
            )));
        }

        entry.status = WaitlistStatus::Booked;
        entry.booked_appointment_id = Some(appointment_id);

        let updated = self.waitlist.update(entry).await?;
        info!(entry_id = %updated.id, %appointment_id, "Waitlist entry booked");
        Ok(updated)
    }

    pub async fn cancel_entry(&self, entry_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        let mut entry = self.waitlist.fetch(entry_id).await?;
        if !entry.is_active() {
            return Err(WaitlistError::Inactive(format!(
                "entry {} is {}",
                entry.id, entry.status
            )));
        }

        entry.status = WaitlistStatus::Cancelled;
        let updated = self.waitlist.update(entry).await?;
        info!(entry_id = %updated.id, "Waitlist entry cancelled");
        Ok(updated)
    }

    /// Flips active entries past their expiry to `Expired`. Returns how many
    /// were flipped.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, WaitlistError> {
        let stale = self.waitlist.list_active_expired(now).await?;
        let mut expired = 0usize;

        for mut entry in stale {
            entry.status = WaitlistStatus::Expired;
            match self.waitlist.update(entry).await {
                Ok(_) => expired += 1,
                Err(e) => warn!("Failed to expire waitlist entry: {}", e),
            }
        }

        if expired > 0 {
            info!(expired, "Expired stale waitlist entries");
        }
        Ok(expired)
    }

    fn entry_accepts(
        entry: &WaitlistEntry,
        staff_id: Uuid,
        slot_start: DateTime<Utc>,
        service_ids: &[Uuid],
    ) -> bool {
        let staff_ok =
            entry.flexible_staff || entry.staff_id.is_none() || entry.staff_id == Some(staff_id);

        let service_ok = match entry.service_id {
            Some(wanted) => service_ids.is_empty() || service_ids.contains(&wanted),
            None => true,
        };

        let slot_time = slot_start.time();
        let time_ok = match (entry.preferred_time_start, entry.preferred_time_end) {
            (Some(from), Some(to)) => slot_time >= from && slot_time < to,
            (Some(from), None) => slot_time >= from,
            (None, Some(to)) => slot_time < to,
            (None, None) => true,
        };

        staff_ok && service_ok && time_ok
    }
}
