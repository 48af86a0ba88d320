//! Read-only snapshots of records owned by other parts of the platform.
//! The scheduling core looks these up by id through the `Directory` seam and
//! never mutates them directly.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalonSettings {
    pub salon_id: Uuid,
    pub booking_lead_time_hours: i64,
    pub booking_window_days: i64,
    pub cancellation_policy_hours: i64,
    pub slot_granularity_minutes: i64,
    pub reminder_hours_before: i64,
    pub waitlist_flex_window_days: i64,
}

impl SalonSettings {
    pub fn defaults_for(salon_id: Uuid) -> Self {
        Self {
            salon_id,
            booking_lead_time_hours: 2,
            booking_window_days: 60,
            cancellation_policy_hours: 24,
            slot_granularity_minutes: 15,
            reminder_hours_before: 24,
            waitlist_flex_window_days: 3,
        }
    }
}

/// Working hours for one weekday. `working == false` means the day is off
/// regardless of the times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub working: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub display_name: String,
    /// Weekly default schedule keyed by weekday name ("monday".."sunday").
    pub default_schedule: HashMap<String, DaySchedule>,
    pub booking_buffer_minutes: i64,
    pub service_ids: Vec<Uuid>,
    pub is_active: bool,
    pub show_on_booking: bool,
}

impl StaffProfile {
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.show_on_booking
    }

    pub fn schedule_for(&self, weekday: Weekday) -> Option<&DaySchedule> {
        let key = match weekday {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        };
        self.default_schedule.get(key).filter(|d| d.working)
    }

    pub fn offers_service(&self, service_id: Uuid) -> bool {
        self.service_ids.is_empty() || self.service_ids.contains(&service_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    pub price: f64,
    pub duration_minutes: i32,
    pub buffer_before_minutes: i32,
    pub buffer_after_minutes: i32,
    pub processing_time_minutes: i32,
    pub is_active: bool,
    pub is_online_bookable: bool,
}

impl ServiceSpec {
    /// Total slot time the service occupies, buffers and processing included.
    pub fn total_duration_minutes(&self) -> i32 {
        self.duration_minutes
            + self.buffer_before_minutes
            + self.buffer_after_minutes
            + self.processing_time_minutes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub display_name: String,
    pub visit_count: i32,
    pub total_spent: f64,
    pub cancellation_count: i32,
    pub no_show_count: i32,
    pub loyalty_tier: LoyaltyTier,
    pub last_visit: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Tier is a pure function of cumulative spend, recomputed on every
    /// completed visit.
    pub fn from_total_spent(total_spent: f64) -> Self {
        if total_spent >= 5000.0 {
            LoyaltyTier::Platinum
        } else if total_spent >= 2500.0 {
            LoyaltyTier::Gold
        } else if total_spent >= 1000.0 {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoyaltyTier::Bronze => write!(f, "bronze"),
            LoyaltyTier::Silver => write!(f, "silver"),
            LoyaltyTier::Gold => write!(f, "gold"),
            LoyaltyTier::Platinum => write!(f, "platinum"),
        }
    }
}
