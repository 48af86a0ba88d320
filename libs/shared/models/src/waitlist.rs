use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub preferred_date: NaiveDate,
    pub preferred_time_start: Option<NaiveTime>,
    pub preferred_time_end: Option<NaiveTime>,
    pub flexible_dates: bool,
    pub flexible_staff: bool,
    pub priority: WaitlistPriority,
    pub status: WaitlistStatus,
    pub notification_count: i32,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub booked_appointment_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            WaitlistStatus::Pending | WaitlistStatus::Notified
        )
    }

    pub fn has_contact_method(&self) -> bool {
        self.client_phone.as_deref().map_or(false, |p| !p.is_empty())
            || self.client_email.as_deref().map_or(false, |e| !e.is_empty())
    }
}

/// Higher priority entries are offered freed slots first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistPriority {
    Low,
    Normal,
    High,
    Vip,
}

impl Default for WaitlistPriority {
    fn default() -> Self {
        WaitlistPriority::Normal
    }
}

impl fmt::Display for WaitlistPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitlistPriority::Low => write!(f, "low"),
            WaitlistPriority::Normal => write!(f, "normal"),
            WaitlistPriority::High => write!(f, "high"),
            WaitlistPriority::Vip => write!(f, "vip"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Pending,
    Notified,
    Booked,
    Expired,
    Cancelled,
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitlistStatus::Pending => write!(f, "pending"),
            WaitlistStatus::Notified => write!(f, "notified"),
            WaitlistStatus::Booked => write!(f, "booked"),
            WaitlistStatus::Expired => write!(f, "expired"),
            WaitlistStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
