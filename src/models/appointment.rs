use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "starts_at")]
    pub start: DateTime<Utc>,
    #[sqlx(rename = "ends_at")]
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Cancelled bookings are terminal and never hold their slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQuery {
    pub resource_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
}

/// A busy interval on a resource's calendar.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct BusyInterval {
    #[sqlx(rename = "starts_at")]
    pub start: DateTime<Utc>,
    #[sqlx(rename = "ends_at")]
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AvailableSlots {
    pub resource: Resource,
    pub bookings: Vec<BusyInterval>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_releases_slot() {
        assert!(AppointmentStatus::Pending.holds_slot());
        assert!(AppointmentStatus::Confirmed.holds_slot());
        assert!(AppointmentStatus::Completed.holds_slot());
        assert!(!AppointmentStatus::Cancelled.holds_slot());
    }

    #[test]
    fn test_appointment_serializes_start_and_end() {
        let now = Utc::now();
        let appt = Appointment {
            id: Uuid::new_v4(),
            title: "Counselling".into(),
            description: None,
            resource_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start: now,
            end: now + chrono::Duration::hours(1),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&appt).unwrap();
        assert!(json.get("start").is_some());
        assert!(json.get("end").is_some());
        assert_eq!(json["status"], "pending");
    }
}
