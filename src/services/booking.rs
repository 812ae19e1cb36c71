//! Appointment booking against shared resources.
//!
//! A resource's calendar is a set of half-open `[start, end)` windows. Two
//! windows conflict iff `a.start < b.end && b.start < a.end`, so a booking
//! that ends exactly when another begins is fine. Cancelled appointments stay
//! in storage but never hold a slot.
//!
//! Create and reschedule run their check-and-write inside one transaction that
//! first locks the target resource row (`FOR UPDATE`), which serializes
//! bookings per resource. The `appointments_no_overlap` exclusion constraint
//! backs this up at the storage layer.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db;
use crate::dto::{NewBooking, UpdateAppointmentRequest};
use crate::error::{AppError, AppResult};
use crate::models::appointment::{Appointment, AppointmentStatus, AvailableSlots, BusyInterval};
use crate::models::resource::Resource;

const CONFLICT_MESSAGE: &str = "Time slot conflict";

/// A validated `[start, end)` window with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::Validation(
                "Invalid time range: start must be before end".into(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl From<&Appointment> for TimeWindow {
    fn from(appt: &Appointment) -> Self {
        Self {
            start: appt.start,
            end: appt.end,
        }
    }
}

/// Returns the first appointment that would collide with `window` on
/// `resource_id`, skipping cancelled bookings and `exclude`.
pub fn find_conflict<'a>(
    existing: &'a [Appointment],
    resource_id: Uuid,
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> Option<&'a Appointment> {
    existing.iter().find(|appt| {
        appt.resource_id == resource_id
            && appt.status.holds_slot()
            && Some(appt.id) != exclude
            && TimeWindow::from(*appt).overlaps(window)
    })
}

/// Resource and window an appointment would occupy after applying a
/// reschedule request over its current values.
pub fn merge_reschedule(
    current: &Appointment,
    req: &UpdateAppointmentRequest,
) -> AppResult<(Uuid, TimeWindow)> {
    let resource_id = req.resource_id.unwrap_or(current.resource_id);
    let window = TimeWindow::new(
        req.start.unwrap_or(current.start),
        req.end.unwrap_or(current.end),
    )?;
    Ok((resource_id, window))
}

/// Midnight of `date` and of the following day on the server calendar, as a
/// half-open `[start, next)` range.
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(offset.local_minus_utc() as i64);
    let start = Utc.from_utc_datetime(&utc_midnight);
    (start, start + Duration::days(1))
}

/// Parses a `YYYY-MM-DD` query value.
pub fn parse_day(raw: Option<&str>) -> AppResult<NaiveDate> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Date required".into()))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

fn ensure_owner(appt: &Appointment, requester: Uuid) -> AppResult<()> {
    if appt.user_id != requester {
        return Err(AppError::Forbidden("Not the owner of this appointment".into()));
    }
    Ok(())
}

fn map_write_error(err: sqlx::Error) -> AppError {
    if db::sqlstate(&err).as_deref() == Some(db::EXCLUSION_VIOLATION) {
        AppError::Conflict(CONFLICT_MESSAGE.into())
    } else {
        AppError::Database(err)
    }
}

/// Loads a resource and holds a row lock on it until the transaction ends.
async fn lock_resource(conn: &mut PgConnection, resource_id: Uuid) -> AppResult<Resource> {
    sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1 FOR UPDATE")
        .bind(resource_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".into()))
}

/// Looks up an active appointment on `resource_id` overlapping `window`.
pub async fn find_conflicting(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> Result<Option<Appointment>, sqlx::Error> {
    let candidates = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT * FROM appointments
        WHERE resource_id = $1
          AND status <> 'cancelled'
          AND starts_at < $3
          AND ends_at > $2
        ORDER BY starts_at ASC
        "#,
    )
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(find_conflict(&candidates, resource_id, window, exclude).cloned())
}

pub async fn has_conflict(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    Ok(find_conflicting(conn, resource_id, window, exclude)
        .await?
        .is_some())
}

pub async fn create_appointment(
    db: &PgPool,
    user_id: Uuid,
    booking: NewBooking,
) -> AppResult<Appointment> {
    let window = TimeWindow::new(booking.start, booking.end)?;

    let mut tx = db.begin().await?;
    lock_resource(&mut tx, booking.resource_id).await?;

    if has_conflict(&mut tx, booking.resource_id, &window, None).await? {
        tracing::info!(
            resource_id = %booking.resource_id,
            user_id = %user_id,
            "Booking rejected: time slot conflict"
        );
        return Err(AppError::Conflict(CONFLICT_MESSAGE.into()));
    }

    let appt = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments (id, title, description, resource_id, user_id, starts_at, ends_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&booking.title)
    .bind(&booking.description)
    .bind(booking.resource_id)
    .bind(user_id)
    .bind(window.start)
    .bind(window.end)
    .bind(AppointmentStatus::Pending)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await.map_err(map_write_error)?;

    tracing::info!(
        appointment_id = %appt.id,
        resource_id = %appt.resource_id,
        user_id = %user_id,
        "Appointment booked"
    );
    Ok(appt)
}

pub async fn reschedule_appointment(
    db: &PgPool,
    appointment_id: Uuid,
    requester: Uuid,
    req: UpdateAppointmentRequest,
) -> AppResult<Appointment> {
    let mut tx = db.begin().await?;

    let current = sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments WHERE id = $1 FOR UPDATE",
    )
    .bind(appointment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;

    ensure_owner(&current, requester)?;
    let (resource_id, window) = merge_reschedule(&current, &req)?;

    lock_resource(&mut tx, resource_id).await?;

    if let Some(existing) =
        find_conflicting(&mut tx, resource_id, &window, Some(current.id)).await?
    {
        tracing::info!(
            appointment_id = %current.id,
            conflicting_id = %existing.id,
            "Reschedule rejected: time slot conflict"
        );
        return Err(AppError::Conflict(CONFLICT_MESSAGE.into()));
    }

    let appt = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE appointments SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            resource_id = $4,
            starts_at = $5,
            ends_at = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(current.id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await.map_err(map_write_error)?;

    tracing::info!(appointment_id = %appt.id, "Appointment rescheduled");
    Ok(appt)
}

/// Soft-cancels an appointment. The record is kept and its slot released.
pub async fn cancel_appointment(
    db: &PgPool,
    appointment_id: Uuid,
    requester: Uuid,
) -> AppResult<()> {
    let appt = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(appointment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;

    ensure_owner(&appt, requester)?;

    sqlx::query("UPDATE appointments SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(appt.id)
        .bind(AppointmentStatus::Cancelled)
        .execute(db)
        .await?;

    tracing::info!(appointment_id = %appt.id, "Appointment cancelled");
    Ok(())
}

pub async fn get_owned_appointment(
    db: &PgPool,
    appointment_id: Uuid,
    requester: Uuid,
) -> AppResult<Appointment> {
    let appt = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(appointment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;

    ensure_owner(&appt, requester)?;
    Ok(appt)
}

/// Busy intervals of a resource for one calendar day.
pub async fn list_available_slots(
    db: &PgPool,
    resource_id: Uuid,
    date: NaiveDate,
    offset: FixedOffset,
) -> AppResult<AvailableSlots> {
    let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
        .bind(resource_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".into()))?;

    let (day_start, next_day) = day_bounds(date, offset);

    let bookings = sqlx::query_as::<_, BusyInterval>(
        r#"
        SELECT starts_at, ends_at FROM appointments
        WHERE resource_id = $1
          AND status <> 'cancelled'
          AND starts_at >= $2
          AND starts_at < $3
        ORDER BY starts_at ASC
        "#,
    )
    .bind(resource_id)
    .bind(day_start)
    .bind(next_day)
    .fetch_all(db)
    .await?;

    Ok(AvailableSlots { resource, bookings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hh: u32, mm: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, hh, mm, 0).unwrap()
    }

    fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    fn appointment(resource_id: Uuid, w: TimeWindow, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            title: "Session".into(),
            description: None,
            resource_id,
            user_id: Uuid::new_v4(),
            start: w.start,
            end: w.end,
            status,
            created_at: at(0, 0),
            updated_at: at(0, 0),
        }
    }

    /// In-memory calendar that books through `find_conflict`.
    struct Calendar {
        appointments: Vec<Appointment>,
    }

    impl Calendar {
        fn book(&mut self, resource_id: Uuid, w: TimeWindow) -> Result<Uuid, Uuid> {
            if let Some(existing) = find_conflict(&self.appointments, resource_id, &w, None) {
                return Err(existing.id);
            }
            let appt = appointment(resource_id, w, AppointmentStatus::Pending);
            let id = appt.id;
            self.appointments.push(appt);
            Ok(id)
        }
    }

    // ── TimeWindow ───────────────────────────────────────────────────────

    #[test]
    fn test_window_rejects_inverted_and_empty() {
        assert!(matches!(
            TimeWindow::new(at(11, 0), at(10, 0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            TimeWindow::new(at(10, 0), at(10, 0)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let pairs = [
            (window((10, 0), (11, 0)), window((10, 30), (11, 30))),
            (window((10, 0), (11, 0)), window((11, 0), (12, 0))),
            (window((9, 0), (12, 0)), window((10, 0), (11, 0))),
            (window((8, 0), (9, 0)), window((13, 0), (14, 0))),
        ];
        for (a, b) in pairs {
            assert_eq!(a.overlaps(&b), b.overlaps(&a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_touching_windows_do_not_overlap() {
        assert!(!window((10, 0), (11, 0)).overlaps(&window((11, 0), (12, 0))));
    }

    #[test]
    fn test_containment_overlaps() {
        assert!(window((9, 0), (12, 0)).overlaps(&window((10, 0), (11, 0))));
    }

    // ── find_conflict ────────────────────────────────────────────────────

    #[test]
    fn test_touching_booking_is_not_a_conflict() {
        let resource = Uuid::new_v4();
        let existing = vec![appointment(
            resource,
            window((11, 0), (12, 0)),
            AppointmentStatus::Confirmed,
        )];
        assert!(find_conflict(&existing, resource, &window((10, 0), (11, 0)), None).is_none());
    }

    #[test]
    fn test_strict_overlap_conflicts() {
        let resource = Uuid::new_v4();
        let existing = vec![appointment(
            resource,
            window((10, 0), (11, 0)),
            AppointmentStatus::Pending,
        )];
        let hit = find_conflict(&existing, resource, &window((10, 30), (11, 30)), None);
        assert_eq!(hit.map(|a| a.id), Some(existing[0].id));
    }

    #[test]
    fn test_cancelled_booking_is_invisible() {
        let resource = Uuid::new_v4();
        let existing = vec![appointment(
            resource,
            window((10, 0), (11, 0)),
            AppointmentStatus::Cancelled,
        )];
        assert!(find_conflict(&existing, resource, &window((10, 0), (11, 0)), None).is_none());
    }

    #[test]
    fn test_other_resource_does_not_conflict() {
        let existing = vec![appointment(
            Uuid::new_v4(),
            window((10, 0), (11, 0)),
            AppointmentStatus::Pending,
        )];
        assert!(
            find_conflict(&existing, Uuid::new_v4(), &window((10, 0), (11, 0)), None).is_none()
        );
    }

    #[test]
    fn test_self_exclusion_on_reschedule() {
        let resource = Uuid::new_v4();
        let existing = vec![appointment(
            resource,
            window((10, 0), (11, 0)),
            AppointmentStatus::Pending,
        )];
        let own_id = existing[0].id;
        let same = window((10, 0), (11, 0));
        assert!(find_conflict(&existing, resource, &same, Some(own_id)).is_none());
        assert!(find_conflict(&existing, resource, &same, None).is_some());
    }

    // ── merge_reschedule ─────────────────────────────────────────────────

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let resource = Uuid::new_v4();
        let current = appointment(resource, window((10, 0), (11, 0)), AppointmentStatus::Pending);
        let req = UpdateAppointmentRequest {
            title: None,
            description: None,
            resource_id: None,
            start: None,
            end: Some(at(11, 30)),
        };
        let (merged_resource, merged) = merge_reschedule(&current, &req).unwrap();
        assert_eq!(merged_resource, resource);
        assert_eq!(merged, window((10, 0), (11, 30)));
    }

    #[test]
    fn test_merge_rejects_start_after_existing_end() {
        let current = appointment(
            Uuid::new_v4(),
            window((10, 0), (11, 0)),
            AppointmentStatus::Pending,
        );
        let req = UpdateAppointmentRequest {
            title: None,
            description: None,
            resource_id: None,
            start: Some(at(11, 0)),
            end: None,
        };
        assert!(matches!(
            merge_reschedule(&current, &req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_ensure_owner() {
        let appt = appointment(
            Uuid::new_v4(),
            window((10, 0), (11, 0)),
            AppointmentStatus::Pending,
        );
        assert!(ensure_owner(&appt, appt.user_id).is_ok());
        assert!(matches!(
            ensure_owner(&appt, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }

    // ── End-to-end booking flow ──────────────────────────────────────────

    #[test]
    fn test_booking_scenario_touching_boundary_succeeds() {
        let resource = Uuid::new_v4();
        let mut calendar = Calendar {
            appointments: Vec::new(),
        };

        let a = calendar.book(resource, window((9, 0), (10, 0))).unwrap();
        let b = calendar.book(resource, window((9, 30), (10, 30)));
        assert_eq!(b, Err(a), "overlapping booking must be rejected");
        assert!(calendar.book(resource, window((10, 0), (11, 0))).is_ok());
        assert_eq!(calendar.appointments.len(), 2);
    }

    #[test]
    fn test_cancelling_frees_the_slot() {
        let resource = Uuid::new_v4();
        let mut calendar = Calendar {
            appointments: Vec::new(),
        };
        calendar.book(resource, window((9, 0), (10, 0))).unwrap();
        calendar.appointments[0].status = AppointmentStatus::Cancelled;
        assert!(calendar.book(resource, window((9, 0), (10, 0))).is_ok());
    }

    // ── Day windows ──────────────────────────────────────────────────────

    #[test]
    fn test_day_bounds_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let (start, next) = day_bounds(date, FixedOffset::east_opt(0).unwrap());
        assert_eq!(start, at(0, 0));
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_day_bounds_east_of_utc() {
        // Nairobi, UTC+3: local midnight is 21:00 the previous day in UTC.
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let (start, _) = day_bounds(date, FixedOffset::east_opt(3 * 3600).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 9, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day(Some("2024-01-10")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
        assert!(matches!(parse_day(None), Err(AppError::Validation(_))));
        assert!(matches!(parse_day(Some("10/01/2024")), Err(AppError::Validation(_))));
    }
}
