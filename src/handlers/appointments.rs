use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateAppointmentRequest, SuccessResponse, UpdateAppointmentRequest};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::appointment::{Appointment, AppointmentQuery, AvailableSlots, SlotQuery};
use crate::services::booking;
use crate::AppState;

pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<AppointmentQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT * FROM appointments
        WHERE user_id = $1 AND ($2::uuid IS NULL OR resource_id = $2)
        ORDER BY starts_at ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.resource_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(appointments))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(appointment_id): AppPath<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appt = booking::get_owned_appointment(&state.db, appointment_id, auth_user.id).await?;
    Ok(Json(appt))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let new_booking = body.into_booking()?;
    let appt = booking::create_appointment(&state.db, auth_user.id, new_booking).await?;
    Ok((StatusCode::CREATED, Json(appt)))
}

pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(appointment_id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateAppointmentRequest>,
) -> AppResult<Json<Appointment>> {
    body.validate()?;
    let appt =
        booking::reschedule_appointment(&state.db, appointment_id, auth_user.id, body).await?;
    Ok(Json(appt))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(appointment_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    booking::cancel_appointment(&state.db, appointment_id, auth_user.id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Public: busy intervals of a resource on `?date=YYYY-MM-DD`.
pub async fn available_slots(
    State(state): State<AppState>,
    AppPath(resource_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<SlotQuery>,
) -> AppResult<Json<AvailableSlots>> {
    let date = booking::parse_day(query.date.as_deref())?;
    let slots = booking::list_available_slots(
        &state.db,
        resource_id,
        date,
        state.config.calendar_offset(),
    )
    .await?;
    Ok(Json(slots))
}
