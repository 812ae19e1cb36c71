use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::dto::UpdateRoleRequest;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::appointment::Appointment;
use crate::models::user::{User, UserProfile};
use crate::AppState;

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserProfile>>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<UserProfile>> {
    let role = body.parsed()?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(role)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User role changed");
    Ok(Json(user.into()))
}

pub async fn list_all_appointments(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments =
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments ORDER BY starts_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(appointments))
}
