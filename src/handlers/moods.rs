use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateMoodRequest, SuccessResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::mood::{MoodEntry, MoodStats};
use crate::services::mood_stats;
use crate::AppState;

async fn fetch_owned(state: &AppState, entry_id: Uuid, requester: Uuid) -> AppResult<MoodEntry> {
    let entry = sqlx::query_as::<_, MoodEntry>("SELECT * FROM mood_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Mood entry not found".into()))?;

    if entry.user_id != requester {
        return Err(AppError::Forbidden("Not the owner of this mood entry".into()));
    }
    Ok(entry)
}

pub async fn create_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    let mood = body.checked_mood()?;

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (id, user_id, mood, score, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(mood.as_str())
    .bind(body.score)
    .bind(&body.note)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn get_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(entry_id): AppPath<Uuid>,
) -> AppResult<Json<MoodEntry>> {
    Ok(Json(fetch_owned(&state, entry_id, auth_user.id).await?))
}

pub async fn delete_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(entry_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let entry = fetch_owned(&state, entry_id, auth_user.id).await?;

    sqlx::query("DELETE FROM mood_entries WHERE id = $1")
        .bind(entry.id)
        .execute(&state.db)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

pub async fn mood_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MoodStats>> {
    let entries = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let offset = state.config.calendar_offset();
    let today = Utc::now().with_timezone(&offset).date_naive();

    Ok(Json(mood_stats::summarize(&entries, today, offset)))
}
