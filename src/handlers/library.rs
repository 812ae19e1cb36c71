use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateBookRequest, CreateVideoRequest, SuccessResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::book::Book;
use crate::models::video::Video;
use crate::AppState;

// ── Books ────────────────────────────────────────────────────────────────

pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    AppPath(book_id): AppPath<Uuid>,
) -> AppResult<Json<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Book not found".into()))?;

    Ok(Json(book))
}

pub async fn create_book(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    body.validate()?;

    let book = sqlx::query_as::<_, Book>(
        r#"
        INSERT INTO books (id, title, author, file_url, cover_url, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.title.trim())
    .bind(&body.author)
    .bind(body.file_url.trim())
    .bind(&body.cover_url)
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(book_id = %book.id, uploaded_by = %auth_user.id, "Book added");
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    AppPath(book_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Book not found".into()));
    }

    Ok(Json(SuccessResponse::ok()))
}

// ── Videos ───────────────────────────────────────────────────────────────

pub async fn list_videos(State(state): State<AppState>) -> AppResult<Json<Vec<Video>>> {
    let videos = sqlx::query_as::<_, Video>("SELECT * FROM videos ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(videos))
}

/// Public view of one video; each fetch counts as a view.
pub async fn get_video(
    State(state): State<AppState>,
    AppPath(video_id): AppPath<Uuid>,
) -> AppResult<Json<Video>> {
    let video = sqlx::query_as::<_, Video>(
        "UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING *",
    )
    .bind(video_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Video not found".into()))?;

    Ok(Json(video))
}

pub async fn create_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateVideoRequest>,
) -> AppResult<(StatusCode, Json<Video>)> {
    body.validate()?;

    let video = sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (id, title, description, video_url, thumbnail_url, duration, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.title.trim())
    .bind(&body.description)
    .bind(body.video_url.trim())
    .bind(&body.thumbnail_url)
    .bind(&body.duration)
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(video_id = %video.id, uploaded_by = %auth_user.id, "Video added");
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn delete_video(
    State(state): State<AppState>,
    AppPath(video_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video not found".into()));
    }

    Ok(Json(SuccessResponse::ok()))
}
