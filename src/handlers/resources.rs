use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::db;
use crate::dto::{CreateResourceRequest, SuccessResponse, UpdateResourceRequest};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::resource::Resource;
use crate::AppState;

pub async fn list_resources(State(state): State<AppState>) -> AppResult<Json<Vec<Resource>>> {
    let resources = sqlx::query_as::<_, Resource>("SELECT * FROM resources ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(resources))
}

pub async fn get_resource(
    State(state): State<AppState>,
    AppPath(resource_id): AppPath<Uuid>,
) -> AppResult<Json<Resource>> {
    let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
        .bind(resource_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Resource not found".into()))?;

    Ok(Json(resource))
}

pub async fn create_resource(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateResourceRequest>,
) -> AppResult<(StatusCode, Json<Resource>)> {
    body.validate()?;

    let resource = sqlx::query_as::<_, Resource>(
        r#"
        INSERT INTO resources (id, name, kind, location, capacity, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.name.trim())
    .bind(&body.kind)
    .bind(&body.location)
    .bind(body.capacity)
    .bind(&body.metadata)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(resource_id = %resource.id, "Resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn update_resource(
    State(state): State<AppState>,
    AppPath(resource_id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateResourceRequest>,
) -> AppResult<Json<Resource>> {
    body.validate()?;

    let resource = sqlx::query_as::<_, Resource>(
        r#"
        UPDATE resources SET
            name = COALESCE($2, name),
            kind = COALESCE($3, kind),
            location = COALESCE($4, location),
            capacity = COALESCE($5, capacity),
            metadata = COALESCE($6, metadata)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resource_id)
    .bind(&body.name)
    .bind(&body.kind)
    .bind(&body.location)
    .bind(body.capacity)
    .bind(&body.metadata)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Resource not found".into()))?;

    Ok(Json(resource))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    AppPath(resource_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(resource_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if db::sqlstate(&e).as_deref() == Some(db::FOREIGN_KEY_VIOLATION) {
                AppError::Conflict("Resource still has appointments".into())
            } else {
                AppError::Database(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Resource not found".into()));
    }

    tracing::info!(resource_id = %resource_id, "Resource deleted");
    Ok(Json(SuccessResponse::ok()))
}
