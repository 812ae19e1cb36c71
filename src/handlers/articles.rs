use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateArticleRequest, SuccessResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::article::Article;
use crate::AppState;

pub async fn list_articles(State(state): State<AppState>) -> AppResult<Json<Vec<Article>>> {
    let articles =
        sqlx::query_as::<_, Article>("SELECT * FROM articles ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<AppState>,
    AppPath(article_id): AppPath<Uuid>,
) -> AppResult<Json<Article>> {
    let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
        .bind(article_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Article not found".into()))?;

    Ok(Json(article))
}

pub async fn create_article(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateArticleRequest>,
) -> AppResult<(StatusCode, Json<Article>)> {
    body.validate()?;

    let article = sqlx::query_as::<_, Article>(
        r#"
        INSERT INTO articles (id, title, summary, content, category, author_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.title.trim())
    .bind(&body.summary)
    .bind(&body.content)
    .bind(&body.category)
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(article_id = %article.id, author_id = %auth_user.id, "Article published");
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn delete_article(
    State(state): State<AppState>,
    AppPath(article_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(article_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Article not found".into()));
    }

    Ok(Json(SuccessResponse::ok()))
}
