use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::AppState;

pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let message = body.checked_message()?;

    let reply = state.chat.reply(message).await?;
    tracing::debug!(user_id = %auth_user.id, provider = state.chat.name(), "Chat reply sent");

    Ok(Json(ChatResponse { reply }))
}
