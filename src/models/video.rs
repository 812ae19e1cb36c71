use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A library video. `video_url` is either a hosted link (e.g. YouTube) or the
/// location of an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}
