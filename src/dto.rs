//! # Ustawi: Request/Response DTOs
//!
//! API contract types shared by the handlers.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Response` → serialized to client JSON
//! - Field-level rules are expressed via `validator` derive macros; rules that
//!   span fields (required-together fields, label lookup) live in methods here

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::mood::Mood;
use crate::models::user::{Role, UserProfile};

// ============================================================================
// Common
// ============================================================================

/// Standard success envelope for soft and hard deletes
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

// ============================================================================
// Resources
// ============================================================================

/// POST /api/admin/resources
#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

/// PATCH /api/admin/resources/{id}: partial update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    #[validate(length(min = 1, max = 200, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

// ============================================================================
// Appointments
// ============================================================================

/// POST /api/appointments
///
/// Required fields are optional at the serde layer so that a missing field
/// surfaces as a 400 naming the field rather than a body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
    #[serde(alias = "resource")]
    pub resource_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A booking request whose required fields have been checked.
#[derive(Debug)]
pub struct NewBooking {
    pub title: String,
    pub description: Option<String>,
    pub resource_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreateAppointmentRequest {
    pub fn into_booking(self) -> AppResult<NewBooking> {
        self.validate()?;

        let title = self.title.filter(|t| !t.trim().is_empty());
        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if self.resource_id.is_none() {
            missing.push("resource_id");
        }
        if self.start.is_none() {
            missing.push("start");
        }
        if self.end.is_none() {
            missing.push("end");
        }

        match (title, self.resource_id, self.start, self.end) {
            (Some(title), Some(resource_id), Some(start), Some(end)) => Ok(NewBooking {
                title,
                description: self.description,
                resource_id,
                start,
                end,
            }),
            _ => Err(AppError::Validation(format!(
                "Missing fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// PATCH /api/appointments/{id}: reschedule, omitted fields keep their value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
    #[serde(alias = "resource")]
    pub resource_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

// ============================================================================
// Moods
// ============================================================================

/// POST /api/moods
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodRequest {
    pub mood: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Score must be 1-10"))]
    pub score: Option<i32>,

    #[validate(length(max = 5000, message = "Note must be under 5000 characters"))]
    pub note: Option<String>,
}

impl CreateMoodRequest {
    /// Validates the body and resolves the mood label.
    pub fn checked_mood(&self) -> AppResult<Mood> {
        self.validate()?;
        let label = self
            .mood
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("mood: Mood required".into()))?;
        label
            .to_lowercase()
            .parse::<Mood>()
            .map_err(|e| AppError::Validation(format!("mood: {e}")))
    }
}

// ============================================================================
// Articles
// ============================================================================

/// POST /api/admin/articles
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 300, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary must be under 1000 characters"))]
    pub summary: Option<String>,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub category: Option<String>,
}

/// POST /api/admin/books. Files are hosted elsewhere; only their URLs are stored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 300, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 200, message = "Author must be under 200 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 2048, message = "Book file URL required"))]
    pub file_url: String,
    #[validate(length(max = 2048, message = "Cover URL too long"))]
    pub cover_url: Option<String>,
}

/// POST /api/admin/videos
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 300, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2048, message = "Video URL required"))]
    pub video_url: String,
    #[validate(length(max = 2048, message = "Thumbnail URL too long"))]
    pub thumbnail_url: Option<String>,
    #[validate(length(max = 32, message = "Duration must be under 32 characters"))]
    pub duration: Option<String>,
}

// ============================================================================
// Admin
// ============================================================================

/// PATCH /api/admin/users/{id}/role
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

impl UpdateRoleRequest {
    pub fn parsed(&self) -> AppResult<Role> {
        self.role.parse::<Role>().map_err(AppError::Validation)
    }
}

// ============================================================================
// AI chat
// ============================================================================

/// POST /api/ai/chat
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub message: String,
}

impl ChatRequest {
    /// The trimmed message. Whitespace-only input is rejected like an empty one.
    pub fn checked_message(&self) -> AppResult<&str> {
        self.validate()?;
        let message = self.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation(
                "message: Message must be 1-4000 characters".into(),
            ));
        }
        Ok(message)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}
