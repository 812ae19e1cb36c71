use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest accepted intensity score for a check-in. Scores start at 1.
pub const MAX_SCORE: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: String,
    pub score: Option<i32>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The labels a user may check in with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Excited,
    Neutral,
    Sad,
    Anxious,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Excited,
        Mood::Neutral,
        Mood::Sad,
        Mood::Anxious,
        Mood::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Angry => "angry",
        }
    }

    /// Signed sentiment weight of the label.
    pub fn weight(&self) -> f64 {
        match self {
            Mood::Happy | Mood::Excited => 1.0,
            Mood::Neutral => 0.5,
            Mood::Sad => -0.8,
            Mood::Anxious => -0.7,
            Mood::Angry => -0.9,
        }
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Unknown mood '{s}'"))
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScoreSummary {
    pub avg_score: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodCount {
    pub mood: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MoodStats {
    pub summary: ScoreSummary,
    pub mood_counts: Vec<MoodCount>,
    pub streak: u32,
    pub longest_streak: u32,
    pub total_entries: usize,
}
