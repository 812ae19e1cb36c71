pub mod booking;
pub mod chat;
pub mod mood_stats;
