pub mod admin;
pub mod appointments;
pub mod articles;
pub mod auth;
pub mod chat;
pub mod health;
pub mod library;
pub mod moods;
pub mod resources;
