pub mod appointment;
pub mod article;
pub mod book;
pub mod mood;
pub mod resource;
pub mod user;
pub mod video;
