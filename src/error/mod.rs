pub mod api;
pub mod app;
pub mod chat;
pub mod config;

// Optional prelude for convenient imports
pub mod prelude {
    pub use super::api::ApiError;
    pub use super::app::AppError;
    pub use super::chat::ChatError;
    pub use super::config::ConfigError;
}
