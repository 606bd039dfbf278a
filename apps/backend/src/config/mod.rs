//! Environment-driven configuration for the server binary.

pub mod app;

pub use app::AppConfig;
