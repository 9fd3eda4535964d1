//! HTTP server for medrec: account, patient and diagnosis endpoints.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{MedrecServer, ServerBuilder, build_app, build_state};
pub use state::AppState;
