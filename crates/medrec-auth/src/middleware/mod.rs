//! HTTP middleware for authentication and authorization.
//!
//! - Session cookie extraction and validation
//! - Verified-email gate
//! - JSON error responses

pub mod cookies;
pub mod error;
pub mod session;

pub use error::status_code;
pub use session::{AuthState, SessionUser, VerifiedUser};
