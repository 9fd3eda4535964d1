//! Accounts, sessions and access control for medrec.
//!
//! - [`service::AccountService`]: registration, login, email verification,
//!   password reset
//! - [`jwt::JwtService`]: HS256 session tokens
//! - [`middleware`]: `SessionUser` / `VerifiedUser` extractors and the
//!   session cookie
//! - [`user::UserStorage`]: the persistence contract backends implement

pub mod config;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod secrets;
pub mod service;
pub mod user;

pub use config::{AuthConfig, CookieConfig};
pub use error::AuthError;
pub use jwt::{JwtError, JwtService, SessionClaims};
pub use middleware::{AuthState, SessionUser, VerifiedUser};
pub use service::{AccountService, Registration, ResetRequest, Session};
pub use user::{User, UserStorage};
