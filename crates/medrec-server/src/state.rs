use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use medrec_auth::{AccountService, AuthConfig, AuthState, CookieConfig, JwtService, UserStorage};
use medrec_notifications::Mailer;
use medrec_storage::{DiagnosisStorage, HealthCheck, PatientStorage};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub auth: AuthState,
    pub patients: Arc<dyn PatientStorage>,
    pub diagnoses: Arc<dyn DiagnosisStorage>,
    pub health: Arc<dyn HealthCheck>,
    pub mailer: Mailer,
    pub lifetimes: Lifetimes,
}

/// Expiry windows quoted in outgoing mail.
#[derive(Debug, Clone, Copy)]
pub struct Lifetimes {
    pub verification_code: Duration,
    pub reset_token: Duration,
}

impl AppState {
    /// Wires every service onto one storage backend.
    pub fn new<B>(backend: Arc<B>, mailer: Mailer, auth: &AuthConfig, production: bool) -> Self
    where
        B: UserStorage + PatientStorage + DiagnosisStorage + HealthCheck + 'static,
    {
        let jwt = Arc::new(JwtService::new(
            auth.jwt_secret.as_bytes(),
            auth.session_lifetime,
        ));
        let users: Arc<dyn UserStorage> = backend.clone();
        let cookie_config = CookieConfig::new(&auth.cookie_name, auth.session_lifetime, production);

        Self {
            accounts: AccountService::new(users.clone(), jwt.clone(), auth),
            auth: AuthState::new(jwt, users, cookie_config),
            patients: backend.clone(),
            diagnoses: backend.clone(),
            health: backend,
            mailer,
            lifetimes: Lifetimes {
                verification_code: auth.verification_code_lifetime,
                reset_token: auth.reset_token_lifetime,
            },
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
