//! Account endpoints under `/api/auth`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use medrec_auth::{Registration, SessionUser};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

fn done(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Registration {
        session,
        verification_code,
    } = state
        .accounts
        .register(
            body.name.as_deref().unwrap_or_default(),
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    state.mailer.send_verification(
        &session.user.email,
        &verification_code,
        state.lifetimes.verification_code,
    );

    let jar = CookieJar::new().add(state.auth.cookie_config.session_cookie(session.token));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "user": session.user,
            "message": "Registered. Verification code sent to your email."
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .accounts
        .login(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    let jar = CookieJar::new().add(state.auth.cookie_config.session_cookie(session.token));
    Ok((jar, Json(json!({ "user": session.user }))))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let jar = CookieJar::new().add(state.auth.cookie_config.removal_cookie());
    (jar, done("Logged out"))
}

pub async fn me(SessionUser(user): SessionUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    ApiJson(body): ApiJson<VerifyEmailRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .accounts
        .verify_email(user, body.code.as_deref().unwrap_or_default())
        .await?;
    state.mailer.send_welcome(&user.email, &user.name);
    Ok(done("Email verified"))
}

pub async fn resend_code(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<Value>, ApiError> {
    let (user, code) = state.accounts.resend_code(user).await?;
    state
        .mailer
        .send_verification(&user.email, &code, state.lifetimes.verification_code);
    Ok(done("Verification code resent"))
}

/// Answers the same way whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(request) = state
        .accounts
        .forgot_password(body.email.as_deref().unwrap_or_default())
        .await?
    {
        state.mailer.send_reset_request(
            &request.user.email,
            &request.reset_url,
            state.lifetimes.reset_token,
        );
    }
    Ok(done("If the email exists, we sent a link"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .accounts
        .reset_password(&token, body.password.as_deref().unwrap_or_default())
        .await?;
    state.mailer.send_reset_success(&user.email);
    Ok(done("Password updated"))
}
