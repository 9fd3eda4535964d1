//! Patient endpoints under `/api/patients`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use medrec_auth::VerifiedUser;
use medrec_core::{AgeCategory, BloodType, Patient, PatientDraft, now_utc};
use medrec_storage::{Page, PageRequest, PatientQuery};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, record_id};
use crate::state::AppState;

/// Query string of `GET /api/patients`.
///
/// `bloodtype` may be repeated and each value may hold a comma-separated list.
#[derive(Debug, Default, Deserialize)]
pub struct PatientListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub bloodtype: Vec<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PatientListParams {
    pub fn into_query(self) -> Result<(PatientQuery, PageRequest), ApiError> {
        let category = self
            .category
            .filter(|c| !is_wildcard(c))
            .map(|c| restore_plus(&c).parse::<AgeCategory>())
            .transpose()?;

        let mut blood_types = Vec::new();
        for raw in self.bloodtype.iter().flat_map(|v| v.split(',')) {
            if is_wildcard(raw) {
                continue;
            }
            let bloodtype = restore_plus(raw).parse::<BloodType>()?;
            if !blood_types.contains(&bloodtype) {
                blood_types.push(bloodtype);
            }
        }

        let query = PatientQuery {
            text: self.q,
            category,
            blood_types,
        };
        Ok((
            query,
            PageRequest::parse(self.page.as_deref(), self.limit.as_deref()),
        ))
    }
}

/// Form-urlencoding decodes an unescaped `+` to a space, so `AB+` arrives as
/// `AB `. Only query values get this treatment; JSON bodies are taken as sent.
fn restore_plus(raw: &str) -> String {
    let value = raw.trim_start();
    let mut restored = value.trim_end().to_string();
    if value.ends_with(' ') && !restored.is_empty() && !restored.ends_with(['+', '-']) {
        restored.push('+');
    }
    restored
}

/// Blank and `All` mean "no filter".
fn is_wildcard(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

pub async fn create_patient(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    ApiJson(draft): ApiJson<PatientDraft>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let patient = Patient::new(user.id, draft.into_new()?, now_utc());
    state.patients.create_patient(&patient).await?;
    tracing::info!(patient_id = %patient.id, owner_id = %user.id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn list_patients(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    ApiQuery(params): ApiQuery<PatientListParams>,
) -> Result<Json<Page<Patient>>, ApiError> {
    let (query, page) = params.into_query()?;
    let page = state.patients.search_patients(user.id, &query, page).await?;
    Ok(Json(page))
}

pub async fn get_patient(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = record_id(&id, "Patient")?;
    state
        .patients
        .get_patient(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient not found"))
}

/// Partial update: absent fields keep their stored values.
pub async fn update_patient(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<PatientDraft>,
) -> Result<Json<Patient>, ApiError> {
    let id = record_id(&id, "Patient")?;
    let changes = draft.into_changes()?;
    let patient = state
        .patients
        .update_patient(user.id, id, &changes, now_utc())
        .await?;
    Ok(Json(patient))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = record_id(&id, "Patient")?;
    let diagnoses = state.patients.delete_patient(user.id, id).await?;
    tracing::info!(patient_id = %id, diagnoses, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
