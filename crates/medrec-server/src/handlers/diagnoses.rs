//! Diagnosis endpoints under `/api/diagnoses`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use medrec_auth::VerifiedUser;
use medrec_core::{Diagnosis, DiagnosisDraft, now_utc};
use medrec_storage::{DiagnosisQuery, Page, PageRequest, StorageError};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, record_id};
use crate::state::AppState;

const NOT_YOUR_PATIENT: &str = "Not authorized for this patient";

#[derive(Debug, Default, Deserialize)]
pub struct DiagnosisListParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Diagnoses may only reference the caller's own patients. Someone else's
/// patient and a missing one get the same answer.
async fn ensure_owns_patient(
    state: &AppState,
    owner_id: Uuid,
    patient_id: Uuid,
) -> Result<(), ApiError> {
    if state.patients.patient_exists(owner_id, patient_id).await? {
        Ok(())
    } else {
        tracing::debug!(%owner_id, %patient_id, "Patient not owned by caller");
        Err(ApiError::forbidden(NOT_YOUR_PATIENT))
    }
}

pub async fn create_diagnosis(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    ApiJson(draft): ApiJson<DiagnosisDraft>,
) -> Result<(StatusCode, Json<Diagnosis>), ApiError> {
    let input = draft.into_new()?;
    ensure_owns_patient(&state, user.id, input.patient_id).await?;

    let diagnosis = Diagnosis::new(user.id, input, now_utc());
    state
        .diagnoses
        .create_diagnosis(&diagnosis)
        .await
        .map_err(|e| match e {
            // The patient was deleted after the ownership check.
            StorageError::NotFound { .. } => ApiError::forbidden(NOT_YOUR_PATIENT),
            other => other.into(),
        })?;
    tracing::info!(diagnosis_id = %diagnosis.id, patient_id = %diagnosis.patient_id, "Diagnosis created");
    Ok((StatusCode::CREATED, Json(diagnosis)))
}

pub async fn list_patient_diagnoses(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(patient_id): Path<String>,
    ApiQuery(params): ApiQuery<DiagnosisListParams>,
) -> Result<Json<Page<Diagnosis>>, ApiError> {
    let patient_id =
        Uuid::parse_str(patient_id.trim()).map_err(|_| ApiError::forbidden(NOT_YOUR_PATIENT))?;
    ensure_owns_patient(&state, user.id, patient_id).await?;

    let query = DiagnosisQuery { text: params.q };
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref());
    let page = state
        .diagnoses
        .search_diagnoses(user.id, patient_id, &query, page)
        .await?;
    Ok(Json(page))
}

pub async fn get_diagnosis(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<Json<Diagnosis>, ApiError> {
    let id = record_id(&id, "Diagnosis")?;
    state
        .diagnoses
        .get_diagnosis(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Diagnosis not found"))
}

/// Only title, description and medicine can change; the patient link is fixed.
pub async fn update_diagnosis(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<DiagnosisDraft>,
) -> Result<Json<Diagnosis>, ApiError> {
    let id = record_id(&id, "Diagnosis")?;
    let changes = draft.into_changes()?;
    let diagnosis = state
        .diagnoses
        .update_diagnosis(user.id, id, &changes, now_utc())
        .await?;
    Ok(Json(diagnosis))
}

pub async fn delete_diagnosis(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = record_id(&id, "Diagnosis")?;
    state.diagnoses.delete_diagnosis(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
