//! Patient and diagnosis records.

use async_trait::async_trait;
use medrec_core::{Diagnosis, DiagnosisChanges, Patient, PatientChanges};
use medrec_storage::{
    DiagnosisQuery, DiagnosisStorage, Page, PageRequest, PatientQuery, PatientStorage,
    StorageError, StorageResult,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::storage::{InMemoryStorage, State, newest_first, paginate};

// =============================================================================
// Patients
// =============================================================================

/// First unique field of `candidate` already used by another patient of the same owner.
fn duplicate_field(state: &State, candidate: &Patient) -> Option<&'static str> {
    let siblings: Vec<&Patient> = state
        .patients
        .values()
        .filter(|p| p.owner_id == candidate.owner_id && p.id != candidate.id)
        .collect();

    if siblings.iter().any(|p| p.email == candidate.email) {
        Some("email")
    } else if siblings.iter().any(|p| p.phone == candidate.phone) {
        Some("phone")
    } else if siblings.iter().any(|p| p.fullname == candidate.fullname) {
        Some("fullname")
    } else {
        None
    }
}

#[async_trait]
impl PatientStorage for InMemoryStorage {
    async fn create_patient(&self, patient: &Patient) -> StorageResult<()> {
        let mut state = self.state.write().await;
        if let Some(field) = duplicate_field(&state, patient) {
            return Err(StorageError::duplicate("Patient", field));
        }
        state.patients.insert(patient.id, patient.clone());
        Ok(())
    }

    async fn get_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Patient>> {
        let state = self.state.read().await;
        Ok(state
            .patients
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned())
    }

    async fn patient_exists(&self, owner_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let state = self.state.read().await;
        Ok(state.patients.get(&id).is_some_and(|p| p.owner_id == owner_id))
    }

    async fn update_patient(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &PatientChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Patient> {
        let mut state = self.state.write().await;
        let mut updated = state
            .patients
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Patient", id))?;

        updated.apply(changes.clone(), now);
        if let Some(field) = duplicate_field(&state, &updated) {
            return Err(StorageError::duplicate("Patient", field));
        }
        state.patients.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<u64> {
        let mut state = self.state.write().await;
        if !state.patients.get(&id).is_some_and(|p| p.owner_id == owner_id) {
            return Err(StorageError::not_found("Patient", id));
        }
        state.patients.remove(&id);

        let before = state.diagnoses.len();
        state.diagnoses.retain(|_, d| d.patient_id != id);
        let removed = (before - state.diagnoses.len()) as u64;

        tracing::debug!(patient_id = %id, diagnoses = removed, "Deleted patient");
        Ok(removed)
    }

    async fn search_patients(
        &self,
        owner_id: Uuid,
        query: &PatientQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Patient>> {
        let state = self.state.read().await;
        let mut matches: Vec<Patient> = state
            .patients
            .values()
            .filter(|p| p.owner_id == owner_id && query.matches(p))
            .cloned()
            .collect();
        matches.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(paginate(matches, page))
    }
}

// =============================================================================
// Diagnoses
// =============================================================================

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Title hits weigh twice as much as description hits. Zero means no match.
fn relevance(diagnosis: &Diagnosis, terms: &[String]) -> u32 {
    let title = words(&diagnosis.title);
    let description = words(&diagnosis.description);
    let hit = |haystack: &[String], term: &str| haystack.iter().any(|w| w.starts_with(term));

    terms
        .iter()
        .map(|term| 2 * u32::from(hit(&title, term)) + u32::from(hit(&description, term)))
        .sum()
}

#[async_trait]
impl DiagnosisStorage for InMemoryStorage {
    async fn create_diagnosis(&self, diagnosis: &Diagnosis) -> StorageResult<()> {
        let mut state = self.state.write().await;
        let owned = state
            .patients
            .get(&diagnosis.patient_id)
            .is_some_and(|p| p.owner_id == diagnosis.owner_id);
        if !owned {
            return Err(StorageError::not_found("Patient", diagnosis.patient_id));
        }
        state.diagnoses.insert(diagnosis.id, diagnosis.clone());
        Ok(())
    }

    async fn get_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Diagnosis>> {
        let state = self.state.read().await;
        Ok(state
            .diagnoses
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned())
    }

    async fn update_diagnosis(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &DiagnosisChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Diagnosis> {
        let mut state = self.state.write().await;
        let diagnosis = state
            .diagnoses
            .get_mut(&id)
            .filter(|d| d.owner_id == owner_id)
            .ok_or_else(|| StorageError::not_found("Diagnosis", id))?;
        diagnosis.apply(changes.clone(), now);
        Ok(diagnosis.clone())
    }

    async fn delete_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<()> {
        let mut state = self.state.write().await;
        if !state.diagnoses.get(&id).is_some_and(|d| d.owner_id == owner_id) {
            return Err(StorageError::not_found("Diagnosis", id));
        }
        state.diagnoses.remove(&id);
        Ok(())
    }

    async fn search_diagnoses(
        &self,
        owner_id: Uuid,
        patient_id: Uuid,
        query: &DiagnosisQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Diagnosis>> {
        let state = self.state.read().await;
        let searching = query.search_term().is_some();
        let terms = query.terms();

        let mut scored: Vec<(u32, Diagnosis)> = state
            .diagnoses
            .values()
            .filter(|d| d.owner_id == owner_id && d.patient_id == patient_id)
            .map(|d| (relevance(d, &terms), d.clone()))
            .filter(|(score, _)| !searching || *score > 0)
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| newest_first((a.created_at, a.id), (b.created_at, b.id)))
        });
        Ok(paginate(scored.into_iter().map(|(_, d)| d).collect(), page))
    }
}
