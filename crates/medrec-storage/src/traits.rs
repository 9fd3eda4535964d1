//! Storage traits for patient and diagnosis records.
//!
//! Every method takes the caller's user id. There is no way
//! to read or modify a record without naming its owner.

use async_trait::async_trait;
use medrec_core::{Diagnosis, DiagnosisChanges, Patient, PatientChanges};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::StorageResult;
use crate::types::{DiagnosisQuery, Page, PageRequest, PatientQuery};

/// Patient persistence.
#[async_trait]
pub trait PatientStorage: Send + Sync {
    /// Stores a new patient.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the owner already has a patient with the same
    /// email, phone or fullname.
    async fn create_patient(&self, patient: &Patient) -> StorageResult<()>;

    /// Loads a patient owned by `owner_id`.
    async fn get_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Patient>>;

    /// Returns `true` if `owner_id` owns a patient with this id.
    async fn patient_exists(&self, owner_id: Uuid, id: Uuid) -> StorageResult<bool>;

    /// Applies a partial update and returns the stored result.
    ///
    /// The age band is recomputed when the age changes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the patient does not exist for this owner,
    /// `Conflict` on a uniqueness violation.
    async fn update_patient(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &PatientChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Patient>;

    /// Deletes a patient together with all of its diagnoses, atomically.
    ///
    /// Returns the number of diagnoses removed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the patient does not exist for this owner.
    async fn delete_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<u64>;

    /// Lists the owner's patients, newest first.
    async fn search_patients(
        &self,
        owner_id: Uuid,
        query: &PatientQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Patient>>;
}

/// Diagnosis persistence.
#[async_trait]
pub trait DiagnosisStorage: Send + Sync {
    /// Stores a new diagnosis.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the referenced patient does not belong to the
    /// diagnosis owner.
    async fn create_diagnosis(&self, diagnosis: &Diagnosis) -> StorageResult<()>;

    async fn get_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Diagnosis>>;

    /// # Errors
    ///
    /// Returns `NotFound` if the diagnosis does not exist for this owner.
    async fn update_diagnosis(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &DiagnosisChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Diagnosis>;

    /// # Errors
    ///
    /// Returns `NotFound` if the diagnosis does not exist for this owner.
    async fn delete_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Lists diagnoses of one patient. With a search term results are ranked
    /// by relevance, then newest first; otherwise newest first.
    async fn search_diagnoses(
        &self,
        owner_id: Uuid,
        patient_id: Uuid,
        query: &DiagnosisQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Diagnosis>>;
}

/// Liveness probe for the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StorageResult<()>;
}
