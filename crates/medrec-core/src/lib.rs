//! Core domain types for the medrec patient record server.
//!
//! Everything here is storage-agnostic: the patient and diagnosis records,
//! the derived age band, blood types, and the validated inputs that the
//! HTTP layer turns request bodies into.

pub mod age;
pub mod blood;
pub mod clock;
pub mod diagnosis;
pub mod error;
pub mod patient;
pub mod text;

pub use age::{Age, AgeCategory};
pub use blood::BloodType;
pub use clock::now_utc;
pub use diagnosis::{Diagnosis, DiagnosisChanges, DiagnosisDraft, NewDiagnosis};
pub use error::{Result, ValidationError};
pub use patient::{NewPatient, Patient, PatientChanges, PatientDraft};
