//! Diagnosis records attached to a patient.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::text;

/// A stored diagnosis.
///
/// `owner_id` duplicates the owning patient's owner so access checks never
/// need a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub medicine: Vec<String>,
    #[serde(rename = "patient")]
    pub patient_id: Uuid,
    #[serde(rename = "createdBy")]
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Diagnosis {
    pub fn new(owner_id: Uuid, input: NewDiagnosis, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            medicine: input.medicine,
            patient_id: input.patient_id,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: DiagnosisChanges, now: OffsetDateTime) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(medicine) = changes.medicine {
            self.medicine = medicine;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiagnosis {
    pub title: String,
    pub description: String,
    pub medicine: Vec<String>,
    pub patient_id: Uuid,
}

/// Partial update; the patient a diagnosis belongs to never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosisChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub medicine: Option<Vec<String>>,
}

/// Diagnosis fields as they arrive in a request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosisDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub medicine: Option<Vec<String>>,
    pub patient: Option<String>,
}

impl DiagnosisDraft {
    pub fn into_new(self) -> Result<NewDiagnosis> {
        let title = text::required("title", self.title)?;
        let patient = self
            .patient
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::required("patient"))?;
        let medicine = text::non_empty_list("medicine", self.medicine)?;
        let patient_id =
            Uuid::parse_str(&patient).map_err(|_| ValidationError::invalid_id("patient", patient))?;
        Ok(NewDiagnosis {
            title,
            description: self.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            medicine,
            patient_id,
        })
    }

    /// Only title, description and medicine can change; `patient` is ignored.
    pub fn into_changes(self) -> Result<DiagnosisChanges> {
        Ok(DiagnosisChanges {
            title: self
                .title
                .map(|v| text::required("title", Some(v)))
                .transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
            medicine: self
                .medicine
                .map(|v| text::non_empty_list("medicine", Some(v)))
                .transpose()?,
        })
    }
}
