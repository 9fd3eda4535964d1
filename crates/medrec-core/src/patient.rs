//! Patient records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::age::{Age, AgeCategory};
use crate::blood::BloodType;
use crate::error::{Result, ValidationError};
use crate::text;

/// A stored patient, always scoped to the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub fullname: String,
    pub diseases: Vec<String>,
    pub email: String,
    pub phone: String,
    pub age: Age,
    pub age_category: AgeCategory,
    pub bloodtype: BloodType,
    #[serde(rename = "createdBy")]
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Patient {
    /// Builds a fresh record for `owner_id`, deriving the age band.
    pub fn new(owner_id: Uuid, input: NewPatient, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            fullname: input.fullname,
            diseases: input.diseases,
            email: input.email,
            phone: input.phone,
            age: input.age,
            age_category: input.age.category(),
            bloodtype: input.bloodtype,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update. The age band follows the age.
    pub fn apply(&mut self, changes: PatientChanges, now: OffsetDateTime) {
        if let Some(fullname) = changes.fullname {
            self.fullname = fullname;
        }
        if let Some(diseases) = changes.diseases {
            self.diseases = diseases;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(phone) = changes.phone {
            self.phone = phone;
        }
        if let Some(age) = changes.age {
            self.age = age;
            self.age_category = age.category();
        }
        if let Some(bloodtype) = changes.bloodtype {
            self.bloodtype = bloodtype;
        }
        self.updated_at = now;
    }
}

/// Validated input for creating a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub fullname: String,
    pub diseases: Vec<String>,
    pub email: String,
    pub phone: String,
    pub age: Age,
    pub bloodtype: BloodType,
}

/// Validated partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
    pub fullname: Option<String>,
    pub diseases: Option<Vec<String>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<Age>,
    pub bloodtype: Option<BloodType>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Patient fields as they arrive in a request body, before validation.
///
/// `ageCategory` is accepted by the deserializer only so that a client
/// trying to set it gets a validation error instead of silent success.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub fullname: Option<String>,
    pub diseases: Option<Vec<String>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub bloodtype: Option<String>,
    pub age_category: Option<serde_json::Value>,
}

impl PatientDraft {
    /// Validates a full record. The first violation wins.
    pub fn into_new(self) -> Result<NewPatient> {
        self.reject_derived()?;
        Ok(NewPatient {
            fullname: text::required("fullname", self.fullname)?,
            diseases: text::non_empty_list("diseases", self.diseases)?,
            email: text::email("email", self.email)?,
            phone: text::required("phone", self.phone)?,
            age: Age::new(self.age.ok_or(ValidationError::required("age"))?)?,
            bloodtype: self
                .bloodtype
                .ok_or(ValidationError::required("bloodtype"))?
                .parse()?,
        })
    }

    /// Validates only the fields that are present.
    pub fn into_changes(self) -> Result<PatientChanges> {
        self.reject_derived()?;
        Ok(PatientChanges {
            fullname: self
                .fullname
                .map(|v| text::required("fullname", Some(v)))
                .transpose()?,
            diseases: self
                .diseases
                .map(|v| text::non_empty_list("diseases", Some(v)))
                .transpose()?,
            email: self
                .email
                .map(|v| text::email("email", Some(v)))
                .transpose()?,
            phone: self
                .phone
                .map(|v| text::required("phone", Some(v)))
                .transpose()?,
            age: self.age.map(Age::new).transpose()?,
            bloodtype: self.bloodtype.map(|v| v.parse()).transpose()?,
        })
    }

    fn reject_derived(&self) -> Result<()> {
        if self.age_category.is_some() {
            return Err(ValidationError::DerivedField {
                field: "ageCategory",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(value: serde_json::Value) -> PatientDraft {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> PatientDraft {
        draft(json!({
            "fullname": " Jane Doe ",
            "diseases": ["asthma", " "],
            "email": "Jane@Example.com",
            "phone": "555-0100",
            "age": 45,
            "bloodtype": "o+"
        }))
    }

    #[test]
    fn new_patient_is_normalized() {
        let input = sample().into_new().unwrap();
        assert_eq!(input.fullname, "Jane Doe");
        assert_eq!(input.diseases, vec!["asthma"]);
        assert_eq!(input.email, "jane@example.com");
        assert_eq!(input.bloodtype, BloodType::OPositive);

        let patient = Patient::new(Uuid::new_v4(), input, crate::now_utc());
        assert_eq!(patient.age_category, AgeCategory::Adult);
        assert_eq!(patient.created_at, patient.updated_at);
    }

    #[test]
    fn first_violation_wins() {
        let err = draft(json!({ "diseases": [] })).into_new().unwrap_err();
        assert_eq!(err, ValidationError::required("fullname"));

        let err = draft(json!({ "fullname": "X", "diseases": [] }))
            .into_new()
            .unwrap_err();
        assert_eq!(err, ValidationError::empty_list("diseases"));
    }

    #[test]
    fn age_category_cannot_be_supplied() {
        let mut d = sample();
        d.age_category = Some(json!("60+"));
        assert_eq!(
            d.clone().into_new().unwrap_err(),
            ValidationError::DerivedField {
                field: "ageCategory"
            }
        );
        assert!(d.into_changes().is_err());
    }

    #[test]
    fn update_recomputes_band() {
        let mut patient = Patient::new(Uuid::new_v4(), sample().into_new().unwrap(), crate::now_utc());
        let changes = draft(json!({ "age": 8 })).into_changes().unwrap();
        patient.apply(changes, crate::now_utc());
        assert_eq!(patient.age.years(), 8);
        assert_eq!(patient.age_category, AgeCategory::Child);
        assert_eq!(patient.fullname, "Jane Doe");
    }

    #[test]
    fn changes_validate_present_fields_only() {
        let changes = draft(json!({ "bloodtype": "ab-" })).into_changes().unwrap();
        assert_eq!(changes.bloodtype, Some(BloodType::AbNegative));
        assert!(changes.fullname.is_none());

        assert!(draft(json!({ "age": 200 })).into_changes().is_err());
        assert!(draft(json!({ "fullname": "  " })).into_changes().is_err());
        assert!(draft(json!({})).into_changes().unwrap().is_empty());
    }

    #[test]
    fn serializes_with_wire_names() {
        let owner = Uuid::new_v4();
        let patient = Patient::new(owner, sample().into_new().unwrap(), crate::now_utc());
        let value = serde_json::to_value(&patient).unwrap();
        assert_eq!(value["ageCategory"], "18-59");
        assert_eq!(value["bloodtype"], "O+");
        assert_eq!(value["createdBy"], owner.to_string());
        assert!(value["createdAt"].is_string());
    }
}
