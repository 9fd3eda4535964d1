use thiserror::Error;

/// Input validation failures for patient and diagnosis records.
///
/// The `Display` output is what clients see in the `error` field, so the
/// messages name the offending JSON field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must contain at least one item")]
    EmptyList { field: &'static str },

    #[error("age must be an integer between 0 and 120, got {0}")]
    AgeOutOfRange(i64),

    #[error("Invalid blood type: {0}")]
    InvalidBloodType(String),

    #[error("Invalid age category: {0}")]
    InvalidAgeCategory(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid id for {field}: {value}")]
    InvalidId { field: &'static str, value: String },

    #[error("{field} is derived and cannot be set")]
    DerivedField { field: &'static str },
}

impl ValidationError {
    /// Create a new Required error
    pub fn required(field: &'static str) -> Self {
        Self::Required { field }
    }

    /// Create a new EmptyList error
    pub fn empty_list(field: &'static str) -> Self {
        Self::EmptyList { field }
    }

    /// Create a new InvalidId error
    pub fn invalid_id(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            field,
            value: value.into(),
        }
    }

    /// Name of the JSON field the error is about, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Required { field }
            | Self::EmptyList { field }
            | Self::InvalidId { field, .. }
            | Self::DerivedField { field } => Some(field),
            Self::AgeOutOfRange(_) => Some("age"),
            Self::InvalidBloodType(_) => Some("bloodtype"),
            Self::InvalidAgeCategory(_) => Some("category"),
            Self::InvalidEmail(_) => Some("email"),
        }
    }
}

/// Result type for domain validation
pub type Result<T> = std::result::Result<T, ValidationError>;
