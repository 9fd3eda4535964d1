//! Patient age and the age band derived from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Oldest age a patient record accepts.
pub const MAX_AGE: u8 = 120;

/// A patient age in whole years, always within `0..=120`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Age(u8);

impl Age {
    /// Validates a raw age.
    pub fn new(years: i64) -> Result<Self> {
        if (0..=i64::from(MAX_AGE)).contains(&years) {
            Ok(Self(years as u8))
        } else {
            Err(ValidationError::AgeOutOfRange(years))
        }
    }

    pub fn years(self) -> u8 {
        self.0
    }

    /// The band this age falls into.
    pub fn category(self) -> AgeCategory {
        AgeCategory::from_age(self.0)
    }
}

impl TryFrom<i64> for Age {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Age> for i64 {
    fn from(age: Age) -> Self {
        i64::from(age.0)
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Age band of a patient.
///
/// Never supplied by clients. It is recomputed from [`Age`] every time a
/// record is created or its age changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "0-12")]
    Child,
    #[serde(rename = "13-17")]
    Adolescent,
    #[serde(rename = "18-59")]
    Adult,
    #[serde(rename = "60+")]
    Senior,
}

impl AgeCategory {
    pub const ALL: [AgeCategory; 4] = [Self::Child, Self::Adolescent, Self::Adult, Self::Senior];

    pub fn from_age(years: u8) -> Self {
        match years {
            0..=12 => Self::Child,
            13..=17 => Self::Adolescent,
            18..=59 => Self::Adult,
            _ => Self::Senior,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "0-12",
            Self::Adolescent => "13-17",
            Self::Adult => "18-59",
            Self::Senior => "60+",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidAgeCategory(s.to_string()))
    }
}
