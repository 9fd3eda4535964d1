//! # medrec-storage
//!
//! Storage abstraction layer for medrec.
//!
//! This crate defines the traits and types that storage backends implement.
//! Implementations live in `medrec-db-postgres` and `medrec-db-memory`.
//!
//! ## Example
//!
//! ```ignore
//! use medrec_storage::{PageRequest, PatientQuery, PatientStorage};
//!
//! async fn seniors(storage: &dyn PatientStorage, owner: Uuid) -> StorageResult<u64> {
//!     let query = PatientQuery {
//!         category: Some(AgeCategory::Senior),
//!         ..Default::default()
//!     };
//!     let page = storage.search_patients(owner, &query, PageRequest::default()).await?;
//!     Ok(page.total)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{DiagnosisStorage, HealthCheck, PatientStorage};
pub use types::{DiagnosisQuery, Page, PageRequest, PatientQuery};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;
