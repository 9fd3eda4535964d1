//! In-memory storage backend for medrec.
//!
//! Implements [`UserStorage`](medrec_auth::UserStorage),
//! [`PatientStorage`](medrec_storage::PatientStorage) and
//! [`DiagnosisStorage`](medrec_storage::DiagnosisStorage) on top of plain
//! hash maps. Data is lost on restart; use it for tests and local demos.
//!
//! # Example
//!
//! ```ignore
//! use medrec_db_memory::InMemoryStorage;
//! use medrec_storage::PatientStorage;
//!
//! let storage = InMemoryStorage::new();
//! storage.create_patient(&patient).await?;
//! ```

mod records;
pub mod storage;
mod users;

pub use storage::InMemoryStorage;

/// Creates a new shareable in-memory store.
pub fn create_storage() -> std::sync::Arc<InMemoryStorage> {
    std::sync::Arc::new(InMemoryStorage::new())
}
