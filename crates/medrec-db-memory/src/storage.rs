use std::collections::HashMap;

use async_trait::async_trait;
use medrec_auth::User;
use medrec_core::{Diagnosis, Patient};
use medrec_storage::{HealthCheck, Page, PageRequest, StorageResult};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory storage backend.
///
/// All records sit behind a single lock, so multi-record operations such as
/// deleting a patient with its diagnoses are atomic.
///
/// This storage implementation provides:
/// - Per-owner uniqueness of patient email, phone and fullname
/// - Cascading patient deletes
/// - Filtered, paginated patient listing
/// - Relevance-ranked diagnosis search
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    pub(crate) state: RwLock<State>,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) users: HashMap<Uuid, User>,
    pub(crate) patients: HashMap<Uuid, Patient>,
    pub(crate) diagnoses: HashMap<Uuid, Diagnosis>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored patients across all owners.
    pub async fn patient_count(&self) -> usize {
        self.state.read().await.patients.len()
    }

    /// Number of stored diagnoses across all owners.
    pub async fn diagnosis_count(&self) -> usize {
        self.state.read().await.diagnoses.len()
    }
}

#[async_trait]
impl HealthCheck for InMemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Newest first; ties broken by id so pages are stable.
pub(crate) fn newest_first(a: (OffsetDateTime, Uuid), b: (OffsetDateTime, Uuid)) -> std::cmp::Ordering {
    b.cmp(&a)
}

/// Cuts one page out of an already sorted result set.
pub(crate) fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(offset)
        .take(request.limit() as usize)
        .collect();
    Page::new(items, total, request)
}
