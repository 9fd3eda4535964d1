//! Query and pagination types.

use medrec_core::{AgeCategory, BloodType, Patient};
use serde::Serialize;

// =============================================================================
// Pagination
// =============================================================================

/// A page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamps to `page >= 1` and `1 <= limit <= 100`. Missing values fall
    /// back to page 1 and a limit of 20.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        let limit = limit
            .unwrap_or(i64::from(Self::DEFAULT_LIMIT))
            .clamp(1, i64::from(Self::MAX_LIMIT));
        Self {
            page: page as u32,
            limit: limit as u32,
        }
    }

    /// Parses raw query string values. Anything that is not an integer counts as absent.
    #[must_use]
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let int = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());
        Self::new(int(page), int(limit))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Number of pages needed to show `total` records.
    pub fn pages_for(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            pages: request.pages_for(total),
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Filters for listing a user's patients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    /// Case-insensitive substring matched against fullname, email and phone.
    pub text: Option<String>,
    pub category: Option<AgeCategory>,
    /// Empty means any blood type.
    pub blood_types: Vec<BloodType>,
}

impl PatientQuery {
    /// Blank search text is treated as no search at all.
    pub fn search_term(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// In-process evaluation of the filters, used by backends without a query engine.
    pub fn matches(&self, patient: &Patient) -> bool {
        if self.category.is_some_and(|c| c != patient.age_category) {
            return false;
        }
        if !self.blood_types.is_empty() && !self.blood_types.contains(&patient.bloodtype) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                [&patient.fullname, &patient.email, &patient.phone]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

/// Filters for listing the diagnoses of one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosisQuery {
    /// Full-text search over title and description.
    pub text: Option<String>,
}

impl DiagnosisQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Lowercased alphanumeric words of the search term, deduplicated.
    ///
    /// A diagnosis matches when it contains any of them.
    pub fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for word in self
            .search_term()
            .unwrap_or_default()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if !terms.contains(&word) {
                terms.push(word);
            }
        }
        terms
    }
}
