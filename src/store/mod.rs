//! Response store access.
//!
//! Reads the survey response table from the hosted backend, or from a
//! JSON snapshot of it. Every load is a fresh, single-attempt read of
//! the whole table; the dataset is expected to fit in memory.

mod snapshot;
mod supabase;

pub use snapshot::SnapshotStore;
pub use supabase::SupabaseStore;

use crate::models::SurveyResponse;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while loading responses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or returned unusable data.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The store was constructed with an unusable configuration.
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::DataUnavailable(message.into())
    }
}

/// A read-only source of survey responses.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Fetch every response, sorted by manager name ascending.
    async fn fetch_responses(&self) -> Result<Vec<SurveyResponse>, StoreError>;

    /// Short description for progress output.
    fn describe(&self) -> String;
}

/// Stable sort by manager name, matching the backend's ordering.
pub(crate) fn sort_by_manager(responses: &mut [SurveyResponse]) {
    responses.sort_by(|a, b| a.manager_name.cmp(&b.manager_name));
}
