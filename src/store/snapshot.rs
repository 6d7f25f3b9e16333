//! JSON snapshot reader.
//!
//! A snapshot is the response table exported as a JSON array, in the
//! same row shape the backend returns.

use super::{sort_by_manager, ResponseStore, StoreError};
use crate::models::SurveyResponse;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Reads responses from a local JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResponseStore for SnapshotStore {
    async fn fetch_responses(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StoreError::unavailable(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let mut responses: Vec<SurveyResponse> = serde_json::from_str(&content).map_err(|e| {
            StoreError::unavailable(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        sort_by_manager(&mut responses);
        info!(
            "Loaded {} responses from {}",
            responses.len(),
            self.path.display()
        );
        Ok(responses)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_and_sorts_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "b1", "manager_name": "Zoe", "created_at": "2025-02-01T00:00:00Z"}},
                {{"id": "a1", "manager_name": "Adam", "created_at": "2025-02-02T00:00:00Z"}},
                {{"id": "b2", "manager_name": "Zoe", "created_at": "2025-02-03T00:00:00Z"}}
            ]"#
        )
        .unwrap();

        let store = SnapshotStore::new(file.path());
        let responses = tokio_test::block_on(store.fetch_responses()).unwrap();

        let ids: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b1", "b2"]);
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let store = SnapshotStore::new("/definitely/not/here.json");
        let err = tokio_test::block_on(store.fetch_responses()).unwrap_err();
        assert!(matches!(err, StoreError::DataUnavailable(_)));
    }

    #[test]
    fn test_invalid_json_is_data_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let store = SnapshotStore::new(file.path());
        let err = tokio_test::block_on(store.fetch_responses()).unwrap_err();
        assert!(err.to_string().starts_with("data unavailable"));
    }
}
