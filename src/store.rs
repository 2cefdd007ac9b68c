use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::{DownloadRecord, VersionRecord};
use crate::error::TrackerError;

/// Boundary with the durable storage collaborator. Two entity collections,
/// `Version` unique on name and `Download` unique on its full five-field
/// tuple. This pipeline only ever reads or creates, never updates or deletes.
pub trait ArtifactStore: Send + Sync {
    fn find_version(&self, name: &str) -> Result<Option<VersionRecord>, TrackerError>;

    /// Fails with `VersionConflict` when the name already exists, the same way
    /// a uniqueness constraint would under a concurrent writer.
    fn create_version(&self, name: &str) -> Result<VersionRecord, TrackerError>;

    fn find_download(
        &self,
        record: &DownloadRecord,
    ) -> Result<Option<DownloadRecord>, TrackerError>;

    /// Fails with `DownloadRejected` when an equal tuple already exists or the
    /// record does not validate.
    fn create_download(&self, record: DownloadRecord) -> Result<DownloadRecord, TrackerError>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for std::sync::Arc<S> {
    fn find_version(&self, name: &str) -> Result<Option<VersionRecord>, TrackerError> {
        (**self).find_version(name)
    }

    fn create_version(&self, name: &str) -> Result<VersionRecord, TrackerError> {
        (**self).create_version(name)
    }

    fn find_download(
        &self,
        record: &DownloadRecord,
    ) -> Result<Option<DownloadRecord>, TrackerError> {
        (**self).find_download(record)
    }

    fn create_download(&self, record: DownloadRecord) -> Result<DownloadRecord, TrackerError> {
        (**self).create_download(record)
    }
}

/// Mutex-guarded in-memory store. Used by the test suite and by local runs;
/// a relational backend lives behind the same trait elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    versions: HashSet<String>,
    downloads: Vec<DownloadRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_count(&self) -> usize {
        self.inner.lock().expect("store poisoned").versions.len()
    }

    pub fn download_count(&self) -> usize {
        self.inner.lock().expect("store poisoned").downloads.len()
    }

    pub fn downloads(&self) -> Vec<DownloadRecord> {
        self.inner.lock().expect("store poisoned").downloads.clone()
    }
}

impl ArtifactStore for MemoryStore {
    fn find_version(&self, name: &str) -> Result<Option<VersionRecord>, TrackerError> {
        let inner = self
            .inner
            .lock()
            .map_err(|err| TrackerError::Storage(err.to_string()))?;
        Ok(inner.versions.get(name).map(|name| VersionRecord {
            name: name.clone(),
        }))
    }

    fn create_version(&self, name: &str) -> Result<VersionRecord, TrackerError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|err| TrackerError::Storage(err.to_string()))?;
        if !inner.versions.insert(name.to_string()) {
            return Err(TrackerError::VersionConflict(name.to_string()));
        }
        Ok(VersionRecord {
            name: name.to_string(),
        })
    }

    fn find_download(
        &self,
        record: &DownloadRecord,
    ) -> Result<Option<DownloadRecord>, TrackerError> {
        let inner = self
            .inner
            .lock()
            .map_err(|err| TrackerError::Storage(err.to_string()))?;
        Ok(inner.downloads.iter().find(|d| *d == record).cloned())
    }

    fn create_download(&self, record: DownloadRecord) -> Result<DownloadRecord, TrackerError> {
        if record.filename.is_empty() || record.url.is_empty() {
            return Err(TrackerError::DownloadRejected(
                "filename and url must be present".to_string(),
            ));
        }
        let mut inner = self
            .inner
            .lock()
            .map_err(|err| TrackerError::Storage(err.to_string()))?;
        if inner.downloads.contains(&record) {
            return Err(TrackerError::DownloadRejected(format!(
                "duplicate download tuple for {}",
                record.filename
            )));
        }
        inner.downloads.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::Platform;

    fn record(url: &str) -> DownloadRecord {
        DownloadRecord {
            filename: "Git-2.30.0-64-bit.exe".to_string(),
            platform: Platform::Windows64,
            released_at: Utc.with_ymd_and_hms(2021, 1, 4, 10, 0, 0).unwrap(),
            version: VersionRecord {
                name: "Git-2.30.0-64-bit.exe".to_string(),
            },
            url: url.to_string(),
        }
    }

    #[test]
    fn version_uniqueness() {
        let store = MemoryStore::new();
        store.create_version("v1").unwrap();
        let err = store.create_version("v1").unwrap_err();
        assert_matches!(err, TrackerError::VersionConflict(_));
        assert_eq!(store.version_count(), 1);
    }

    #[test]
    fn download_tuple_identity_includes_url() {
        let store = MemoryStore::new();
        store.create_download(record("https://a.example/x")).unwrap();
        // Same filename, different mirror URL: a distinct record.
        store.create_download(record("https://b.example/x")).unwrap();
        let err = store.create_download(record("https://a.example/x")).unwrap_err();
        assert_matches!(err, TrackerError::DownloadRejected(_));
        assert_eq!(store.download_count(), 2);
    }

    #[test]
    fn find_download_matches_exact_tuple() {
        let store = MemoryStore::new();
        store.create_download(record("https://a.example/x")).unwrap();
        assert!(store.find_download(&record("https://a.example/x")).unwrap().is_some());
        assert!(store.find_download(&record("https://b.example/x")).unwrap().is_none());
    }
}
