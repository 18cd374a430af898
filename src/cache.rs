use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::EngineConfig;
use crate::dataset::{self, Dataset, DatasetError};

static GLOBAL: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

/// Content hash of a source file combined with the engine config it was
/// normalized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetKey([u8; 32]);

impl DatasetKey {
    pub fn derive(bytes: &[u8], config: &EngineConfig) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.update([0u8]);
        hasher.update(config.fingerprint());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Read-through cache of normalized datasets.
///
/// The file is always read so its content can be hashed; parsing and
/// normalization only run on a miss. Entries never change once inserted.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<DatasetKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static DatasetCache {
        &GLOBAL
    }

    pub fn load(&self, path: &Path, config: &EngineConfig) -> Result<Arc<Dataset>, DatasetError> {
        let bytes = dataset::read_source(path)?;
        let key = DatasetKey::derive(&bytes, config);
        if let Some(hit) = self.get(&key) {
            debug!(key = %key, path = %path.display(), "dataset cache hit");
            return Ok(hit);
        }

        let loaded = Arc::new(Dataset::from_bytes(key, path, bytes, config)?);
        Ok(self.insert(loaded))
    }

    /// Inserts a prebuilt dataset; an existing entry under the same key wins.
    pub fn insert(&self, dataset: Arc<Dataset>) -> Arc<Dataset> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .entry(*dataset.key())
            .or_insert_with(|| dataset)
            .clone()
    }

    pub fn get(&self, key: &DatasetKey) -> Option<Arc<Dataset>> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }
}
