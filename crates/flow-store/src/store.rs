//! The [`Store`] handle.
//!
//! A `Store` holds no record state of its own. Each operation reads the
//! current value from the engine, works on it in memory and writes it back,
//! so a handle can be cloned freely across concurrent requests.

use std::sync::Arc;

use flow_shared::constants::APP_ID;
use flow_shared::types::RecordKey;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::blobs::{BlobStorage, FsBlobStore};
use crate::config::StoreConfig;
use crate::engine::KvEngine;
use crate::error::Result;

#[derive(Clone)]
pub struct Store {
    engine: Arc<dyn KvEngine>,
    blobs: Arc<dyn BlobStorage>,
    config: Arc<StoreConfig>,
}

impl Store {
    pub fn new(engine: Arc<dyn KvEngine>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self::with_config(StoreConfig::default(), engine, blobs)
    }

    pub fn with_config(
        config: StoreConfig,
        engine: Arc<dyn KvEngine>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            engine,
            blobs,
            config: Arc::new(config),
        }
    }

    /// Open a store whose file content lives on disk under
    /// `config.storage_dir`.
    pub async fn open(config: StoreConfig, engine: Arc<dyn KvEngine>) -> Result<Self> {
        let blobs = FsBlobStore::new(config.storage_dir.clone(), config.max_upload_size).await?;
        tracing::info!(
            storage = %blobs.base_path().display(),
            registration = config.namespace.is_some(),
            "opening store"
        );
        Ok(Self::with_config(config, engine, Arc::new(blobs)))
    }

    pub fn engine(&self) -> &dyn KvEngine {
        self.engine.as_ref()
    }

    pub fn blobs(&self) -> &dyn BlobStorage {
        self.blobs.as_ref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Fetch and decode one record from a persona.
    ///
    /// Absence and undecodable values both come back as `None`; only engine
    /// failures are errors.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        persona: &str,
        key: &RecordKey,
    ) -> Result<Option<T>> {
        match self.engine.get(persona, APP_ID, &key.storage_key()).await {
            Ok(value) => Ok(decode(key, value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(key: &RecordKey, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "skipping undecodable record");
            None
        }
    }
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::Store;
    use crate::blobs::FsBlobStore;
    use crate::config::StoreConfig;
    use crate::engine::MemoryEngine;

    /// Store over a fresh in-memory engine and a scratch upload directory.
    pub(crate) async fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().to_path_buf(),
            storage_dir: dir.path().join("uploads"),
            namespace: Some(uuid::Uuid::new_v4()),
            max_upload_size: 1024,
            ..StoreConfig::default()
        };
        let store = Store::open(config, Arc::new(MemoryEngine::new()))
            .await
            .unwrap();
        (store, dir)
    }
}
