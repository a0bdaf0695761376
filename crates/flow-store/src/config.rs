//! Store configuration loaded from environment variables.
//!
//! All settings have defaults so the store can be opened with zero
//! configuration for local development. Only client registration needs a
//! namespace.

use std::path::PathBuf;

use flow_shared::constants::{DEFAULT_PAGE_SIZE, MAX_UPLOAD_SIZE};
use flow_shared::identity::parse_namespace;
use uuid::Uuid;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root data directory.
    /// Env: `DATA_DIR`
    /// Default: `./data`
    pub data_dir: PathBuf,

    /// Directory holding uploaded file content.
    /// Env: `STORAGE_DIR`
    /// Default: `<DATA_DIR>/uploads`
    pub storage_dir: PathBuf,

    /// Namespace for deriving client ids from recovery codes.
    /// Env: `CELERIX_NAMESPACE` (UUID)
    /// Default: unset.
    pub namespace: Option<Uuid>,

    /// Maximum upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 100 MiB.
    pub max_upload_size: usize,

    /// Page length used when a caller sends none or an invalid one.
    /// Env: `DEFAULT_PAGE_SIZE`
    /// Default: `8`
    pub default_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            storage_dir: data_dir.join("uploads"),
            data_dir,
            namespace: None,
            max_upload_size: MAX_UPLOAD_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("DATA_DIR").filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
            config.storage_dir = config.data_dir.join("uploads");
        }

        if let Some(dir) = lookup("STORAGE_DIR").filter(|d| !d.is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(ns) = lookup("CELERIX_NAMESPACE") {
            match parse_namespace(&ns) {
                Ok(uuid) => config.namespace = Some(uuid),
                Err(e) => {
                    tracing::warn!(
                        value = %ns,
                        error = %e,
                        "Invalid CELERIX_NAMESPACE, client registration disabled"
                    );
                }
            }
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("DEFAULT_PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.default_page_size = n,
                _ => tracing::warn!(value = %val, "Invalid DEFAULT_PAGE_SIZE, using default"),
            }
        }

        config
    }

    pub fn require_namespace(&self) -> Result<Uuid> {
        self.namespace
            .ok_or_else(|| StoreError::Config("CELERIX_NAMESPACE is not set".to_string()))
    }
}
