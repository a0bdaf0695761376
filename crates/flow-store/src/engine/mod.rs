//! Key-value engine interface consumed by the store.
//!
//! Values are addressed by a `(persona, app, key)` triple. The engine owns
//! durability, single-key atomicity and the global reverse lookup; this crate
//! only relies on the operations below.

mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryEngine;

/// All keys of one application inside one persona.
pub type AppStore = BTreeMap<String, Value>;

/// One application's keys across every persona, keyed by persona id.
pub type AppDump = BTreeMap<String, AppStore>;

/// Errors reported by a key-value engine.
///
/// The not-found messages are the engine's own error strings and stay lower
/// case so they read the same on both sides of the engine boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("persona not found")]
    PersonaNotFound,

    #[error("app not found")]
    AppNotFound,

    #[error("key not found")]
    KeyNotFound,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the error only signals absence of the addressed value.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PersonaNotFound | Self::AppNotFound | Self::KeyNotFound
        )
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[async_trait]
pub trait KvEngine: Send + Sync {
    async fn get(&self, persona: &str, app: &str, key: &str) -> EngineResult<Value>;

    async fn set(&self, persona: &str, app: &str, key: &str, value: Value) -> EngineResult<()>;

    /// Must succeed when the key is already absent.
    async fn delete(&self, persona: &str, app: &str, key: &str) -> EngineResult<()>;

    /// Atomically relocate one key, keeping the global lookup consistent.
    async fn move_key(&self, src: &str, dst: &str, app: &str, key: &str) -> EngineResult<()>;

    /// Find a key without knowing its persona. Returns the value and the
    /// persona currently holding it.
    async fn get_global(&self, app: &str, key: &str) -> EngineResult<(Value, String)>;

    async fn get_app_store(&self, persona: &str, app: &str) -> EngineResult<AppStore>;

    /// Consistent snapshot of one application across all personas.
    async fn dump_app(&self, app: &str) -> EngineResult<AppDump>;

    /// Relocate a key and replace its content.
    ///
    /// The default is `move_key` followed by `set`. If the `set` fails the
    /// key has already moved and still carries its previous content; callers
    /// see the error and must re-read before retrying. Engines that can do
    /// both under one lock should override this.
    async fn move_and_set(
        &self,
        src: &str,
        dst: &str,
        app: &str,
        key: &str,
        value: Value,
    ) -> EngineResult<()> {
        self.move_key(src, dst, app, key).await?;
        self.set(dst, app, key, value).await
    }
}
