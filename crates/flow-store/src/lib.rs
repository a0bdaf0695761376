//! # flow-store
//!
//! Multi-tenant record store for Flow, layered over a persona-scoped
//! key-value engine.
//!
//! Every record lives under the `flow` application namespace of exactly one
//! persona: files under their owner's persona (or the system persona when
//! ownerless), clients always under the system persona. The crate exposes a
//! [`Store`] handle with typed operations for the client directory, the file
//! registry, cross-persona file listing and opaque per-persona documents.

pub mod blobs;
pub mod clients;
pub mod config;
pub mod documents;
pub mod engine;
pub mod files;
pub mod listing;
pub mod models;
pub mod store;

mod error;

pub use blobs::{BlobStorage, FsBlobStore};
pub use config::StoreConfig;
pub use engine::{EngineError, KvEngine, MemoryEngine};
pub use error::{Result, StoreError};
pub use models::*;
pub use store::Store;
