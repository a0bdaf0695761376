//! Free-form per-persona documents.
//!
//! Documents share the `flow` namespace with file and client records but
//! are opaque JSON: the store neither validates nor lists them.

use flow_shared::constants::{APP_ID, KANBAN_DOCUMENT};
use flow_shared::types::RecordKey;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Read a document, `None` when the persona has never saved it.
    pub async fn get_document(&self, persona: &str, name: &str) -> Result<Option<Value>> {
        let key = document_key(persona, name)?;
        self.fetch(persona, &key).await
    }

    pub async fn save_document(&self, persona: &str, name: &str, value: Value) -> Result<()> {
        let key = document_key(persona, name)?;
        self.engine()
            .set(persona, APP_ID, &key.storage_key(), value)
            .await?;
        debug!(persona, name, "saved document");
        Ok(())
    }

    /// The persona's kanban board, or an empty board.
    pub async fn kanban_board(&self, persona: &str) -> Result<Value> {
        Ok(self
            .get_document(persona, KANBAN_DOCUMENT)
            .await?
            .unwrap_or_else(|| json!({ "columns": [] })))
    }

    pub async fn save_kanban_board(&self, persona: &str, board: Value) -> Result<()> {
        self.save_document(persona, KANBAN_DOCUMENT, board).await
    }
}

fn document_key(persona: &str, name: &str) -> Result<RecordKey> {
    if persona.is_empty() {
        return Err(StoreError::BadRequest("persona is required".to_string()));
    }
    RecordKey::document(name)
        .ok_or_else(|| StoreError::BadRequest(format!("invalid document name: {name:?}")))
}
