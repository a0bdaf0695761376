//! Record shapes persisted in the key-value engine.
//!
//! Field names are the serialization contract for any caller-facing layer;
//! `owner_id` uses the empty string for system-owned files.

use flow_shared::types::Owner;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Metadata for one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Unique id, assigned at upload and never changed.
    pub id: String,
    /// Display name.
    pub original_name: String,
    /// Locator of the content in byte storage.
    pub stored_path: String,
    /// Content size in bytes.
    pub size: i64,
    /// Unix seconds.
    pub upload_time: i64,
    pub owner_id: Owner,
    /// Resolved on every read, never persisted.
    #[serde(default)]
    pub owner_name: String,
    /// Unguessable token for link-based downloads.
    pub download_link: String,
    pub is_public: bool,
}

impl FileRecord {
    /// Engine value for this record, without derived fields.
    pub(crate) fn to_stored_value(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("owner_name");
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A known client identity. Always stored in the system persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    /// Derived from the recovery code.
    pub id: String,
    pub name: String,
    /// Secret used to recover the identity; unique across clients.
    pub recovery_code: String,
    /// Unix seconds of the last observed activity.
    pub last_active: i64,
    pub is_admin: bool,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Whose view a listing is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Administrative view: every file.
    #[default]
    Global,
    /// The client's own files plus every public file.
    Client(String),
}

impl ListScope {
    /// Scope for a raw owner id as callers pass it: empty means no filter.
    pub fn for_owner(owner_id: &str) -> Self {
        if owner_id.is_empty() {
            Self::Global
        } else {
            Self::Client(owner_id.to_string())
        }
    }

    pub fn can_see(&self, record: &FileRecord) -> bool {
        match self {
            Self::Global => true,
            Self::Client(id) if id.is_empty() => true,
            Self::Client(id) => record.is_public || record.owner_id.client_id() == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Case-insensitive substring of `original_name`; empty matches all.
    pub search: String,
    pub scope: ListScope,
    /// Page length; 0 returns everything from `offset` on.
    pub limit: usize,
    pub offset: usize,
}

impl ListQuery {
    /// Build a query from raw page parameters as a request layer sees them:
    /// a page below 1 becomes 1 and a limit below 1 becomes `default_limit`.
    pub fn paged(
        search: impl Into<String>,
        scope: ListScope,
        page: i64,
        limit: i64,
        default_limit: usize,
    ) -> Self {
        let page = page.max(1) as usize;
        let limit = if limit < 1 {
            default_limit
        } else {
            limit as usize
        };
        Self {
            search: search.into(),
            scope,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// One page of a file listing.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FileListing {
    pub files: Vec<FileRecord>,
    /// Matches before pagination.
    pub total: usize,
    /// Stored values under the file prefix that could not be decoded.
    #[serde(skip)]
    pub skipped: usize,
}
