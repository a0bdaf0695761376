use serde::{Deserialize, Serialize};

use crate::constants::{CLIENT_KEY_PREFIX, FILE_KEY_PREFIX, SYSTEM_PERSONA};

/// Who a file belongs to.
///
/// On the wire this is a plain string: the empty string is [`Owner::System`],
/// anything else is the owning client's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Owner {
    #[default]
    System,
    Client(String),
}

impl Owner {
    pub fn client(id: impl Into<String>) -> Self {
        Self::from(id.into())
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }

    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::System => None,
            Self::Client(id) => Some(id),
        }
    }

    /// Wire form: `""` for the system owner.
    pub fn as_str(&self) -> &str {
        self.client_id().unwrap_or("")
    }
}

impl From<String> for Owner {
    fn from(id: String) -> Self {
        if id.is_empty() {
            Self::System
        } else {
            Self::Client(id)
        }
    }
}

impl From<&str> for Owner {
    fn from(id: &str) -> Self {
        Self::from(id.to_string())
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::System => String::new(),
            Owner::Client(id) => id,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => f.write_str(SYSTEM_PERSONA),
            Self::Client(id) => f.write_str(id),
        }
    }
}

/// Persona namespace that must hold a record with the given owner.
pub fn resolve_persona(owner: &Owner) -> &str {
    match owner {
        Owner::System => SYSTEM_PERSONA,
        Owner::Client(id) => id,
    }
}

/// Typed key of a record inside the shared application namespace.
///
/// Anything outside the two record prefixes is a free-form persona document
/// (the kanban board, UI state).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    File(String),
    Client(String),
    Document(String),
}

impl RecordKey {
    pub fn file(id: impl Into<String>) -> Self {
        Self::File(id.into())
    }

    pub fn client(id: impl Into<String>) -> Self {
        Self::Client(id.into())
    }

    /// Document key, or `None` for an empty name or one that would collide
    /// with the record prefixes.
    pub fn document(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty()
            || name.starts_with(FILE_KEY_PREFIX)
            || name.starts_with(CLIENT_KEY_PREFIX)
        {
            return None;
        }
        Some(Self::Document(name))
    }

    /// Engine-level key, e.g. `file:<id>`.
    pub fn storage_key(&self) -> String {
        match self {
            Self::File(id) => format!("{FILE_KEY_PREFIX}{id}"),
            Self::Client(id) => format!("{CLIENT_KEY_PREFIX}{id}"),
            Self::Document(name) => name.clone(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(id) = raw.strip_prefix(FILE_KEY_PREFIX) {
            Some(Self::File(id.to_string()))
        } else if let Some(id) = raw.strip_prefix(CLIENT_KEY_PREFIX) {
            Some(Self::Client(id.to_string()))
        } else {
            Self::document(raw)
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::File(id) | Self::Client(id) | Self::Document(id) => id,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}
