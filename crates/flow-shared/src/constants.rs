/// Application namespace every record lives under in the key-value engine
pub const APP_ID: &str = "flow";

/// Reserved persona holding client records and ownerless files
pub const SYSTEM_PERSONA: &str = "_system";

/// Key prefix for file records
pub const FILE_KEY_PREFIX: &str = "file:";

/// Key prefix for client records
pub const CLIENT_KEY_PREFIX: &str = "client:";

/// Display name reported for files without an owner
pub const OWNER_NAME_ADMIN: &str = "Admin";

/// Display name reported when the owning client no longer resolves
pub const OWNER_NAME_UNKNOWN: &str = "Unknown";

/// Page size used when the caller does not supply a usable one
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Length of a generated recovery code
pub const RECOVERY_CODE_LEN: usize = 8;

/// Maximum upload size in bytes (100 MiB)
pub const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Document name of a persona's kanban board
pub const KANBAN_DOCUMENT: &str = "kanban";
