//! Provider-specific constants

use std::time::Duration;

// ============================================================================
// EVENT CONSTANTS
// ============================================================================

/// Broadcast channel capacity of the tokio event publisher
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// RESOURCE REGISTRY CONSTANTS
// ============================================================================

/// File extension of JSON service definitions
pub const JSON_EXTENSION: &str = "json";

/// File extension of YAML service definitions
pub const YAML_EXTENSION: &str = "yml";

/// Alternative YAML extension accepted when reading
pub const YAML_EXTENSION_ALT: &str = "yaml";

/// Prefix of in-flight temporary files; such files are never loaded
pub const TEMP_FILE_PREFIX: &str = ".";

/// Suffix of in-flight temporary files
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

// ============================================================================
// RELATIONAL REGISTRY CONSTANTS
// ============================================================================

/// Default database URL (shared in-memory SQLite)
pub const SQL_DEFAULT_URL: &str = "sqlite::memory:";

/// Default connection pool size
pub const SQL_DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default bound for a single relational operation
pub const SQL_DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// DIRECTORY REGISTRY CONSTANTS
// ============================================================================

/// Default base DN for service entries
pub const DIRECTORY_DEFAULT_BASE_DN: &str = "ou=services,dc=example,dc=org";

/// Object class of service entries
pub const DIRECTORY_OBJECT_CLASS: &str = "registeredService";

/// Attribute holding the entry's object classes
pub const DIRECTORY_OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// RDN attribute holding the service id
pub const DIRECTORY_ID_ATTRIBUTE: &str = "uid";

/// Attribute holding the service pattern
pub const DIRECTORY_SERVICE_ID_ATTRIBUTE: &str = "serviceId";

/// Attribute holding the service name
pub const DIRECTORY_NAME_ATTRIBUTE: &str = "cn";

/// Attribute holding the serialized service body
pub const DIRECTORY_BODY_ATTRIBUTE: &str = "description";

// ============================================================================
// REMOTE ACCESS CONSTANTS
// ============================================================================

/// Default timeout of a remote access check
pub const REMOTE_ACCESS_DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
