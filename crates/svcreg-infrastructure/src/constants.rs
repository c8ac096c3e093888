//! Infrastructure layer constants
//!
//! Domain-specific constants are defined in `svcreg_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "svcreg.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "svcreg";

/// Environment variable prefix for configuration (`SVCREG__REGISTRY__PROVIDER=sql`)
pub const CONFIG_ENV_PREFIX: &str = "SVCREG";

/// Separator between the prefix and nested configuration keys
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "SVCREG_LOG";

/// Rolling log file name used when the configured path has no stem
pub const DEFAULT_LOG_FILE_STEM: &str = "svcreg";

// ============================================================================
// REGISTRY CONSTANTS
// ============================================================================

/// Default registry backend
pub const DEFAULT_REGISTRY_PROVIDER: &str = "json";

/// Default directory of the resource backends
pub const DEFAULT_SERVICES_DIR: &str = "services";

/// Backends that store one file per service and need a location
pub const RESOURCE_PROVIDERS: [&str; 2] = ["json", "yaml"];

/// Default pool size of the relational backend
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default bound of a relational operation, in seconds
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// MANAGER CONSTANTS
// ============================================================================

/// Default reload period of the services manager, in seconds (0 disables)
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 120;

// ============================================================================
// REMOTE ACCESS CONSTANTS
// ============================================================================

/// Default remote access checker
pub const DEFAULT_REMOTE_ACCESS_PROVIDER: &str = "http";

/// Default remote access check timeout, in seconds
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 5;

/// Default user agent of remote access checks
pub const DEFAULT_USER_AGENT: &str = concat!("svcreg/", env!("CARGO_PKG_VERSION"));
