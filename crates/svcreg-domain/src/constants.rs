//! Domain layer constants
//!
//! Values that are part of the registry's observable contract. Backend and
//! configuration defaults live in `svcreg_infrastructure::constants`.

// ============================================================================
// REGISTERED SERVICE CONSTANTS
// ============================================================================

/// Identifier carried by a service that has never been persisted
pub const INITIAL_IDENTIFIER_VALUE: i64 = -1;

/// Evaluation order of services that do not declare one; sorts last
pub const DEFAULT_EVALUATION_ORDER: i32 = i32::MAX;

/// Characters allowed in a service name (it becomes part of storage identifiers)
///
/// The first character must be a letter, digit or `_`, so a name never
/// yields a hidden file.
pub const SERVICE_NAME_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_ .\-]*$";

// ============================================================================
// PERSISTENT ID CONSTANTS
// ============================================================================

/// Separator fed into the digest after each identifier
pub const PERSISTENT_ID_SEPARATOR: u8 = b'!';

/// Length of a lazily generated salt
pub const PERSISTENT_ID_SALT_LENGTH: usize = 16;

// ============================================================================
// REMOTE ACCESS CONSTANTS
// ============================================================================

/// Query parameter carrying the principal id to a remote access endpoint
pub const REMOTE_ACCESS_USERNAME_PARAM: &str = "username";

/// Response codes accepted when a remote endpoint strategy declares none
pub const DEFAULT_ACCEPTABLE_RESPONSE_CODES: &str = "200,202";
