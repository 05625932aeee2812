//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// Conversion error - a structural failure, or strict mode rejected the result
pub const CONVERSION_ERROR: i32 = 2;

/// Template error - the input is not a valid CloudFormation template
pub const TEMPLATE_ERROR: i32 = 3;

/// Catalog error - the schema catalog is missing or invalid
pub const CATALOG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Configuration error - unreadable config file (sysexits.h EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
