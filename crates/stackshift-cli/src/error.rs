//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use stackshift_convert::ConvertError;
use stackshift_core::CoreError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Invalid arguments or missing inputs
    #[error("{message}")]
    #[diagnostic(code(stackshift::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template could not be loaded
    #[error("Template error: {message}")]
    #[diagnostic(code(stackshift::cli::template))]
    Template { message: String },

    /// Schema catalog could not be loaded
    #[error("Catalog error: {message}")]
    #[diagnostic(code(stackshift::cli::catalog))]
    Catalog {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Configuration file could not be read
    #[error("Config error: {message}")]
    #[diagnostic(code(stackshift::cli::config))]
    Config { message: String },

    /// Conversion failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Conversion(#[from] ConvertError),

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(stackshift::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Catalog { .. } => exit_codes::CATALOG_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Conversion(ConvertError::Template(_)) => exit_codes::TEMPLATE_ERROR,
            CliError::Conversion(_) => exit_codes::CONVERSION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a catalog error
    pub fn catalog(err: CoreError) -> Self {
        let help = match err {
            CoreError::Schema(_) | CoreError::YamlParse(_) => Some(
                "A catalog maps Terraform types to their arguments, attributes and sections"
                    .to_string(),
            ),
            _ => None,
        };
        Self::Catalog {
            message: err.to_string(),
            help,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(err) => CliError::from(err),
            other => CliError::Template {
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
