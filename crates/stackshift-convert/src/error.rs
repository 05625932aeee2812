//! Error and warning types for the converter
//!
//! Resolution failures fall in two classes. Structural ones abort the whole
//! template; everything else is caught at the property boundary, preserved
//! as a comment in the output and reported as a [`ConversionWarning`].

use miette::Diagnostic;
use stackshift_core::{CoreError, SchemaError};
use std::fmt;
use thiserror::Error;

use crate::intrinsic::Intrinsic;

/// Level of a `Fn::FindInMap` lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLevel {
    Map,
    TopLevelKey,
    SecondLevelKey,
}

impl fmt::Display for MapLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Map => "map",
            Self::TopLevelKey => "top-level key",
            Self::SecondLevelKey => "second-level key",
        })
    }
}

/// Failure while resolving an intrinsic function
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum ResolveError {
    #[error("{function} - {message}")]
    #[diagnostic(code(stackshift::resolve::argument))]
    ArgumentShape { function: Intrinsic, message: String },

    #[error("{function} is not allowed inside {parent}")]
    #[diagnostic(
        code(stackshift::resolve::nesting),
        help("CloudFormation only permits certain functions to be nested inside each other")
    )]
    NestingViolation { function: Intrinsic, parent: String },

    #[error("Unable to resolve reference to '{name}'")]
    #[diagnostic(code(stackshift::resolve::reference))]
    UnresolvedReference { name: String },

    #[error("Fn::Select - index {index} is out of range for a list of {len} items")]
    #[diagnostic(code(stackshift::resolve::index))]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Fn::FindInMap - {level} '{key}' not found")]
    #[diagnostic(code(stackshift::resolve::map_key))]
    MissingMapKey { level: MapLevel, key: String },

    #[error("Fn::FindInMap - expected exactly one locals block, found {found}")]
    #[diagnostic(code(stackshift::resolve::locals))]
    MissingLocals { found: usize },

    #[error("Unknown pseudo parameter '{name}'")]
    #[diagnostic(
        code(stackshift::resolve::pseudo_parameter),
        help("Supported: AWS::AccountId, AWS::NotificationARNs, AWS::NoValue, AWS::Partition, AWS::Region, AWS::StackId, AWS::StackName, AWS::URLSuffix")
    )]
    UnknownPseudoParameter { name: String },

    #[error("{construct} is native to CloudFormation and cannot be converted to a Terraform expression")]
    #[diagnostic(code(stackshift::resolve::unsupported))]
    UnsupportedConstruct { construct: String },

    #[error("Could not convert attribute '{attribute}' of '{resource}': {reason}")]
    #[diagnostic(code(stackshift::resolve::attribute))]
    UnmappableAttribute {
        resource: String,
        attribute: String,
        reason: String,
    },

    #[error("Schema lookup failed: {0}")]
    #[diagnostic(code(stackshift::resolve::schema))]
    SchemaLookup(#[from] SchemaError),
}

impl ResolveError {
    /// Structural errors invalidate the whole template
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NestingViolation { .. } | Self::UnknownPseudoParameter { .. }
        )
    }

    pub(crate) fn shape(function: Intrinsic, message: impl Into<String>) -> Self {
        Self::ArgumentShape {
            function,
            message: message.into(),
        }
    }
}

/// Converter error
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error(transparent)]
    #[diagnostic(code(stackshift::convert::template))]
    Template(#[from] CoreError),

    #[error("{logical_id}: {source}")]
    #[diagnostic(code(stackshift::convert::structure))]
    Structural {
        logical_id: String,
        #[source]
        #[diagnostic_source]
        source: ResolveError,
    },

    #[error("{count} construct(s) could not be converted")]
    #[diagnostic(
        code(stackshift::convert::strict),
        help("Run without --strict to keep them as comments in the output")
    )]
    Strict {
        count: usize,
        warnings: Vec<ConversionWarning>,
    },
}

// =============================================================================
// WARNING SYSTEM
// =============================================================================

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningSeverity {
    /// Informational - construct preserved as a comment by design
    Info,
    /// Warning - conversion succeeded but manual review recommended
    Warning,
    /// Unsupported - no Terraform equivalent exists
    Unsupported,
    /// Error - conversion failed for this element
    Error,
}

impl WarningSeverity {
    /// Get the label for this severity
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Unsupported => "unsupported",
            Self::Error => "error",
        }
    }

    /// Get the icon for this severity
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Warning => "⚠",
            Self::Unsupported => "✗",
            Self::Error => "✗",
        }
    }
}

/// Warning category for grouping related warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCategory {
    /// A property name with no matching Terraform argument
    Property,
    /// An intrinsic function that could not be resolved
    Expression,
    /// A CloudFormation construct with no Terraform equivalent
    Unsupported,
    /// A resource type missing from the schema catalog
    Schema,
    /// Resource attributes kept as comments (DeletionPolicy, Metadata, ...)
    Preserved,
}

impl WarningCategory {
    /// Get the display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Expression => "expression",
            Self::Unsupported => "unsupported",
            Self::Schema => "schema",
            Self::Preserved => "preserved",
        }
    }
}

/// Rich warning with context
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionWarning {
    /// Warning severity
    pub severity: WarningSeverity,
    /// Warning category
    pub category: WarningCategory,
    /// Template section (`Resources`, `Outputs`, ...)
    pub section: String,
    /// Logical id of the element
    pub logical_id: String,
    /// The construct that triggered the warning
    pub pattern: String,
    /// Human-readable message
    pub message: String,
    /// Suggested alternative or fix
    pub suggestion: Option<String>,
}

impl ConversionWarning {
    fn new(
        severity: WarningSeverity,
        category: WarningCategory,
        section: &str,
        logical_id: &str,
        pattern: &str,
        message: &str,
    ) -> Self {
        Self {
            severity,
            category,
            section: section.to_string(),
            logical_id: logical_id.to_string(),
            pattern: pattern.to_string(),
            message: message.to_string(),
            suggestion: None,
        }
    }

    /// Create an info-level warning
    pub fn info(section: &str, logical_id: &str, pattern: &str, message: &str) -> Self {
        Self::new(
            WarningSeverity::Info,
            WarningCategory::Preserved,
            section,
            logical_id,
            pattern,
            message,
        )
    }

    /// Create a warning-level warning
    pub fn warning(section: &str, logical_id: &str, pattern: &str, message: &str) -> Self {
        Self::new(
            WarningSeverity::Warning,
            WarningCategory::Property,
            section,
            logical_id,
            pattern,
            message,
        )
    }

    /// Create an unsupported construct warning
    pub fn unsupported(section: &str, logical_id: &str, pattern: &str, message: &str) -> Self {
        Self::new(
            WarningSeverity::Unsupported,
            WarningCategory::Unsupported,
            section,
            logical_id,
            pattern,
            message,
        )
    }

    /// Create an error-level warning
    pub fn error(section: &str, logical_id: &str, pattern: &str, message: &str) -> Self {
        Self::new(
            WarningSeverity::Error,
            WarningCategory::Expression,
            section,
            logical_id,
            pattern,
            message,
        )
    }

    /// Classify a recoverable resolution failure
    pub fn from_resolve(section: &str, logical_id: &str, pattern: &str, err: &ResolveError) -> Self {
        match err {
            ResolveError::UnsupportedConstruct { .. } => {
                Self::unsupported(section, logical_id, pattern, &err.to_string())
                    .with_suggestion("Rewrite this value by hand in the generated configuration")
            }
            ResolveError::SchemaLookup(_) => {
                Self::error(section, logical_id, pattern, &err.to_string())
                    .with_category(WarningCategory::Schema)
            }
            _ => Self::error(section, logical_id, pattern, &err.to_string()),
        }
    }

    /// Add suggestion to warning
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Set category
    pub fn with_category(mut self, category: WarningCategory) -> Self {
        self.category = category;
        self
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: [severity] Section.LogicalId - message
        write!(
            f,
            "[{}] {}.{} - {}",
            self.severity.label(),
            self.section,
            self.logical_id,
            self.message
        )?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  {} {}", self.severity.icon(), suggestion)?;
        }

        Ok(())
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
