//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Template not found: {path}")]
    TemplateNotFound { path: String },

    #[error("Invalid template: {message}")]
    InvalidTemplate { message: String },

    #[error("Template is missing the required '{section}' section")]
    MissingSection { section: String },

    #[error("Resource '{logical_id}' is missing the required 'Type' property")]
    MissingType { logical_id: String },

    #[error("{construct} is native to CloudFormation and has no Terraform equivalent")]
    UnsupportedConstruct { construct: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Failure to resolve a source type against the target schema catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("No Terraform type found for '{cfn_type}'")]
    NotFound { cfn_type: String },

    #[error("Invalid schema catalog: {message}")]
    InvalidCatalog { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
