//! Stackshift Convert - CloudFormation template to Terraform converter
//!
//! This crate turns a parsed CloudFormation template into a Terraform
//! configuration. Intrinsic functions become HCL expressions:
//!
//! | CloudFormation                          | Terraform                                   |
//! |-----------------------------------------|---------------------------------------------|
//! | `{"Ref": "Env"}`                        | `var.env`                                   |
//! | `{"Fn::GetAtt": ["Logs", "Arn"]}`       | `aws_s3_bucket.logs.arn`                    |
//! | `{"Fn::Join": ["-", ["a", "b"]]}`       | `join("-", ["a", "b"])`                     |
//! | `{"Fn::Sub": "${Env}-logs"}`            | `"${var.env}-logs"`                         |
//! | `{"Fn::If": ["IsProd", 3, 1]}`          | `local.IsProd ? 3 : 1`                      |
//! | `{"Ref": "AWS::Region"}`                | `data.aws_region.current.name`              |
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use stackshift_core::{CatalogProvider, SourceDocument};
//! use stackshift_convert::{convert, WarningSeverity};
//!
//! let document = SourceDocument::load(Path::new("./stack.yaml")).unwrap();
//! let catalog = CatalogProvider::load(Path::new("./catalog.yaml")).unwrap();
//!
//! let result = convert(&document, catalog).unwrap();
//! print!("{}", result.configuration.render());
//!
//! for warning in &result.warnings {
//!     if warning.severity == WarningSeverity::Unsupported {
//!         println!("Unsupported: {} - {}", warning.pattern, warning.message);
//!     }
//! }
//! ```
//!
//! # What is kept as comments
//!
//! Anything without a Terraform equivalent stays in the output as a `//`
//! comment naming the original construct, and is reported as a warning:
//!
//! - properties with no matching argument in the target schema
//! - expressions that fail to resolve (`Fn::Transform`, unknown references)
//! - `DeletionPolicy`, `UpdatePolicy`, `Metadata` and output `Export`s

mod auxiliary;
mod functions;

pub mod converter;
pub mod error;
pub mod intrinsic;
pub mod mapper;
pub mod overrides;
pub mod resolver;

// Re-exports
pub use auxiliary::AuxLog;
pub use converter::{ConversionResult, ConvertOptions, Converter, convert, convert_with_options};
pub use error::{
    ConversionWarning, ConvertError, MapLevel, ResolveError, Result, WarningCategory,
    WarningSeverity,
};
pub use intrinsic::Intrinsic;
pub use resolver::Resolver;
