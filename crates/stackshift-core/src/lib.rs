//! Stackshift Core - Core types for CloudFormation to Terraform conversion
//!
//! This crate provides the foundational types used throughout stackshift:
//! - `SourceDocument` / `Manifest`: the parsed CloudFormation template
//! - `Value`: the closed HCL value model
//! - `Block` / `Configuration`: renderable Terraform blocks
//! - `Schema` / `SchemaProvider`: target resource schemas
//! - `naming` / `fuzzy`: name conversion and fuzzy matching helpers

pub mod block;
pub mod document;
pub mod error;
pub mod fuzzy;
pub mod naming;
pub mod schema;
pub mod value;

pub use block::{Argument, Block, BlockKind, Configuration, render_blocks};
pub use document::{Manifest, Section, SourceDocument};
pub use error::{CoreError, Result, SchemaError};
pub use schema::{CachedProvider, CatalogProvider, Schema, SchemaProvider};
pub use value::Value;
