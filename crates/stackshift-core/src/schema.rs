//! Target resource schemas
//!
//! A [`Schema`] lists the argument names, attribute names and nested
//! sections of one Terraform resource type. Schemas come from a
//! [`SchemaProvider`]; the bundled [`CatalogProvider`] reads a pre-extracted
//! catalog file, and [`CachedProvider`] memoizes any provider.
//!
//! Catalog format (YAML or JSON):
//!
//! ```yaml
//! aws_s3_bucket:
//!   cfnType: AWS::S3::Bucket      # optional, pins the match
//!   arguments: [bucket, acl, tags, versioning]
//!   attributes: [id, arn, bucket_domain_name]
//!   sections:
//!     versioning: [enabled, mfa_delete]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::{Result, SchemaError};
use crate::fuzzy;
use crate::naming::camel_case_split;

/// Minimum token-sort score for a catalog type to match a CloudFormation type
pub const DEFAULT_TYPE_CUTOFF: u8 = 60;

/// Read-only description of a target resource type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Terraform type name, e.g. `aws_s3_bucket`
    pub resource_type: String,
    /// Known argument names, in documentation order
    pub arguments: Vec<String>,
    /// Exported attribute names, in documentation order
    pub attributes: Vec<String>,
    /// Nested block sections and their argument names
    pub sections: IndexMap<String, Vec<String>>,
}

impl Schema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_section<I, S>(mut self, name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .insert(name.into(), arguments.into_iter().map(Into::into).collect());
        self
    }

    /// Argument names of a nested section, if documented
    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    /// Names of all documented sections
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Resolves a CloudFormation type name to a target schema
pub trait SchemaProvider {
    fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError>;
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for Rc<P> {
    fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError> {
        (**self).find(cfn_type)
    }
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for Box<P> {
    fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError> {
        (**self).find(cfn_type)
    }
}

// =============================================================================
// CATALOG PROVIDER
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    #[serde(default)]
    cfn_type: Option<String>,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    attributes: Vec<String>,
    #[serde(default)]
    sections: IndexMap<String, Vec<String>>,
}

/// Schema provider backed by a catalog file
#[derive(Debug, Clone, Default)]
pub struct CatalogProvider {
    schemas: Vec<Rc<Schema>>,
    /// Search key for each schema (`aws_s3_bucket` -> `s3 bucket`)
    search_names: Vec<String>,
    /// Explicit CloudFormation type pins
    pinned: HashMap<String, usize>,
    cutoff: u8,
}

impl CatalogProvider {
    /// Build a provider from schemas already in memory
    pub fn new(schemas: impl IntoIterator<Item = Schema>) -> Self {
        let mut provider = Self {
            cutoff: DEFAULT_TYPE_CUTOFF,
            ..Self::default()
        };
        for schema in schemas {
            provider.push(schema, None);
        }
        provider
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a YAML (or JSON) catalog
    pub fn parse(content: &str) -> Result<Self> {
        let entries: IndexMap<String, CatalogEntry> = serde_yaml::from_str(content)?;
        if entries.is_empty() {
            return Err(SchemaError::InvalidCatalog {
                message: "catalog contains no resource types".to_string(),
            }
            .into());
        }

        let mut provider = Self {
            cutoff: DEFAULT_TYPE_CUTOFF,
            ..Self::default()
        };
        for (name, entry) in entries {
            let schema = Schema {
                resource_type: name,
                arguments: entry.arguments,
                attributes: entry.attributes,
                sections: entry.sections,
            };
            provider.push(schema, entry.cfn_type);
        }

        tracing::debug!(types = provider.len(), "loaded schema catalog");
        Ok(provider)
    }

    /// Minimum score for a fuzzy type match
    pub fn with_cutoff(mut self, cutoff: u8) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn push(&mut self, schema: Schema, cfn_type: Option<String>) {
        let index = self.schemas.len();
        if let Some(cfn_type) = cfn_type {
            self.pinned.insert(cfn_type, index);
        }
        let search = schema.resource_type.trim_start_matches("aws_").replace('_', " ");
        self.search_names.push(search);
        self.schemas.push(Rc::new(schema));
    }
}

/// Turn `AWS::EC2::SecurityGroup` into the search key `ec2 security group`
fn cfn_search_key(cfn_type: &str) -> String {
    cfn_type
        .split("::")
        .filter(|part| !part.eq_ignore_ascii_case("aws"))
        .map(camel_case_split)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl SchemaProvider for CatalogProvider {
    fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError> {
        if let Some(&index) = self.pinned.get(cfn_type) {
            return Ok(Rc::clone(&self.schemas[index]));
        }

        let key = cfn_search_key(cfn_type);
        let found = fuzzy::extract_one_with(
            &key,
            self.search_names.iter().map(String::as_str),
            self.cutoff,
            fuzzy::token_sort_ratio,
        )
        .ok_or_else(|| SchemaError::NotFound {
            cfn_type: cfn_type.to_string(),
        })?;

        tracing::debug!(
            cfn_type,
            tf_type = %self.schemas[found.index].resource_type,
            score = found.score,
            "matched resource type"
        );
        Ok(Rc::clone(&self.schemas[found.index]))
    }
}

// =============================================================================
// CACHED PROVIDER
// =============================================================================

/// Memoizes lookups of an inner provider, failures included
pub struct CachedProvider<P> {
    inner: P,
    cache: RefCell<HashMap<String, std::result::Result<Rc<Schema>, SchemaError>>>,
}

impl<P: SchemaProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct types looked up so far
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<P: SchemaProvider> SchemaProvider for CachedProvider<P> {
    fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError> {
        if let Some(hit) = self.cache.borrow().get(cfn_type) {
            return hit.clone();
        }
        let result = self.inner.find(cfn_type);
        self.cache
            .borrow_mut()
            .insert(cfn_type.to_string(), result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const CATALOG: &str = r#"
aws_s3_bucket:
  arguments: [bucket, acl, tags, versioning]
  attributes: [id, arn]
  sections:
    versioning: [enabled, mfa_delete]
aws_s3_bucket_policy:
  arguments: [bucket, policy]
  attributes: [id]
aws_security_group:
  arguments: [name, description, ingress, egress, vpc_id, tags]
  attributes: [id, arn]
aws_instance:
  cfnType: AWS::EC2::Instance
  arguments: [ami, instance_type]
  attributes: [id, arn, private_ip]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = CatalogProvider::parse(CATALOG).unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_find_by_fuzzy_name() {
        let catalog = CatalogProvider::parse(CATALOG).unwrap();

        let schema = catalog.find("AWS::S3::Bucket").unwrap();
        assert_eq!(schema.resource_type, "aws_s3_bucket");
        assert_eq!(schema.section("versioning").unwrap(), ["enabled", "mfa_delete"]);

        let schema = catalog.find("AWS::S3::BucketPolicy").unwrap();
        assert_eq!(schema.resource_type, "aws_s3_bucket_policy");

        let schema = catalog.find("AWS::EC2::SecurityGroup").unwrap();
        assert_eq!(schema.resource_type, "aws_security_group");
    }

    #[test]
    fn test_find_pinned() {
        let catalog = CatalogProvider::parse(CATALOG).unwrap();
        let schema = catalog.find("AWS::EC2::Instance").unwrap();
        assert_eq!(schema.resource_type, "aws_instance");
    }

    #[test]
    fn test_find_unknown() {
        let catalog = CatalogProvider::parse(CATALOG).unwrap();
        let err = catalog.find("AWS::Lambda::Function").unwrap_err();
        assert_eq!(
            err,
            SchemaError::NotFound {
                cfn_type: "AWS::Lambda::Function".to_string()
            }
        );
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(CatalogProvider::parse("{}").is_err());
    }

    #[test]
    fn test_search_key() {
        assert_eq!(cfn_search_key("AWS::EC2::SecurityGroup"), "ec2 security group");
        assert_eq!(cfn_search_key("AWS::S3::Bucket"), "s3 bucket");
    }

    struct CountingProvider {
        calls: Cell<usize>,
    }

    impl SchemaProvider for CountingProvider {
        fn find(&self, cfn_type: &str) -> std::result::Result<Rc<Schema>, SchemaError> {
            self.calls.set(self.calls.get() + 1);
            if cfn_type == "AWS::Missing::Thing" {
                return Err(SchemaError::NotFound {
                    cfn_type: cfn_type.to_string(),
                });
            }
            Ok(Rc::new(Schema::new("aws_thing")))
        }
    }

    #[test]
    fn test_cached_provider_memoizes() {
        let cached = CachedProvider::new(CountingProvider { calls: Cell::new(0) });

        let first = cached.find("AWS::Some::Thing").unwrap();
        let second = cached.find("AWS::Some::Thing").unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        assert!(cached.find("AWS::Missing::Thing").is_err());
        assert!(cached.find("AWS::Missing::Thing").is_err());

        assert_eq!(cached.inner.calls.get(), 2);
        assert_eq!(cached.cached(), 2);
    }
}
