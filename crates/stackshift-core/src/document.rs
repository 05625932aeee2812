//! CloudFormation source documents
//!
//! Templates are read from JSON or YAML into an order-preserving
//! [`serde_json::Value`] tree. YAML short-form function tags (`!Ref`,
//! `!Sub`, `!GetAtt`, ...) are expanded into their long form while loading,
//! so the rest of the pipeline only ever sees `{"Fn::Sub": ...}` maps.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Top-level keys a CloudFormation template may carry
pub const TOP_LEVEL_KEYS: &[&str] = &[
    "AWSTemplateFormatVersion",
    "Description",
    "Metadata",
    "Parameters",
    "Rules",
    "Mappings",
    "Conditions",
    "Transform",
    "Resources",
    "Outputs",
];

/// A parsed template, never mutated after loading
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    root: Map<String, JsonValue>,
}

impl SourceDocument {
    /// Load a template from disk, picking the parser from the extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::TemplateNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::parse(&content),
        }
    }

    /// Parse a template, sniffing JSON vs YAML
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('{') {
            Self::from_json(content)
        } else {
            Self::from_yaml(content)
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: YamlValue = serde_yaml::from_str(content)?;
        Self::from_value(yaml_to_json(value))
    }

    /// Wrap an already parsed tree
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(root) => {
                for key in root.keys() {
                    if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
                        tracing::warn!(key = %key, "ignoring unknown top-level template key");
                    }
                }
                Ok(Self { root })
            }
            other => Err(CoreError::InvalidTemplate {
                message: format!("expected a mapping at the top level, found {}", kind(&other)),
            }),
        }
    }

    /// A top-level section, if present
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.root.get(key)
    }

    pub fn description(&self) -> Option<&str> {
        self.root.get("Description").and_then(JsonValue::as_str)
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "a mapping",
    }
}

/// Convert a YAML tree to JSON, expanding short-form function tags
pub fn yaml_to_json(value: YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(items.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => JsonValue::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let inner = yaml_to_json(tagged.value);
            let key = match name {
                "Ref" | "Condition" => name.to_string(),
                _ => format!("Fn::{name}"),
            };
            let mut map = Map::new();
            map.insert(key, inner);
            JsonValue::Object(map)
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> JsonValue {
    if let Some(i) = n.as_i64() {
        JsonValue::from(i)
    } else if let Some(u) = n.as_u64() {
        JsonValue::from(u)
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(n.to_string()))
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// Template sections converted by the pipeline, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Parameters,
    Mappings,
    Conditions,
    Resources,
    Outputs,
}

impl Section {
    /// Processing order: later sections may reference earlier ones
    pub const ORDER: [Section; 5] = [
        Section::Parameters,
        Section::Mappings,
        Section::Conditions,
        Section::Resources,
        Section::Outputs,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Parameters => "Parameters",
            Self::Mappings => "Mappings",
            Self::Conditions => "Conditions",
            Self::Resources => "Resources",
            Self::Outputs => "Outputs",
        }
    }
}

/// Ordered (logical id, raw value) pairs for each section
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    sections: IndexMap<Section, Vec<(String, JsonValue)>>,
}

impl Manifest {
    /// Build the manifest, validating the structure the converter relies on
    pub fn build(document: &SourceDocument) -> Result<Self> {
        if document.get("Transform").is_some() {
            return Err(CoreError::UnsupportedConstruct {
                construct: "Transform".to_string(),
            });
        }

        if document.get(Section::Resources.key()).is_none() {
            return Err(CoreError::MissingSection {
                section: Section::Resources.key().to_string(),
            });
        }

        let mut sections = IndexMap::new();
        for section in Section::ORDER {
            let entries = match document.get(section.key()) {
                None | Some(JsonValue::Null) => Vec::new(),
                Some(JsonValue::Object(map)) => map
                    .iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect(),
                Some(_) => {
                    return Err(CoreError::InvalidTemplate {
                        message: format!("'{}' must be a mapping", section.key()),
                    });
                }
            };
            sections.insert(section, entries);
        }

        let manifest = Self { sections };
        for (logical_id, _) in manifest.entries(Section::Resources) {
            if manifest.resource_type(logical_id).is_none() {
                return Err(CoreError::MissingType {
                    logical_id: logical_id.clone(),
                });
            }
        }

        Ok(manifest)
    }

    /// Entries of a section in declaration order
    pub fn entries(&self, section: Section) -> &[(String, JsonValue)] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, section: Section, logical_id: &str) -> Option<&JsonValue> {
        self.entries(section)
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, section: Section, logical_id: &str) -> bool {
        self.get(section, logical_id).is_some()
    }

    /// The `Type` of a resource
    pub fn resource_type(&self, logical_id: &str) -> Option<&str> {
        self.get(Section::Resources, logical_id)?
            .get("Type")?
            .as_str()
    }

    /// The `Condition` guarding a resource, if any
    pub fn resource_condition(&self, logical_id: &str) -> Option<&str> {
        self.get(Section::Resources, logical_id)?
            .get("Condition")?
            .as_str()
    }
}
