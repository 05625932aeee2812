//! Template converter
//!
//! Drives the sections of a template in a fixed order (parameters, mappings,
//! conditions, resources, outputs) so every section can reference what came
//! before it. Failures below the resource level are kept in the output as
//! comments and reported as warnings; only structural errors abort.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use stackshift_core::naming::pascal_to_snake;
use stackshift_core::{
    Block, CachedProvider, Configuration, Manifest, Schema, SchemaProvider, Section,
    SourceDocument, Value,
};

use crate::auxiliary::AuxLog;
use crate::error::{ConversionWarning, ConvertError, Result, WarningCategory, WarningSeverity};
use crate::functions::grouped;
use crate::intrinsic::{CONDITION_FUNCTIONS, Intrinsic, PROPERTY_FUNCTIONS};
use crate::mapper::{DEFAULT_SECTION_CUTOFF, PropertyMapper, property_comment};
use crate::overrides;
use crate::resolver::{DEFAULT_MATCH_CUTOFF, Resolver, count_expression};

/// Resource attributes with no Terraform equivalent, kept as comments
const PRESERVED_ATTRIBUTES: &[&str] = &[
    "DeletionPolicy",
    "UpdateReplacePolicy",
    "UpdatePolicy",
    "CreationPolicy",
    "Metadata",
];

/// Options for the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Minimum score for property and attribute name matches
    pub match_cutoff: u8,
    /// Minimum score for an argument to become a nested block
    pub section_cutoff: u8,
    /// Fail instead of keeping unconvertible constructs as comments
    pub strict: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            match_cutoff: DEFAULT_MATCH_CUTOFF,
            section_cutoff: DEFAULT_SECTION_CUTOFF,
            strict: false,
        }
    }
}

/// Result of a conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The converted configuration
    pub configuration: Configuration,
    /// Warnings generated during conversion
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionResult {
    /// Warnings that need attention (anything above info)
    pub fn actionable(&self) -> impl Iterator<Item = &ConversionWarning> {
        self.warnings
            .iter()
            .filter(|w| w.severity > WarningSeverity::Info)
    }
}

/// Converts CloudFormation templates against a schema provider
pub struct Converter<P: SchemaProvider> {
    schemas: CachedProvider<P>,
    options: ConvertOptions,
}

impl<P: SchemaProvider> Converter<P> {
    pub fn new(provider: P, options: ConvertOptions) -> Self {
        Self {
            schemas: CachedProvider::new(provider),
            options,
        }
    }

    /// Convert a parsed template
    pub fn convert(&self, document: &SourceDocument) -> Result<ConversionResult> {
        let manifest = Manifest::build(document)?;
        tracing::info!(
            resources = manifest.entries(Section::Resources).len(),
            "converting template"
        );

        let mut session = Session {
            manifest: &manifest,
            schemas: &self.schemas,
            options: self.options,
            mapper: PropertyMapper::new(self.options.match_cutoff, self.options.section_cutoff),
            aux: AuxLog::new(),
            blocks: Vec::new(),
            warnings: Vec::new(),
        };

        session.parameters();
        session.mappings();
        session.conditions()?;
        session.resources()?;
        session.outputs()?;

        let result = ConversionResult {
            configuration: Configuration::assemble(session.aux.into_blocks(), session.blocks),
            warnings: session.warnings,
        };

        if self.options.strict {
            let rejected: Vec<ConversionWarning> = result.actionable().cloned().collect();
            if !rejected.is_empty() {
                return Err(ConvertError::Strict {
                    count: rejected.len(),
                    warnings: rejected,
                });
            }
        }

        tracing::debug!(
            blocks = result.configuration.len(),
            warnings = result.warnings.len(),
            "conversion finished"
        );
        Ok(result)
    }
}

/// State for converting one template
struct Session<'a> {
    manifest: &'a Manifest,
    schemas: &'a dyn SchemaProvider,
    options: ConvertOptions,
    mapper: PropertyMapper,
    aux: AuxLog,
    blocks: Vec<Block>,
    warnings: Vec<ConversionWarning>,
}

impl Session<'_> {
    fn resolver(&mut self) -> Resolver<'_> {
        Resolver::new(self.manifest, self.schemas, &mut self.aux)
            .with_match_cutoff(self.options.match_cutoff)
    }

    /// Resolve one value, downgrading recoverable failures to a comment
    fn resolve(
        &mut self,
        section: Section,
        logical_id: &str,
        name: &str,
        raw: &JsonValue,
        allowed: &[Intrinsic],
    ) -> Result<Value> {
        let resolved = self.resolver().resolve(raw, allowed);
        match resolved {
            Ok(value) => Ok(value),
            Err(source) if source.is_structural() => Err(ConvertError::Structural {
                logical_id: logical_id.to_string(),
                source,
            }),
            Err(err) => {
                tracing::debug!(logical_id, property = name, error = %err, "keeping value as comment");
                self.warnings.push(ConversionWarning::from_resolve(
                    section.key(),
                    logical_id,
                    name,
                    &err,
                ));
                Ok(property_comment(name, &Value::from_json(raw)))
            }
        }
    }

    // =========================================================================
    // PARAMETERS
    // =========================================================================

    fn parameters(&mut self) {
        let manifest = self.manifest;
        for (logical_id, raw) in manifest.entries(Section::Parameters) {
            tracing::debug!(logical_id = %logical_id, "converting parameter");
            self.blocks.push(variable(logical_id, raw));
        }
    }

    // =========================================================================
    // MAPPINGS AND CONDITIONS
    // =========================================================================

    fn mappings(&mut self) {
        let manifest = self.manifest;
        for (logical_id, raw) in manifest.entries(Section::Mappings) {
            self.aux.locals_mut().set(logical_id.clone(), Value::from_json(raw));
        }
    }

    fn conditions(&mut self) -> Result<()> {
        let manifest = self.manifest;
        for (logical_id, raw) in manifest.entries(Section::Conditions) {
            let value = self.resolve(
                Section::Conditions,
                logical_id,
                logical_id,
                raw,
                CONDITION_FUNCTIONS,
            )?;
            self.aux.locals_mut().set(logical_id.clone(), value);
        }
        Ok(())
    }

    // =========================================================================
    // RESOURCES
    // =========================================================================

    fn resources(&mut self) -> Result<()> {
        let manifest = self.manifest;
        for (logical_id, raw) in manifest.entries(Section::Resources) {
            let cfn_type = manifest.resource_type(logical_id).unwrap_or_default();

            let schema = match self.schemas.find(cfn_type) {
                Ok(schema) => schema,
                Err(err) => {
                    tracing::warn!(logical_id = %logical_id, cfn_type, "skipping resource: {err}");
                    self.warnings.push(
                        ConversionWarning::error(
                            Section::Resources.key(),
                            logical_id,
                            cfn_type,
                            &format!("Resource skipped: {err}"),
                        )
                        .with_category(WarningCategory::Schema)
                        .with_suggestion("Add the Terraform type to the schema catalog"),
                    );
                    continue;
                }
            };

            tracing::debug!(logical_id = %logical_id, tf_type = %schema.resource_type, "converting resource");
            let block = self.resource(logical_id, raw, &schema)?;
            self.blocks.push(block);
        }
        Ok(())
    }

    fn resource(&mut self, logical_id: &str, raw: &JsonValue, schema: &Schema) -> Result<Block> {
        let manifest = self.manifest;
        let section = Section::Resources.key();
        let mut block = Block::resource(schema, pascal_to_snake(logical_id));

        if let Some(condition) = manifest.resource_condition(logical_id) {
            if !manifest.contains(Section::Conditions, condition) {
                self.warnings.push(
                    ConversionWarning::warning(
                        section,
                        logical_id,
                        "Condition",
                        &format!("Condition '{condition}' is not declared"),
                    )
                    .with_category(WarningCategory::Expression),
                );
            }
            block.set("count", count_expression(condition));
        }

        let mut properties = IndexMap::new();
        if let Some(JsonValue::Object(raw_properties)) = raw.get("Properties") {
            for (name, value) in raw_properties {
                let value =
                    self.resolve(Section::Resources, logical_id, name, value, PROPERTY_FUNCTIONS)?;
                properties.insert(name.clone(), value);
            }
        }

        let overridden = overrides::apply(&schema.resource_type, properties);
        for name in &overridden.downgraded {
            self.warnings.push(ConversionWarning::warning(
                section,
                logical_id,
                name,
                &format!("{name} has no {} equivalent", schema.resource_type),
            ));
        }

        let mapped = self.mapper.map(schema, overridden.properties);
        for path in &mapped.unmatched {
            self.warnings.push(
                ConversionWarning::warning(
                    section,
                    logical_id,
                    path,
                    &format!("No matching argument on {} for {path}", schema.resource_type),
                )
                .with_suggestion("Check the kept comment and set the argument by hand"),
            );
        }
        for (name, argument) in mapped.arguments {
            block.set(name, argument);
        }

        if let Some(depends_on) = raw.get("DependsOn") {
            let depends_on = self.depends_on(logical_id, depends_on);
            if !depends_on.is_empty() {
                block.set("depends_on", Value::List(depends_on));
            }
        }

        for attribute in PRESERVED_ATTRIBUTES {
            if let Some(value) = raw.get(*attribute) {
                block.set(*attribute, preserved_comment(attribute, value));
                self.warnings.push(ConversionWarning::info(
                    section,
                    logical_id,
                    attribute,
                    &format!("{attribute} kept as a comment"),
                ));
            }
        }

        Ok(block)
    }

    fn depends_on(&mut self, logical_id: &str, raw: &JsonValue) -> Vec<Value> {
        let names: Vec<&str> = match raw {
            JsonValue::String(name) => vec![name.as_str()],
            JsonValue::Array(items) => items.iter().filter_map(JsonValue::as_str).collect(),
            _ => Vec::new(),
        };

        let mut references = Vec::new();
        for name in names {
            let block = self.resolver().resource_block(name);
            match block {
                Ok(block) => references.push(Value::literal(block.base_ref())),
                Err(err) => self.warnings.push(ConversionWarning::from_resolve(
                    Section::Resources.key(),
                    logical_id,
                    "DependsOn",
                    &err,
                )),
            }
        }
        references
    }

    // =========================================================================
    // OUTPUTS
    // =========================================================================

    fn outputs(&mut self) -> Result<()> {
        let manifest = self.manifest;
        let section = Section::Outputs.key();
        for (logical_id, raw) in manifest.entries(Section::Outputs) {
            let mut block = Block::output(pascal_to_snake(logical_id));

            if let Some(description) = raw.get("Description").and_then(JsonValue::as_str) {
                block.set("description", Value::str(description));
            }

            let value = match raw.get("Value") {
                Some(value) => {
                    self.resolve(Section::Outputs, logical_id, "Value", value, PROPERTY_FUNCTIONS)?
                }
                None => {
                    self.warnings.push(ConversionWarning::error(
                        section,
                        logical_id,
                        "Value",
                        "Output has no Value",
                    ));
                    Value::Null
                }
            };

            if value.is_comment() {
                block.set("CF Value", value);
                block.set("value", Value::Null);
            } else if let Some(condition) = raw.get("Condition").and_then(JsonValue::as_str) {
                block.set(
                    "value",
                    Value::literal(format!(
                        "local.{condition} ? {} : null",
                        grouped(&value)
                    )),
                );
            } else {
                block.set("value", value);
            }

            if let Some(export) = raw.get("Export") {
                block.set("Export", preserved_comment("Export", export));
                self.warnings.push(
                    ConversionWarning::info(section, logical_id, "Export", "Export kept as a comment")
                        .with_suggestion("Consumers should read this output through remote state"),
                );
            }

            self.blocks.push(block);
        }
        Ok(())
    }
}

fn preserved_comment(name: &str, raw: &JsonValue) -> Value {
    Value::comment(format!("CF {name} = {raw}"))
}

// =============================================================================
// VARIABLES
// =============================================================================

/// Terraform type constraint for a CloudFormation parameter type
pub fn variable_type(cfn_type: &str) -> &'static str {
    match cfn_type {
        "Number" => "number",
        "List<Number>" => "list(number)",
        "CommaDelimitedList" => "list(string)",
        t if t.starts_with("List<") => "list(string)",
        _ => "string",
    }
}

fn variable(logical_id: &str, raw: &JsonValue) -> Block {
    let name = pascal_to_snake(logical_id);
    let tf_type = variable_type(raw.get("Type").and_then(JsonValue::as_str).unwrap_or("String"));
    let is_list = tf_type.starts_with("list");
    let is_number = tf_type.ends_with("number)") || tf_type == "number";

    let scalar = |text: &str| -> Value {
        match serde_json::from_str::<serde_json::Number>(text.trim()) {
            Ok(number) if is_number => Value::Num(number),
            _ => Value::str(text.trim()),
        }
    };

    let mut block = Block::variable(&name);

    if let Some(description) = raw.get("Description").and_then(JsonValue::as_str) {
        block.set("description", Value::str(description));
    }
    block.set("type", Value::literal(tf_type));

    if let Some(default) = raw.get("Default") {
        let default = match default {
            JsonValue::String(text) if is_list => {
                Value::List(text.split(',').map(|item| scalar(item)).collect())
            }
            JsonValue::String(text) => scalar(text),
            other => Value::from_json(other),
        };
        block.set("default", default);
    }

    let no_echo = match raw.get("NoEcho") {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if no_echo {
        block.set("sensitive", Value::Bool(true));
    }

    if let Some(JsonValue::Array(allowed)) = raw.get("AllowedValues") {
        let allowed: Vec<Value> = allowed
            .iter()
            .map(|item| match item {
                JsonValue::String(text) => scalar(text),
                other => Value::from_json(other),
            })
            .collect();
        let choices = Value::List(allowed.clone()).render_inline();
        let condition = if is_list {
            format!("alltrue([for v in var.{name} : contains({choices}, v)])")
        } else {
            format!("contains({choices}, var.{name})")
        };
        let listed: Vec<String> = allowed
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.render_inline()))
            .collect();

        block.set(
            "validation",
            Block::nested("validation")
                .with("condition", Value::literal(condition))
                .with(
                    "error_message",
                    Value::str(format!("{} must be one of: {}.", name, listed.join(", "))),
                ),
        );
    }

    block
}

// =============================================================================
// Public API
// =============================================================================

/// Quick convert function
pub fn convert<P: SchemaProvider>(document: &SourceDocument, provider: P) -> Result<ConversionResult> {
    Converter::new(provider, ConvertOptions::default()).convert(document)
}

/// Convert with options
pub fn convert_with_options<P: SchemaProvider>(
    document: &SourceDocument,
    provider: P,
    options: ConvertOptions,
) -> Result<ConversionResult> {
    Converter::new(provider, options).convert(document)
}
