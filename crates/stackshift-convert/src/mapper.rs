//! Property mapper
//!
//! Maps resolved CloudFormation property names onto the argument names of the
//! target schema. Names are compared as words (`BucketName` against
//! `bucket name`); an exact hit wins outright, otherwise the best fuzzy score
//! above the cutoff is taken. Map values whose argument is a documented
//! section become nested blocks, lists of maps become repeated blocks.

use indexmap::IndexMap;
use stackshift_core::fuzzy::{self, normalize};
use stackshift_core::naming::camel_case_split;
use stackshift_core::{Argument, Block, Schema, Value};

use crate::resolver::DEFAULT_MATCH_CUTOFF;

/// Minimum score for an argument to be treated as a nested block section
pub const DEFAULT_SECTION_CUTOFF: u8 = 95;

/// Comment text kept in place of a property that could not be converted
pub fn property_comment(name: &str, value: &Value) -> Value {
    let raw = serde_json::to_string(&value.to_json()).unwrap_or_default();
    Value::comment(format!("CF Property({name}) = {raw}"))
}

/// Result of mapping one property map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedArguments {
    /// Arguments in source order
    pub arguments: IndexMap<String, Argument>,
    /// Property paths (`Logging.Prefix`) that kept a comment instead
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyMapper {
    match_cutoff: u8,
    section_cutoff: u8,
}

impl Default for PropertyMapper {
    fn default() -> Self {
        Self {
            match_cutoff: DEFAULT_MATCH_CUTOFF,
            section_cutoff: DEFAULT_SECTION_CUTOFF,
        }
    }
}

impl PropertyMapper {
    pub fn new(match_cutoff: u8, section_cutoff: u8) -> Self {
        Self {
            match_cutoff,
            section_cutoff,
        }
    }

    /// Best candidate for a source name, with its score
    pub fn match_name<'c>(&self, source: &str, candidates: &'c [String]) -> Option<(&'c str, u8)> {
        match_name(source, candidates, self.match_cutoff)
    }

    /// Map a resource's resolved properties onto its schema
    pub fn map(&self, schema: &Schema, properties: IndexMap<String, Value>) -> MappedArguments {
        let mut mapped = MappedArguments::default();
        let candidates = candidates(schema);
        self.map_into(schema, &candidates, properties, "", &mut mapped);
        mapped
    }

    fn map_into(
        &self,
        schema: &Schema,
        candidates: &[String],
        properties: IndexMap<String, Value>,
        path: &str,
        mapped: &mut MappedArguments,
    ) {
        for (name, value) in properties {
            let full_name = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };

            // Failed resolutions are already comments; keep them in place
            if value.is_comment() {
                mapped.arguments.insert(full_name, Argument::Value(value));
                continue;
            }

            let Some((argument, _)) = self.match_name(&name, candidates) else {
                tracing::debug!(property = %full_name, "no matching argument");
                mapped
                    .arguments
                    .insert(full_name.clone(), property_comment(&name, &value).into());
                mapped.unmatched.push(full_name);
                continue;
            };

            if mapped.arguments.contains_key(argument) {
                tracing::debug!(property = %full_name, argument, "argument already set");
                mapped
                    .arguments
                    .insert(full_name.clone(), property_comment(&name, &value).into());
                mapped.unmatched.push(full_name);
                continue;
            }

            let converted = match (self.section(schema, argument), value) {
                (Some(section), Value::Map(fields)) => {
                    Argument::Block(self.nested(schema, section, fields, &full_name, mapped))
                }
                (Some(section), Value::List(items)) if items.iter().any(|i| matches!(i, Value::Map(_))) => {
                    let blocks = items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| match item {
                            Value::Map(fields) => Argument::Block(self.nested(
                                schema,
                                section,
                                fields,
                                &full_name,
                                mapped,
                            )),
                            other => {
                                mapped.unmatched.push(format!("{full_name}[{index}]"));
                                Argument::Value(property_comment(&name, &other))
                            }
                        })
                        .collect();
                    Argument::Blocks(blocks)
                }
                (_, value) => Argument::Value(value),
            };
            mapped.arguments.insert(argument.to_string(), converted);
        }
    }

    /// The section name when `argument` is a documented nested block
    fn section<'s>(&self, schema: &'s Schema, argument: &str) -> Option<&'s str> {
        let names: Vec<&str> = schema.section_names().collect();
        let relaxed: Vec<String> = names.iter().map(|n| n.replace('_', " ")).collect();
        fuzzy::extract_one(
            &argument.replace('_', " "),
            relaxed.iter().map(String::as_str),
            self.section_cutoff,
        )
        .map(|found| names[found.index])
    }

    fn nested(
        &self,
        schema: &Schema,
        section: &str,
        fields: IndexMap<String, Value>,
        path: &str,
        mapped: &mut MappedArguments,
    ) -> Block {
        let arguments = schema.section(section).unwrap_or_default();

        let mut inner = MappedArguments::default();
        self.map_into(schema, arguments, fields, path, &mut inner);
        mapped.unmatched.append(&mut inner.unmatched);

        let mut block = Block::nested(section);
        block.arguments = inner.arguments;
        block
    }
}

/// Top-level arguments plus any section the catalog lists only as a section
fn candidates(schema: &Schema) -> Vec<String> {
    let mut all = schema.arguments.clone();
    for section in schema.section_names() {
        if !all.iter().any(|a| a == section) {
            all.push(section.to_string());
        }
    }
    all
}

fn compact(name: &str) -> String {
    normalize(name).replace(' ', "")
}

/// Match a source name against candidate argument names
pub fn match_name<'c>(source: &str, candidates: &'c [String], cutoff: u8) -> Option<(&'c str, u8)> {
    let words = camel_case_split(source);

    let exact = compact(&words);
    if let Some(hit) = candidates.iter().find(|c| compact(c) == exact) {
        return Some((hit.as_str(), 100));
    }

    let relaxed: Vec<String> = candidates.iter().map(|c| c.replace('_', " ")).collect();
    fuzzy::extract_one(&words, relaxed.iter().map(String::as_str), cutoff)
        .map(|found| (candidates[found.index].as_str(), found.score))
}
