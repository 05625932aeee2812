//! Argument overrides
//!
//! Some properties need more than a rename to become valid arguments. These
//! transforms run on resolved properties, before name mapping. Each one does
//! nothing when its property is absent.

use indexmap::IndexMap;
use phf::phf_map;
use stackshift_core::Value;

use crate::mapper::property_comment;

/// Canned ACL names. `None` marks grants with no canned equivalent.
static CANNED_ACLS: phf::Map<&'static str, Option<&'static str>> = phf_map! {
    "Private" => Some("private"),
    "PublicRead" => Some("public-read"),
    "PublicReadWrite" => Some("public-read-write"),
    "AuthenticatedRead" => Some("authenticated-read"),
    "LogDeliveryWrite" => Some("log-delivery-write"),
    "AwsExecRead" => Some("aws-exec-read"),
    "BucketOwnerRead" => None,
    "BucketOwnerFullControl" => None,
};

/// Properties after overrides, plus the names that fell back to a comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overridden {
    pub properties: IndexMap<String, Value>,
    pub downgraded: Vec<String>,
}

/// Apply the overrides for `tf_type` and the global ones
pub fn apply(tf_type: &str, properties: IndexMap<String, Value>) -> Overridden {
    let mut out = Overridden {
        properties,
        downgraded: Vec::new(),
    };

    match tf_type {
        "aws_s3_bucket" => access_control(&mut out),
        "aws_s3_bucket_policy" | "aws_iam_policy" => json_encode(&mut out, "PolicyDocument"),
        "aws_iam_role" => json_encode(&mut out, "AssumeRolePolicyDocument"),
        _ => {}
    }
    tags(&mut out);

    out
}

/// Replace `from` with `to` in place
fn rename(properties: &mut IndexMap<String, Value>, from: &str, to: &str, value: Value) {
    let Some(index) = properties.get_index_of(from) else {
        return;
    };
    properties.shift_remove_index(index);
    properties.shift_insert(index, to.to_string(), value);
}

fn access_control(out: &mut Overridden) {
    let Some(value) = out.properties.get("AccessControl") else {
        return;
    };

    let acl = match value {
        Value::Str(name) => match CANNED_ACLS.get(name.as_str()) {
            Some(Some(canned)) => Value::str(*canned),
            Some(None) => Value::Null,
            None => {
                tracing::debug!(acl = %name, "unknown canned ACL");
                out.downgraded.push("AccessControl".to_string());
                property_comment("AccessControl", value)
            }
        },
        Value::Literal(_) => value.clone(),
        other => {
            out.downgraded.push("AccessControl".to_string());
            property_comment("AccessControl", other)
        }
    };

    rename(&mut out.properties, "AccessControl", "acl", acl);
}

fn json_encode(out: &mut Overridden, property: &str) {
    if let Some(value) = out.properties.get_mut(property) {
        if matches!(value, Value::Map(_) | Value::List(_)) {
            *value = Value::literal(format!("jsonencode({})", value.render(2)));
        }
    }
}

fn tags(out: &mut Overridden) {
    let Some(value) = out.properties.get("Tags") else {
        return;
    };

    let tags = match value {
        Value::Map(_) | Value::Literal(_) => Some(value.clone()),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Map(pair) => match (pair.get("Key"), pair.get("Value")) {
                    (Some(Value::Str(key)), Some(value)) if pair.len() == 2 => {
                        Some((key.clone(), value.clone()))
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect::<Option<IndexMap<String, Value>>>()
            .map(Value::Map),
        _ => None,
    };

    let tags = tags.unwrap_or_else(|| {
        out.downgraded.push("Tags".to_string());
        property_comment("Tags", value)
    });
    rename(&mut out.properties, "Tags", "tags", tags);
}
