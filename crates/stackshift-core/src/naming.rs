//! Name conversions between CloudFormation and Terraform conventions

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Convert a PascalCase logical id to a snake_case Terraform name.
///
/// `MyS3Bucket` becomes `my_s3_bucket`, `VPCId` becomes `vpc_id`.
pub fn pascal_to_snake(name: &str) -> String {
    let name = WORD_START.replace_all(name, "${1}_${2}");
    let name = LOWER_UPPER.replace_all(&name, "${1}_${2}");
    name.to_lowercase()
}

/// Split a PascalCase property name into space separated words.
///
/// Acronyms stay together (`VPCId` -> `VPC Id`) and digits stick to the
/// word they follow (`Ipv6CidrBlock` -> `Ipv6 Cidr Block`).
pub fn camel_case_split(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.join(" ")
}

/// Make a string safe to use as a Terraform identifier
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    while out.contains("__") {
        out = out.replace("__", "_");
    }
    let out = out.trim_matches('_').to_string();

    match out.chars().next() {
        None => "unnamed".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{out}"),
        Some(_) => out,
    }
}
