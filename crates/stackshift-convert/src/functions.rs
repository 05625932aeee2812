//! Intrinsic function handlers
//!
//! Each handler receives its argument already resolved and returns the
//! Terraform expression for it.

use stackshift_core::naming::{pascal_to_snake, sanitize_identifier};
use stackshift_core::value::{escape_template, quote};
use stackshift_core::{Block, Section, Value};

use crate::error::{MapLevel, ResolveError};
use crate::intrinsic::Intrinsic;
use crate::resolver::{ResolveResult, Resolver};

/// Operand bounds for `Fn::And` / `Fn::Or`
const MIN_OPERANDS: usize = 2;
const MAX_OPERANDS: usize = 10;

/// Take a list argument of exactly `len` items
fn list_of(function: Intrinsic, argument: Value, len: usize, what: &str) -> ResolveResult<Vec<Value>> {
    match argument {
        Value::List(items) if items.len() == len => Ok(items),
        Value::List(_) => Err(ResolveError::shape(
            function,
            format!("the values must contain {what}"),
        )),
        _ => Err(ResolveError::shape(function, "the values must be a List")),
    }
}

/// An integer operand, which templates sometimes give as a string
fn integer(function: Intrinsic, value: &Value, what: &str) -> ResolveResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| ResolveError::shape(function, format!("{what} must be a Number")))
}

/// Render an operand inside a function call or operator expression
fn operand(value: &Value) -> String {
    value.render_inline()
}

/// Render an operand that sits next to an operator, parenthesized unless
/// it is a plain reference
pub(crate) fn grouped(value: &Value) -> String {
    let inner = operand(value);
    let atomic = inner
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '[' | ']'));
    match value {
        Value::Literal(_) if !atomic => format!("({inner})"),
        _ => inner,
    }
}

impl Resolver<'_> {
    // =========================================================================
    // CONDITIONS
    // =========================================================================

    fn declared_condition(&self, name: &str) -> ResolveResult<Value> {
        if !self.manifest.contains(Section::Conditions, name) {
            return Err(ResolveError::UnresolvedReference {
                name: name.to_string(),
            });
        }
        Ok(Value::literal(format!("local.{name}")))
    }

    pub(crate) fn condition(&mut self, argument: Value) -> ResolveResult<Value> {
        match argument {
            Value::Str(name) => self.declared_condition(&name),
            _ => Err(ResolveError::shape(
                Intrinsic::Condition,
                "the value must be a condition name",
            )),
        }
    }

    fn bool_list(&self, function: Intrinsic, argument: Value, combinator: &str) -> ResolveResult<Value> {
        let Value::List(items) = argument else {
            return Err(ResolveError::shape(function, "the values must be a List"));
        };
        if !(MIN_OPERANDS..=MAX_OPERANDS).contains(&items.len()) {
            return Err(ResolveError::shape(
                function,
                format!(
                    "the values must have between {MIN_OPERANDS} and {MAX_OPERANDS} conditions, found {}",
                    items.len()
                ),
            ));
        }
        let operands: Vec<String> = items.iter().map(operand).collect();
        Ok(Value::literal(format!("{combinator}([{}])", operands.join(", "))))
    }

    pub(crate) fn and(&mut self, argument: Value) -> ResolveResult<Value> {
        self.bool_list(Intrinsic::And, argument, "alltrue")
    }

    pub(crate) fn or(&mut self, argument: Value) -> ResolveResult<Value> {
        self.bool_list(Intrinsic::Or, argument, "anytrue")
    }

    pub(crate) fn not(&mut self, argument: Value) -> ResolveResult<Value> {
        let mut items = list_of(Intrinsic::Not, argument, 1, "exactly one condition")?;
        Ok(Value::literal(format!("!{}", grouped(&items.remove(0)))))
    }

    pub(crate) fn equals(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(Intrinsic::Equals, argument, 2, "exactly two values to compare")?;
        Ok(Value::literal(format!(
            "{} == {}",
            grouped(&items[0]),
            grouped(&items[1])
        )))
    }

    pub(crate) fn if_(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::If,
            argument,
            3,
            "a condition name, a value if true and a value if false",
        )?;
        let Value::Str(name) = &items[0] else {
            return Err(ResolveError::shape(
                Intrinsic::If,
                "the first value must be a condition name",
            ));
        };
        let condition = self.declared_condition(name)?;
        Ok(Value::literal(format!(
            "{} ? {} : {}",
            operand(&condition),
            grouped(&items[1]),
            grouped(&items[2])
        )))
    }

    // =========================================================================
    // STRINGS AND LISTS
    // =========================================================================

    pub(crate) fn join(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::Join,
            argument,
            2,
            "a delimiter and a list of items to join",
        )?;
        let Value::Str(delimiter) = &items[0] else {
            return Err(ResolveError::shape(
                Intrinsic::Join,
                "the delimiter must be a String",
            ));
        };
        match &items[1] {
            list @ (Value::List(_) | Value::Literal(_)) => Ok(Value::literal(format!(
                "join({}, {})",
                quote(delimiter),
                operand(list)
            ))),
            _ => Err(ResolveError::shape(
                Intrinsic::Join,
                "the items to join must be a List",
            )),
        }
    }

    pub(crate) fn select(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::Select,
            argument,
            2,
            "an index and a list of items to select from",
        )?;

        let index = match &items[0] {
            Value::Literal(expr) => expr.clone(),
            other => {
                let index = integer(Intrinsic::Select, other, "the index")?;
                if let Value::List(list) = &items[1] {
                    if index < 0 || index as usize >= list.len() {
                        return Err(ResolveError::IndexOutOfRange {
                            index,
                            len: list.len(),
                        });
                    }
                }
                index.to_string()
            }
        };

        match &items[1] {
            list @ (Value::List(_) | Value::Literal(_)) => Ok(Value::literal(format!(
                "element({}, {index})",
                operand(list)
            ))),
            _ => Err(ResolveError::shape(
                Intrinsic::Select,
                "the second value must be a List",
            )),
        }
    }

    pub(crate) fn split(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::Split,
            argument,
            2,
            "a delimiter and a String to split",
        )?;
        let Value::Str(delimiter) = &items[0] else {
            return Err(ResolveError::shape(
                Intrinsic::Split,
                "the delimiter must be a String",
            ));
        };
        match &items[1] {
            source @ (Value::Str(_) | Value::Literal(_)) => Ok(Value::literal(format!(
                "split({}, {})",
                quote(delimiter),
                operand(source)
            ))),
            _ => Err(ResolveError::shape(
                Intrinsic::Split,
                "the source must be a String",
            )),
        }
    }

    pub(crate) fn base64(&mut self, argument: Value) -> ResolveResult<Value> {
        match argument {
            value @ (Value::Str(_) | Value::Literal(_)) => Ok(Value::literal(format!(
                "base64encode({})",
                operand(&value)
            ))),
            _ => Err(ResolveError::shape(
                Intrinsic::Base64,
                "the value must be a String",
            )),
        }
    }

    /// `Fn::Sub`, string form or `[template, {variables}]`
    pub(crate) fn sub(&mut self, argument: Value) -> ResolveResult<Value> {
        let (template, variables) = match argument {
            Value::Str(template) => (template, indexmap::IndexMap::new()),
            Value::List(items) => match <[Value; 2]>::try_from(items) {
                Ok([Value::Str(template), Value::Map(variables)]) => (template, variables),
                _ => {
                    return Err(ResolveError::shape(
                        Intrinsic::Sub,
                        "the List must contain a template String and a Map of variables",
                    ));
                }
            },
            _ => {
                return Err(ResolveError::shape(
                    Intrinsic::Sub,
                    "the value must be a String or a List",
                ));
            }
        };

        let mut rendered = String::new();
        let mut interpolated = false;
        for token in tokenize(&template) {
            match token {
                SubToken::Text(text) => rendered.push_str(&escape_template(&text)),
                SubToken::Variable(name) => {
                    let value = match variables.get(&name) {
                        Some(value) => value.clone(),
                        None => self.sub_variable(&name)?,
                    };
                    if !matches!(value, Value::Str(_)) {
                        interpolated = true;
                    }
                    rendered.push_str(&value.to_template_part());
                }
            }
        }

        if interpolated {
            Ok(Value::literal(format!("\"{rendered}\"")))
        } else {
            Ok(Value::Str(unescape_plain(&template, &variables)))
        }
    }

    fn sub_variable(&mut self, name: &str) -> ResolveResult<Value> {
        match name.split_once('.') {
            Some((resource, attribute)) if !name.starts_with("AWS::") => {
                self.attribute_reference(resource, attribute)
            }
            _ => self.ref_name(name),
        }
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub(crate) fn find_in_map(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::FindInMap,
            argument,
            3,
            "a map name, a top-level key and a second-level key",
        )?;

        let found = self.aux.locals().count();
        if found != 1 {
            return Err(ResolveError::MissingLocals { found });
        }

        let Value::Str(map_name) = &items[0] else {
            return Err(ResolveError::shape(
                Intrinsic::FindInMap,
                "the map name must be a String",
            ));
        };

        let missing = |level: MapLevel, key: &str| ResolveError::MissingMapKey {
            level,
            key: key.to_string(),
        };

        let locals = self.aux.locals().next();
        let Some(Value::Map(mapping)) = locals.and_then(|l| l.get(map_name)).and_then(|a| a.as_value())
        else {
            return Err(missing(MapLevel::Map, map_name));
        };

        // Expression keys cannot be checked; skip that level and below
        if let Value::Str(top) = &items[1] {
            let Some(second_level) = mapping.get(top) else {
                return Err(missing(MapLevel::TopLevelKey, top));
            };
            if let (Value::Str(second), Value::Map(entries)) = (&items[2], second_level) {
                if !entries.contains_key(second) {
                    return Err(missing(MapLevel::SecondLevelKey, second));
                }
            }
        }

        let key = |value: &Value| -> ResolveResult<String> {
            match value {
                Value::Str(s) => Ok(quote(s)),
                Value::Literal(expr) => Ok(expr.clone()),
                _ => Err(ResolveError::shape(
                    Intrinsic::FindInMap,
                    "keys must be Strings",
                )),
            }
        };

        Ok(Value::literal(format!(
            "local.{map_name}[{}][{}]",
            key(&items[1])?,
            key(&items[2])?
        )))
    }

    pub(crate) fn get_azs(&mut self, argument: Value) -> ResolveResult<Value> {
        if !matches!(argument, Value::Str(_) | Value::Literal(_)) {
            return Err(ResolveError::shape(
                Intrinsic::GetAZs,
                "the value must be a region String",
            ));
        }
        let block = Block::data("aws_availability_zones", "available").with_attributes(["names"]);
        Ok(self.aux.register(block).reference(None))
    }

    pub(crate) fn import_value(&mut self, argument: Value) -> ResolveResult<Value> {
        let (name, export) = match &argument {
            Value::Str(export) => (sanitize_identifier(&pascal_to_snake(export)), export.clone()),
            Value::Literal(expr) => (
                format!("import_{}", sanitize_identifier(&pascal_to_snake(expr))),
                expr.clone(),
            ),
            _ => {
                return Err(ResolveError::shape(
                    Intrinsic::ImportValue,
                    "the value must be an export name",
                ));
            }
        };

        let block = Block::variable(name)
            .with(
                "description",
                Value::str(format!("Value of the CloudFormation export {export}")),
            )
            .with("type", Value::literal("string"));
        Ok(self.aux.register(block).reference(None))
    }

    pub(crate) fn cidr(&mut self, argument: Value) -> ResolveResult<Value> {
        let items = list_of(
            Intrinsic::Cidr,
            argument,
            3,
            "an ipBlock, the count of subnets and the cidrBits",
        )?;
        let count = integer(Intrinsic::Cidr, &items[1], "the count")?;
        let host_bits = integer(Intrinsic::Cidr, &items[2], "the cidrBits")?;

        if !(1..=256).contains(&count) {
            return Err(ResolveError::shape(
                Intrinsic::Cidr,
                format!("the count must be between 1 and 256, found {count}"),
            ));
        }
        if !(0..=32).contains(&host_bits) {
            return Err(ResolveError::shape(
                Intrinsic::Cidr,
                format!("the cidrBits must be between 0 and 32, found {host_bits}"),
            ));
        }

        let (block, new_bits) = match &items[0] {
            Value::Str(block) => {
                let prefix = block
                    .split_once('/')
                    .and_then(|(_, prefix)| prefix.parse::<i64>().ok())
                    .filter(|prefix| (0..=32).contains(prefix))
                    .ok_or_else(|| {
                        ResolveError::shape(
                            Intrinsic::Cidr,
                            format!("'{block}' is not an IPv4 CIDR block"),
                        )
                    })?;
                let new_bits = 32 - host_bits - prefix;
                if new_bits <= 0 {
                    return Err(ResolveError::shape(
                        Intrinsic::Cidr,
                        format!("unable to convert {block} into {count} subnets of /{}", 32 - host_bits),
                    ));
                }
                (quote(block), new_bits.to_string())
            }
            Value::Literal(expr) => (
                expr.clone(),
                format!("32 - {host_bits} - tonumber(element(split(\"/\", {expr}), 1))"),
            ),
            _ => {
                return Err(ResolveError::shape(
                    Intrinsic::Cidr,
                    "the ipBlock must be a String",
                ));
            }
        };

        let bits = vec![new_bits; count as usize].join(", ");
        Ok(Value::literal(format!("cidrsubnets({block}, {bits})")))
    }
}

// =============================================================================
// SUB TEMPLATE PARSING
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum SubToken {
    Text(String),
    Variable(String),
}

/// Split a `Fn::Sub` template into literal text and variables.
///
/// `${Name}` and `$Name` are variables; `${!Literal}` is the escape for a
/// literal `${Literal}`.
fn tokenize(template: &str) -> Vec<SubToken> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '$' {
            text.push(chars[i]);
            i += 1;
            continue;
        }

        match chars.get(i + 1) {
            Some('{') if chars.get(i + 2) == Some(&'!') => {
                text.push_str("${");
                i += 3;
            }
            Some('{') => match chars[i + 2..].iter().position(|&c| c == '}') {
                Some(end) => {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    if !text.is_empty() {
                        tokens.push(SubToken::Text(std::mem::take(&mut text)));
                    }
                    tokens.push(SubToken::Variable(name.trim().to_string()));
                    i += 3 + end;
                }
                None => {
                    text.push('$');
                    i += 1;
                }
            },
            Some(c) if c.is_alphanumeric() || *c == '_' => {
                let len = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_alphanumeric() || **c == '_')
                    .count();
                let name: String = chars[i + 1..i + 1 + len].iter().collect();
                if !text.is_empty() {
                    tokens.push(SubToken::Text(std::mem::take(&mut text)));
                }
                tokens.push(SubToken::Variable(name));
                i += 1 + len;
            }
            _ => {
                text.push('$');
                i += 1;
            }
        }
    }

    if !text.is_empty() {
        tokens.push(SubToken::Text(text));
    }
    tokens
}

/// The plain string a template with no expression parts reduces to
fn unescape_plain(template: &str, variables: &indexmap::IndexMap<String, Value>) -> String {
    tokenize(template)
        .into_iter()
        .map(|token| match token {
            SubToken::Text(text) => text,
            SubToken::Variable(name) => variables
                .get(&name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxiliary::AuxLog;
    use crate::intrinsic::{CONDITION_FUNCTIONS, PROPERTY_FUNCTIONS};
    use crate::resolver::tests::{catalog, manifest, sample_template};
    use serde_json::{Value as JsonValue, json};

    fn resolve_with(aux: &mut AuxLog, value: JsonValue, allowed: &[Intrinsic]) -> ResolveResult<Value> {
        let manifest = manifest(sample_template());
        let catalog = catalog();
        Resolver::new(&manifest, &catalog, aux).resolve(&value, allowed)
    }

    fn resolve(value: JsonValue) -> ResolveResult<Value> {
        resolve_with(&mut AuxLog::new(), value, PROPERTY_FUNCTIONS)
    }

    fn condition(value: JsonValue) -> ResolveResult<Value> {
        resolve_with(&mut AuxLog::new(), value, CONDITION_FUNCTIONS)
    }

    fn literal(s: &str) -> Value {
        Value::literal(s)
    }

    fn region_map_aux() -> AuxLog {
        let mut aux = AuxLog::new();
        let mapping = Value::from_json(&json!({
            "us-east-1": {"AMI": "ami-1111"},
            "eu-west-1": {"AMI": "ami-2222"}
        }));
        aux.locals_mut().set("RegionMap", mapping);
        aux
    }

    #[test]
    fn test_join() {
        assert_eq!(
            resolve(json!({"Fn::Join": ["-", ["A", "B", "C"]]})).unwrap(),
            literal(r#"join("-", ["A", "B", "C"])"#)
        );
        assert_eq!(
            resolve(json!({"Fn::Join": ["-", {"Ref": "Env"}]})).unwrap(),
            literal(r#"join("-", var.env)"#)
        );
        assert_eq!(
            resolve(json!({"Fn::Join": ["", ["arn:", {"Ref": "AWS::Partition"}]]})).unwrap(),
            literal(r#"join("", ["arn:", data.aws_partition.current.partition])"#)
        );
    }

    #[test]
    fn test_join_bad_shape() {
        assert!(matches!(
            resolve(json!({"Fn::Join": ["-"]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Join, .. }
        ));
        assert!(matches!(
            resolve(json!({"Fn::Join": [1, ["a"]]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Join, .. }
        ));
    }

    #[test]
    fn test_select() {
        assert_eq!(
            resolve(json!({"Fn::Select": [0, ["A", "B", "C"]]})).unwrap(),
            literal(r#"element(["A", "B", "C"], 0)"#)
        );
        assert_eq!(
            resolve(json!({"Fn::Select": ["1", {"Fn::GetAZs": ""}]})).unwrap(),
            literal("element(data.aws_availability_zones.available.names, 1)")
        );
    }

    #[test]
    fn test_select_out_of_range() {
        assert_eq!(
            resolve(json!({"Fn::Select": [3, ["A", "B", "C"]]})).unwrap_err(),
            ResolveError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(
            resolve(json!({"Fn::Select": [-1, ["A"]]})).unwrap_err(),
            ResolveError::IndexOutOfRange { index: -1, len: 1 }
        );
    }

    #[test]
    fn test_split() {
        assert_eq!(
            resolve(json!({"Fn::Split": [",", "A,B,C"]})).unwrap(),
            literal(r#"split(",", "A,B,C")"#)
        );
        assert_eq!(
            resolve(json!({"Fn::Select": [0, {"Fn::Split": [",", {"Ref": "Env"}]}]})).unwrap(),
            literal(r#"element(split(",", var.env), 0)"#)
        );
    }

    #[test]
    fn test_base64() {
        assert_eq!(
            resolve(json!({"Fn::Base64": {"Fn::Sub": "echo ${Env}"}})).unwrap(),
            literal(r#"base64encode("echo ${var.env}")"#)
        );
    }

    #[test]
    fn test_sub_string_form() {
        assert_eq!(
            resolve(json!({"Fn::Sub": "${Env}-${AWS::Region}-logs"})).unwrap(),
            literal(r#""${var.env}-${data.aws_region.current.name}-logs""#)
        );
        assert_eq!(
            resolve(json!({"Fn::Sub": "arn:${Logs.Arn}/*"})).unwrap(),
            literal(r#""arn:${aws_s3_bucket.logs.arn}/*""#)
        );
    }

    #[test]
    fn test_sub_list_form() {
        let value = resolve(json!({"Fn::Sub": [
            "${Name}-${Suffix}-${Env}",
            {"Name": "app", "Suffix": {"Ref": "BucketPrefix"}}
        ]}))
        .unwrap();
        assert_eq!(value, literal(r#""app-${var.bucket_prefix}-${var.env}""#));
    }

    #[test]
    fn test_sub_escape_and_plain() {
        assert_eq!(
            resolve(json!({"Fn::Sub": "plain ${!Literal} text"})).unwrap(),
            Value::str("plain ${Literal} text")
        );
        assert_eq!(
            resolve(json!({"Fn::Sub": "keep ${!Literal} and ${Env}"})).unwrap(),
            literal(r#""keep $${Literal} and ${var.env}""#)
        );
        assert_eq!(
            resolve(json!({"Fn::Sub": ["${A}-x", {"A": "a"}]})).unwrap(),
            Value::str("a-x")
        );
    }

    #[test]
    fn test_sub_unknown_variable() {
        assert_eq!(
            resolve(json!({"Fn::Sub": "${Missing}"})).unwrap_err(),
            ResolveError::UnresolvedReference {
                name: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("a${B}c$D ${!E} $"),
            vec![
                SubToken::Text("a".to_string()),
                SubToken::Variable("B".to_string()),
                SubToken::Text("c".to_string()),
                SubToken::Variable("D".to_string()),
                SubToken::Text(" ${E} $".to_string()),
            ]
        );
    }

    #[test]
    fn test_and_or() {
        assert_eq!(
            condition(json!({"Fn::And": [{"Condition": "IsProd"}, {"Fn::Equals": [{"Ref": "Env"}, "x"]}]}))
                .unwrap(),
            literal(r#"alltrue([local.IsProd, var.env == "x"])"#)
        );
        assert_eq!(
            condition(json!({"Fn::Or": [{"Condition": "IsProd"}, {"Condition": "IsProd"}]})).unwrap(),
            literal("anytrue([local.IsProd, local.IsProd])")
        );
    }

    #[test]
    fn test_and_or_arity() {
        assert!(matches!(
            condition(json!({"Fn::And": [{"Condition": "IsProd"}]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::And, .. }
        ));
        let eleven: Vec<JsonValue> = (0..11).map(|_| json!({"Condition": "IsProd"})).collect();
        assert!(matches!(
            condition(json!({"Fn::Or": eleven})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Or, .. }
        ));
        let ten: Vec<JsonValue> = (0..10).map(|_| json!({"Condition": "IsProd"})).collect();
        assert!(condition(json!({"Fn::Or": ten})).is_ok());
    }

    #[test]
    fn test_not_and_equals() {
        assert_eq!(
            condition(json!({"Fn::Not": [{"Condition": "IsProd"}]})).unwrap(),
            literal("!local.IsProd")
        );
        assert_eq!(
            condition(json!({"Fn::Not": [{"Fn::Equals": [{"Ref": "Env"}, "prod"]}]})).unwrap(),
            literal(r#"!(var.env == "prod")"#)
        );
        assert!(matches!(
            condition(json!({"Fn::Equals": ["a"]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Equals, .. }
        ));
    }

    #[test]
    fn test_equals_groups_conditional_operand() {
        assert_eq!(
            condition(json!({"Fn::Equals": [{"Fn::If": ["IsProd", "a", "b"]}, "a"]})).unwrap(),
            literal(r#"(local.IsProd ? "a" : "b") == "a""#)
        );
        assert_eq!(
            condition(json!({"Fn::Not": [{"Fn::Not": [{"Condition": "IsProd"}]}]})).unwrap(),
            literal("!(!local.IsProd)")
        );
    }

    #[test]
    fn test_if_groups_branches() {
        assert_eq!(
            resolve(json!({"Fn::If": ["IsProd", {"Fn::If": ["IsProd", 1, 2]}, 3]})).unwrap(),
            literal("local.IsProd ? (local.IsProd ? 1 : 2) : 3")
        );
    }

    #[test]
    fn test_not_arity() {
        assert!(matches!(
            condition(json!({"Fn::Not": []})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Not, .. }
        ));
        assert!(matches!(
            condition(json!({"Fn::Not": [{"Condition": "IsProd"}, {"Condition": "IsProd"}]}))
                .unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Not, .. }
        ));
    }

    #[test]
    fn test_if_arity() {
        assert!(matches!(
            resolve(json!({"Fn::If": ["IsProd", "a"]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::If, .. }
        ));
        assert!(matches!(
            resolve(json!({"Fn::If": ["IsProd", "a", "b", "c"]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::If, .. }
        ));
    }

    #[test]
    fn test_if() {
        assert_eq!(
            resolve(json!({"Fn::If": ["IsProd", "large", {"Ref": "AWS::NoValue"}]})).unwrap(),
            literal(r#"local.IsProd ? "large" : null"#)
        );
        assert_eq!(
            resolve(json!({"Fn::If": ["Unknown", "a", "b"]})).unwrap_err(),
            ResolveError::UnresolvedReference {
                name: "Unknown".to_string()
            }
        );
    }

    #[test]
    fn test_condition_must_exist() {
        assert!(condition(json!({"Condition": "Missing"})).is_err());
    }

    #[test]
    fn test_find_in_map() {
        let mut aux = region_map_aux();
        let value = resolve_with(
            &mut aux,
            json!({"Fn::FindInMap": ["RegionMap", "us-east-1", "AMI"]}),
            PROPERTY_FUNCTIONS,
        )
        .unwrap();
        assert_eq!(value, literal(r#"local.RegionMap["us-east-1"]["AMI"]"#));

        let value = resolve_with(
            &mut aux,
            json!({"Fn::FindInMap": ["RegionMap", {"Ref": "AWS::Region"}, "AMI"]}),
            PROPERTY_FUNCTIONS,
        )
        .unwrap();
        assert_eq!(
            value,
            literal(r#"local.RegionMap[data.aws_region.current.name]["AMI"]"#)
        );
    }

    #[test]
    fn test_find_in_map_missing_keys() {
        let mut aux = region_map_aux();
        let err = resolve_with(&mut aux, json!({"Fn::FindInMap": ["Nope", "a", "b"]}), PROPERTY_FUNCTIONS);
        assert_eq!(
            err.unwrap_err(),
            ResolveError::MissingMapKey { level: MapLevel::Map, key: "Nope".to_string() }
        );

        let err = resolve_with(
            &mut aux,
            json!({"Fn::FindInMap": ["RegionMap", "ap-south-1", "AMI"]}),
            PROPERTY_FUNCTIONS,
        );
        assert_eq!(
            err.unwrap_err(),
            ResolveError::MissingMapKey {
                level: MapLevel::TopLevelKey,
                key: "ap-south-1".to_string()
            }
        );

        let err = resolve_with(
            &mut aux,
            json!({"Fn::FindInMap": ["RegionMap", "us-east-1", "Kernel"]}),
            PROPERTY_FUNCTIONS,
        );
        assert_eq!(
            err.unwrap_err(),
            ResolveError::MissingMapKey {
                level: MapLevel::SecondLevelKey,
                key: "Kernel".to_string()
            }
        );
    }

    #[test]
    fn test_find_in_map_locals_count() {
        let err = resolve(json!({"Fn::FindInMap": ["RegionMap", "a", "b"]})).unwrap_err();
        assert_eq!(err, ResolveError::MissingLocals { found: 0 });

        let mut aux = region_map_aux();
        aux.push(Block::locals());
        let err = resolve_with(&mut aux, json!({"Fn::FindInMap": ["RegionMap", "a", "b"]}), PROPERTY_FUNCTIONS);
        assert_eq!(err.unwrap_err(), ResolveError::MissingLocals { found: 2 });
    }

    #[test]
    fn test_find_in_map_arity() {
        let mut aux = region_map_aux();
        let err = resolve_with(&mut aux, json!({"Fn::FindInMap": ["RegionMap", "a"]}), PROPERTY_FUNCTIONS);
        assert!(matches!(
            err.unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::FindInMap, .. }
        ));
    }

    #[test]
    fn test_get_azs_registers_data_block() {
        let mut aux = AuxLog::new();
        let value = resolve_with(&mut aux, json!({"Fn::GetAZs": {"Ref": "AWS::Region"}}), PROPERTY_FUNCTIONS);
        assert_eq!(value.unwrap(), literal("data.aws_availability_zones.available.names"));
        assert_eq!(aux.len(), 2);
    }

    #[test]
    fn test_import_value() {
        let mut aux = AuxLog::new();
        let value = resolve_with(&mut aux, json!({"Fn::ImportValue": "SharedVpcId"}), PROPERTY_FUNCTIONS);
        assert_eq!(value.unwrap(), literal("var.shared_vpc_id"));

        let value = resolve_with(
            &mut aux,
            json!({"Fn::ImportValue": {"Fn::Sub": "${Env}-VpcId"}}),
            PROPERTY_FUNCTIONS,
        );
        let Value::Literal(reference) = value.unwrap() else {
            panic!("expected a reference");
        };
        assert!(reference.starts_with("var.import_"));
        assert_eq!(aux.len(), 2);
    }

    #[test]
    fn test_cidr() {
        assert_eq!(
            resolve(json!({"Fn::Cidr": ["10.1.0.0/16", 4, 8]})).unwrap(),
            literal(r#"cidrsubnets("10.1.0.0/16", 8, 8, 8, 8)"#)
        );
        assert_eq!(
            resolve(json!({"Fn::Cidr": [{"Ref": "Env"}, 2, "5"]})).unwrap(),
            literal(
                r#"cidrsubnets(var.env, 32 - 5 - tonumber(element(split("/", var.env), 1)), 32 - 5 - tonumber(element(split("/", var.env), 1)))"#
            )
        );
    }

    #[test]
    fn test_cidr_invalid() {
        assert!(resolve(json!({"Fn::Cidr": ["10.1.0.0", 4, 8]})).is_err());
        assert!(resolve(json!({"Fn::Cidr": ["10.1.0.0/30", 4, 8]})).is_err());
        assert!(resolve(json!({"Fn::Cidr": ["10.1.0.0/16", 0, 8]})).is_err());
    }

    #[test]
    fn test_cidr_bits_out_of_range() {
        for bits in [json!(i64::MIN), json!(-1), json!(33), json!(i64::MAX)] {
            assert!(matches!(
                resolve(json!({"Fn::Cidr": ["10.0.0.0/16", 1, bits.clone()]})).unwrap_err(),
                ResolveError::ArgumentShape { function: Intrinsic::Cidr, .. }
            ));
            assert!(matches!(
                resolve(json!({"Fn::Cidr": [{"Ref": "Env"}, 1, bits]})).unwrap_err(),
                ResolveError::ArgumentShape { function: Intrinsic::Cidr, .. }
            ));
        }
    }
}
