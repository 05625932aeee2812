//! Expression resolver
//!
//! Walks a raw property tree and turns every intrinsic function call into a
//! [`Value`]. A function is only accepted where the surrounding context
//! allows it; its argument is resolved against that function's own nesting
//! table before the handler runs.
//!
//! References (`Ref`, `Fn::GetAtt`, pseudo parameters) live here; the
//! remaining handlers are in [`crate::functions`].

use indexmap::IndexMap;
use phf::phf_map;
use serde_json::{Map, Value as JsonValue};
use stackshift_core::naming::pascal_to_snake;
use stackshift_core::{Block, Manifest, SchemaProvider, Section, Value};

use crate::auxiliary::AuxLog;
use crate::error::ResolveError;
use crate::intrinsic::Intrinsic;
use crate::mapper::match_name;

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Default minimum score for property and attribute name matches
pub const DEFAULT_MATCH_CUTOFF: u8 = 50;

/// GetAtt paths with a dot, keyed `<terraform type>/<attribute path>`
static NESTED_ATTRIBUTES: phf::Map<&'static str, &'static str> = phf_map! {
    "aws_db_instance/Endpoint.Address" => "address",
    "aws_db_instance/Endpoint.Port" => "port",
    "aws_rds_cluster/Endpoint.Address" => "endpoint",
    "aws_rds_cluster/Endpoint.Port" => "port",
    "aws_rds_cluster/ReadEndpoint.Address" => "reader_endpoint",
    "aws_elasticache_cluster/ConfigurationEndpoint.Address" => "configuration_endpoint",
    "aws_elasticache_cluster/ConfigurationEndpoint.Port" => "port",
    "aws_elasticache_replication_group/PrimaryEndPoint.Address" => "primary_endpoint_address",
    "aws_elasticache_replication_group/ReaderEndPoint.Address" => "reader_endpoint_address",
};

/// Resolves intrinsic functions for one template
pub struct Resolver<'a> {
    pub(crate) manifest: &'a Manifest,
    pub(crate) schemas: &'a dyn SchemaProvider,
    pub(crate) aux: &'a mut AuxLog,
    match_cutoff: u8,
}

impl<'a> Resolver<'a> {
    pub fn new(manifest: &'a Manifest, schemas: &'a dyn SchemaProvider, aux: &'a mut AuxLog) -> Self {
        Self {
            manifest,
            schemas,
            aux,
            match_cutoff: DEFAULT_MATCH_CUTOFF,
        }
    }

    /// Minimum fuzzy score for attribute name matches
    pub fn with_match_cutoff(mut self, cutoff: u8) -> Self {
        self.match_cutoff = cutoff;
        self
    }

    /// Resolve a raw value where only `allowed` functions may appear
    pub fn resolve(&mut self, value: &JsonValue, allowed: &[Intrinsic]) -> ResolveResult<Value> {
        self.resolve_in(value, allowed, None)
    }

    fn resolve_in(
        &mut self,
        value: &JsonValue,
        allowed: &[Intrinsic],
        parent: Option<Intrinsic>,
    ) -> ResolveResult<Value> {
        match value {
            JsonValue::Object(map) => {
                if let Some((function, argument)) = function_call(map, allowed) {
                    if !allowed.contains(&function) {
                        return Err(ResolveError::NestingViolation {
                            function,
                            parent: parent
                                .map(|p| p.key().to_string())
                                .unwrap_or_else(|| "this section".to_string()),
                        });
                    }
                    let argument =
                        self.resolve_in(argument, function.allowed_nested(), Some(function))?;
                    return self.call(function, argument);
                }

                let mut resolved = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    resolved.insert(key.clone(), self.resolve_in(item, allowed, parent)?);
                }
                Ok(Value::Map(resolved))
            }
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.resolve_in(item, allowed, parent))
                .collect::<ResolveResult<Vec<_>>>()
                .map(Value::List),
            scalar => Ok(Value::from_json(scalar)),
        }
    }

    fn call(&mut self, function: Intrinsic, argument: Value) -> ResolveResult<Value> {
        tracing::trace!(function = %function, "resolving intrinsic");
        match function {
            Intrinsic::Ref => self.reference(argument),
            Intrinsic::GetAtt => self.get_att(argument),
            Intrinsic::Condition => self.condition(argument),
            Intrinsic::And => self.and(argument),
            Intrinsic::Or => self.or(argument),
            Intrinsic::Not => self.not(argument),
            Intrinsic::Equals => self.equals(argument),
            Intrinsic::If => self.if_(argument),
            Intrinsic::Base64 => self.base64(argument),
            Intrinsic::Cidr => self.cidr(argument),
            Intrinsic::FindInMap => self.find_in_map(argument),
            Intrinsic::GetAZs => self.get_azs(argument),
            Intrinsic::ImportValue => self.import_value(argument),
            Intrinsic::Join => self.join(argument),
            Intrinsic::Select => self.select(argument),
            Intrinsic::Split => self.split(argument),
            Intrinsic::Sub => self.sub(argument),
            Intrinsic::Transform => Err(ResolveError::UnsupportedConstruct {
                construct: Intrinsic::Transform.key().to_string(),
            }),
        }
    }

    // =========================================================================
    // REFERENCES
    // =========================================================================

    fn reference(&mut self, argument: Value) -> ResolveResult<Value> {
        match argument {
            Value::Str(name) => self.ref_name(&name),
            _ => Err(ResolveError::shape(
                Intrinsic::Ref,
                "the value must be a String",
            )),
        }
    }

    /// Resolve a name as `Ref` would: pseudo parameter, parameter or resource
    pub(crate) fn ref_name(&mut self, name: &str) -> ResolveResult<Value> {
        if name.starts_with("AWS::") {
            return self.pseudo_parameter(name);
        }

        if self.manifest.contains(Section::Parameters, name) {
            return Ok(Value::literal(format!("var.{}", pascal_to_snake(name))));
        }

        if self.manifest.contains(Section::Resources, name) {
            return Ok(self.resource_block(name)?.reference(None));
        }

        Err(ResolveError::UnresolvedReference {
            name: name.to_string(),
        })
    }

    fn pseudo_parameter(&mut self, name: &str) -> ResolveResult<Value> {
        let (block, attribute) = match name {
            "AWS::Region" => (Block::data("aws_region", "current"), Some("name")),
            "AWS::AccountId" => (
                Block::data("aws_caller_identity", "current"),
                Some("account_id"),
            ),
            "AWS::Partition" => (Block::data("aws_partition", "current"), Some("partition")),
            "AWS::URLSuffix" => (Block::data("aws_partition", "current"), Some("dns_suffix")),
            "AWS::NoValue" => return Ok(Value::Null),
            "AWS::StackName" => (
                Block::variable(self.pseudo_variable("stack_name"))
                    .with("description", Value::str("Name of the stack this configuration replaces"))
                    .with("type", Value::literal("string")),
                None,
            ),
            "AWS::StackId" => (
                Block::variable(self.pseudo_variable("stack_id"))
                    .with("description", Value::str("Identifier of the stack this configuration replaces"))
                    .with("type", Value::literal("string")),
                None,
            ),
            "AWS::NotificationARNs" => (
                Block::variable(self.pseudo_variable("notification_arns"))
                    .with("description", Value::str("Notification topic ARNs"))
                    .with("type", Value::literal("list(string)"))
                    .with("default", Value::List(Vec::new())),
                None,
            ),
            _ => {
                return Err(ResolveError::UnknownPseudoParameter {
                    name: name.to_string(),
                });
            }
        };

        Ok(self.aux.register(block).reference(attribute))
    }

    /// Variable name for a pseudo parameter, moved aside when a declared
    /// parameter already converts to the same name
    fn pseudo_variable(&self, name: &str) -> String {
        let taken = self
            .manifest
            .entries(Section::Parameters)
            .iter()
            .any(|(id, _)| pascal_to_snake(id) == name);
        if taken {
            format!("aws_{name}")
        } else {
            name.to_string()
        }
    }

    /// The block a resource converts to, as far as references need it
    pub(crate) fn resource_block(&self, logical_id: &str) -> ResolveResult<Block> {
        let cfn_type = self.manifest.resource_type(logical_id).ok_or_else(|| {
            ResolveError::UnresolvedReference {
                name: logical_id.to_string(),
            }
        })?;
        let schema = self.schemas.find(cfn_type)?;

        let mut block = Block::resource(&schema, pascal_to_snake(logical_id));
        if let Some(condition) = self.manifest.resource_condition(logical_id) {
            block.set("count", count_expression(condition));
        }
        Ok(block)
    }

    fn get_att(&mut self, argument: Value) -> ResolveResult<Value> {
        let (resource, attribute) = match argument {
            Value::Str(path) => match path.split_once('.') {
                Some((resource, attribute)) => (resource.to_string(), attribute.to_string()),
                None => {
                    return Err(ResolveError::shape(
                        Intrinsic::GetAtt,
                        format!("expected 'LogicalId.Attribute', found '{path}'"),
                    ));
                }
            },
            Value::List(items) => match items.as_slice() {
                [Value::Str(resource), Value::Str(attribute)] => {
                    (resource.clone(), attribute.clone())
                }
                _ => {
                    return Err(ResolveError::shape(
                        Intrinsic::GetAtt,
                        "the List must contain a logical id and an attribute name",
                    ));
                }
            },
            _ => {
                return Err(ResolveError::shape(
                    Intrinsic::GetAtt,
                    "the value must be a String or a List",
                ));
            }
        };

        self.attribute_reference(&resource, &attribute)
    }

    /// Reference an attribute of a declared resource
    pub(crate) fn attribute_reference(
        &mut self,
        resource: &str,
        attribute: &str,
    ) -> ResolveResult<Value> {
        if !self.manifest.contains(Section::Resources, resource) {
            return Err(ResolveError::UnresolvedReference {
                name: resource.to_string(),
            });
        }

        let block = self.resource_block(resource)?;
        let tf_type = block.labels.first().map(String::as_str).unwrap_or_default();

        let tf_attribute = if attribute.contains('.') {
            nested_attribute(resource, tf_type, attribute)?
        } else {
            self.match_attribute(resource, attribute, &block.valid_attributes)?
        };

        Ok(block.reference(Some(&tf_attribute)))
    }

    fn match_attribute(
        &self,
        resource: &str,
        attribute: &str,
        candidates: &[String],
    ) -> ResolveResult<String> {
        match_name(attribute, candidates, self.match_cutoff)
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| ResolveError::UnmappableAttribute {
                resource: resource.to_string(),
                attribute: attribute.to_string(),
                reason: "no matching Terraform attribute".to_string(),
            })
    }
}

/// Detect a single-key function call map.
///
/// A bare `Condition` key is only a function call when its value is a
/// string and the current context accepts conditions; elsewhere (IAM policy
/// documents, for one) it is an ordinary key.
fn function_call<'v>(
    map: &'v Map<String, JsonValue>,
    allowed: &[Intrinsic],
) -> Option<(Intrinsic, &'v JsonValue)> {
    if map.len() != 1 {
        return None;
    }
    let (key, argument) = map.iter().next()?;
    let function = Intrinsic::from_key(key)?;

    if function == Intrinsic::Condition
        && !(argument.is_string() && allowed.contains(&Intrinsic::Condition))
    {
        return None;
    }

    Some((function, argument))
}

fn nested_attribute(resource: &str, tf_type: &str, attribute: &str) -> ResolveResult<String> {
    let unmappable = |reason: String| ResolveError::UnmappableAttribute {
        resource: resource.to_string(),
        attribute: attribute.to_string(),
        reason,
    };

    if tf_type == "aws_cloudformation_stack" {
        if let Some(output) = attribute.strip_prefix("Outputs.") {
            if output.is_empty() || output.contains('.') {
                return Err(unmappable(format!(
                    "error parsing nested stack output for {attribute}"
                )));
            }
            return Ok(format!("outputs[\"{output}\"]"));
        }
    }

    NESTED_ATTRIBUTES
        .get(format!("{tf_type}/{attribute}").as_str())
        .map(|a| a.to_string())
        .ok_or_else(|| unmappable(format!("unable to solve nested attribute for {tf_type}")))
}

/// `count` expression for a resource guarded by a condition
pub(crate) fn count_expression(condition: &str) -> Value {
    Value::literal(format!("local.{condition} ? 1 : 0"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::intrinsic::{CONDITION_FUNCTIONS, PROPERTY_FUNCTIONS};
    use serde_json::json;
    use stackshift_core::{CatalogProvider, SourceDocument};

    pub(crate) const CATALOG: &str = r#"
aws_s3_bucket:
  arguments: [bucket, acl, tags, versioning, logging]
  attributes: [id, arn, bucket_domain_name, bucket_regional_domain_name]
  sections:
    versioning: [enabled, mfa_delete]
    logging: [target_bucket, target_prefix]
aws_s3_bucket_policy:
  arguments: [bucket, policy]
  attributes: [id]
aws_db_instance:
  arguments: [allocated_storage, engine, instance_class]
  attributes: [address, arn, endpoint, port]
aws_cloudformation_stack:
  arguments: [name, template_url, parameters]
  attributes: [id, outputs]
aws_sqs_queue:
  arguments: [name, delay_seconds]
  attributes: [arn, id, url]
"#;

    pub(crate) fn manifest(template: JsonValue) -> Manifest {
        let doc = SourceDocument::from_value(template).unwrap();
        Manifest::build(&doc).unwrap()
    }

    pub(crate) fn catalog() -> CatalogProvider {
        CatalogProvider::parse(CATALOG).unwrap()
    }

    pub(crate) fn sample_template() -> JsonValue {
        json!({
            "Parameters": {
                "Env": {"Type": "String"},
                "BucketPrefix": {"Type": "String"}
            },
            "Conditions": {
                "IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]}
            },
            "Resources": {
                "Logs": {"Type": "AWS::S3::Bucket"},
                "Audit": {"Type": "AWS::S3::Bucket", "Condition": "IsProd"},
                "Database": {"Type": "AWS::RDS::DBInstance"},
                "Child": {"Type": "AWS::CloudFormation::Stack"},
                "Queue": {"Type": "AWS::SQS::Queue"}
            }
        })
    }

    fn resolve(value: JsonValue) -> ResolveResult<Value> {
        let manifest = manifest(sample_template());
        let catalog = catalog();
        let mut aux = AuxLog::new();
        Resolver::new(&manifest, &catalog, &mut aux).resolve(&value, PROPERTY_FUNCTIONS)
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(resolve(json!("")).unwrap(), Value::str(""));
        assert_eq!(resolve(json!(5)).unwrap(), Value::int(5));
        assert_eq!(resolve(json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(resolve(json!(null)).unwrap(), Value::Null);
    }

    #[test]
    fn test_plain_map_keeps_order() {
        let value = resolve(json!({"b": 1, "a": {"Ref": "Env"}})).unwrap();
        assert_eq!(value.render(0), "{\n  b = 1\n  a = var.env\n}");
    }

    #[test]
    fn test_ref_parameter() {
        assert_eq!(resolve(json!({"Ref": "Env"})).unwrap(), Value::literal("var.env"));
        assert_eq!(
            resolve(json!({"Ref": "BucketPrefix"})).unwrap(),
            Value::literal("var.bucket_prefix")
        );
    }

    #[test]
    fn test_ref_resource_uses_first_attribute() {
        assert_eq!(
            resolve(json!({"Ref": "Logs"})).unwrap(),
            Value::literal("aws_s3_bucket.logs.id")
        );
        assert_eq!(
            resolve(json!({"Ref": "Queue"})).unwrap(),
            Value::literal("aws_sqs_queue.queue.arn")
        );
    }

    #[test]
    fn test_ref_conditional_resource_is_indexed() {
        assert_eq!(
            resolve(json!({"Ref": "Audit"})).unwrap(),
            Value::literal("aws_s3_bucket.audit[0].id")
        );
    }

    #[test]
    fn test_ref_undeclared() {
        assert_eq!(
            resolve(json!({"Ref": "Nope"})).unwrap_err(),
            ResolveError::UnresolvedReference {
                name: "Nope".to_string()
            }
        );
    }

    #[test]
    fn test_ref_non_string() {
        assert!(matches!(
            resolve(json!({"Ref": ["Env"]})).unwrap_err(),
            ResolveError::ArgumentShape { function: Intrinsic::Ref, .. }
        ));
    }

    #[test]
    fn test_pseudo_parameters_register_blocks_once() {
        let manifest = manifest(sample_template());
        let catalog = catalog();
        let mut aux = AuxLog::new();
        let mut resolver = Resolver::new(&manifest, &catalog, &mut aux);

        let region = resolver.resolve(&json!({"Ref": "AWS::Region"}), PROPERTY_FUNCTIONS);
        assert_eq!(region.unwrap(), Value::literal("data.aws_region.current.name"));
        let again = resolver.resolve(&json!({"Ref": "AWS::Region"}), PROPERTY_FUNCTIONS);
        assert_eq!(again.unwrap(), Value::literal("data.aws_region.current.name"));

        let partition = resolver.resolve(&json!({"Ref": "AWS::Partition"}), PROPERTY_FUNCTIONS);
        assert_eq!(partition.unwrap(), Value::literal("data.aws_partition.current.partition"));
        let suffix = resolver.resolve(&json!({"Ref": "AWS::URLSuffix"}), PROPERTY_FUNCTIONS);
        assert_eq!(suffix.unwrap(), Value::literal("data.aws_partition.current.dns_suffix"));

        let account = resolver.resolve(&json!({"Ref": "AWS::AccountId"}), PROPERTY_FUNCTIONS);
        assert_eq!(account.unwrap(), Value::literal("data.aws_caller_identity.current.account_id"));

        let stack = resolver.resolve(&json!({"Ref": "AWS::StackName"}), PROPERTY_FUNCTIONS);
        assert_eq!(stack.unwrap(), Value::literal("var.stack_name"));

        let none = resolver.resolve(&json!({"Ref": "AWS::NoValue"}), PROPERTY_FUNCTIONS);
        assert_eq!(none.unwrap(), Value::Null);

        assert_eq!(aux.len(), 4);
    }

    #[test]
    fn test_unknown_pseudo_parameter_is_structural() {
        let err = resolve(json!({"Ref": "AWS::Bogus"})).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_get_att_string_and_list_forms() {
        assert_eq!(
            resolve(json!({"Fn::GetAtt": "Logs.Arn"})).unwrap(),
            Value::literal("aws_s3_bucket.logs.arn")
        );
        assert_eq!(
            resolve(json!({"Fn::GetAtt": ["Logs", "DomainName"]})).unwrap(),
            Value::literal("aws_s3_bucket.logs.bucket_domain_name")
        );
    }

    #[test]
    fn test_get_att_unknown_resource() {
        assert_eq!(
            resolve(json!({"Fn::GetAtt": ["Ghost", "Arn"]})).unwrap_err(),
            ResolveError::UnresolvedReference {
                name: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn test_get_att_unmatched_attribute() {
        assert!(matches!(
            resolve(json!({"Fn::GetAtt": ["Logs", "Qwxz"]})).unwrap_err(),
            ResolveError::UnmappableAttribute { .. }
        ));
    }

    #[test]
    fn test_get_att_exact_name_beats_cutoff() {
        let manifest = manifest(sample_template());
        let catalog = catalog();
        let mut aux = AuxLog::new();
        let value = Resolver::new(&manifest, &catalog, &mut aux)
            .with_match_cutoff(95)
            .resolve(&json!({"Fn::GetAtt": ["Database", "EndPoint"]}), PROPERTY_FUNCTIONS);
        assert_eq!(value.unwrap(), Value::literal("aws_db_instance.database.endpoint"));
    }

    #[test]
    fn test_pseudo_parameter_clear_of_declared_parameter() {
        let manifest = manifest(json!({
            "Parameters": {"StackName": {"Type": "String"}},
            "Resources": {"Queue": {"Type": "AWS::SQS::Queue"}}
        }));
        let catalog = catalog();
        let mut aux = AuxLog::new();
        let mut resolver = Resolver::new(&manifest, &catalog, &mut aux);

        let declared = resolver.resolve(&json!({"Ref": "StackName"}), PROPERTY_FUNCTIONS);
        assert_eq!(declared.unwrap(), Value::literal("var.stack_name"));
        let pseudo = resolver.resolve(&json!({"Ref": "AWS::StackName"}), PROPERTY_FUNCTIONS);
        assert_eq!(pseudo.unwrap(), Value::literal("var.aws_stack_name"));
    }

    #[test]
    fn test_get_att_nested() {
        assert_eq!(
            resolve(json!({"Fn::GetAtt": "Database.Endpoint.Address"})).unwrap(),
            Value::literal("aws_db_instance.database.address")
        );
        assert_eq!(
            resolve(json!({"Fn::GetAtt": "Child.Outputs.VpcId"})).unwrap(),
            Value::literal("aws_cloudformation_stack.child.outputs[\"VpcId\"]")
        );
        assert!(matches!(
            resolve(json!({"Fn::GetAtt": "Child.Outputs.A.B"})).unwrap_err(),
            ResolveError::UnmappableAttribute { .. }
        ));
        assert!(matches!(
            resolve(json!({"Fn::GetAtt": "Logs.Website.Url"})).unwrap_err(),
            ResolveError::UnmappableAttribute { .. }
        ));
    }

    #[test]
    fn test_nesting_violation() {
        let err = resolve(json!({"Fn::Select": [0, {"Fn::Sub": "a,b"}]})).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NestingViolation {
                function: Intrinsic::Sub,
                parent: "Fn::Select".to_string()
            }
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_condition_function_not_allowed_in_properties() {
        let err = resolve(json!({"Fn::Equals": ["a", "b"]})).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NestingViolation {
                function: Intrinsic::Equals,
                parent: "this section".to_string()
            }
        );
    }

    #[test]
    fn test_condition_key_in_policy_is_plain_map() {
        let value = resolve(json!({
            "Condition": {"StringEquals": {"aws:SourceAccount": "123"}}
        }))
        .unwrap();
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert!(map.contains_key("Condition"));

        // A string-valued Condition key outside a condition context is also data
        let value = resolve(json!({"Condition": "IsProd"})).unwrap();
        assert!(matches!(value, Value::Map(_)));
    }

    #[test]
    fn test_condition_key_in_condition_context() {
        let manifest = manifest(sample_template());
        let catalog = catalog();
        let mut aux = AuxLog::new();
        let mut resolver = Resolver::new(&manifest, &catalog, &mut aux);
        let value = resolver
            .resolve(&json!({"Condition": "IsProd"}), CONDITION_FUNCTIONS)
            .unwrap();
        assert_eq!(value, Value::literal("local.IsProd"));
    }

    #[test]
    fn test_transform_is_unsupported() {
        let err = resolve(json!({"Fn::Transform": {"Name": "AWS::Include"}})).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedConstruct { .. }));
        assert!(!err.is_structural());
    }
}
