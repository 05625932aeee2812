//! Lookup command - show which catalog schema a CloudFormation type maps to

use console::style;
use stackshift_core::{SchemaError, SchemaProvider};
use std::path::Path;

use crate::config::StackshiftConfig;
use crate::error::{CliError, Result};

pub fn run(cfn_type: &str, catalog: Option<&Path>, config: &StackshiftConfig) -> Result<()> {
    let provider = super::load_catalog(catalog, config)?;

    let schema = provider.find(cfn_type).map_err(|err| match err {
        SchemaError::NotFound { .. } => CliError::Catalog {
            message: err.to_string(),
            help: Some(
                "Add the type to the catalog, or pin it with `cfnType: <CloudFormation type>`"
                    .to_string(),
            ),
        },
        other => CliError::Catalog {
            message: other.to_string(),
            help: None,
        },
    })?;

    println!(
        "{} {} {}",
        style(cfn_type).cyan(),
        style("→").dim(),
        style(&schema.resource_type).green().bold()
    );

    println!();
    println!("{}", style("Arguments:").bold());
    for argument in &schema.arguments {
        println!("  {}", argument);
    }

    if !schema.attributes.is_empty() {
        println!();
        println!("{}", style("Attributes:").bold());
        for attribute in &schema.attributes {
            println!("  {}", attribute);
        }
    }

    if !schema.sections.is_empty() {
        println!();
        println!("{}", style("Sections:").bold());
        for (name, arguments) in &schema.sections {
            println!("  {} {}", name, style(format!("[{}]", arguments.join(", "))).dim());
        }
    }

    Ok(())
}
