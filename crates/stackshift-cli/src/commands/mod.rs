//! CLI commands

pub mod convert;
pub mod lookup;

use stackshift_core::CatalogProvider;
use std::path::Path;

use crate::config::StackshiftConfig;
use crate::error::{CliError, Result};

/// Load the schema catalog named by the flag, falling back to the config file
pub(crate) fn load_catalog(
    flag: Option<&Path>,
    config: &StackshiftConfig,
) -> Result<CatalogProvider> {
    let path = flag.or(config.catalog.as_deref()).ok_or_else(|| {
        CliError::usage_with_help(
            "No schema catalog given",
            "Pass --catalog <FILE>, set STACKSHIFT_CATALOG, or add `catalog:` to the config file",
        )
    })?;

    tracing::debug!(path = %path.display(), "loading catalog");
    CatalogProvider::load(path).map_err(CliError::catalog)
}
