//! Convert command - convert CloudFormation templates to Terraform
//!
//! Without `--output-dir` the configuration streams to stdout and the
//! report goes to stderr, so the output can be piped straight into a file.

use console::{Term, style};
use stackshift_convert::{
    ConversionResult, ConversionWarning, ConvertError, ConvertOptions, WarningCategory,
    WarningSeverity, convert_with_options,
};
use stackshift_core::{Block, BlockKind, SourceDocument};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::StackshiftConfig;
use crate::error::Result;
use crate::output;

/// Flags of the convert command, before merging with the config file
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub template: PathBuf,
    pub catalog: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub match_cutoff: Option<u8>,
    pub section_cutoff: Option<u8>,
    pub strict: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl ConvertArgs {
    /// Conversion options, flags first then config file values
    pub fn options(&self, config: &StackshiftConfig) -> ConvertOptions {
        ConvertOptions {
            match_cutoff: self.match_cutoff.unwrap_or(config.match_cutoff),
            section_cutoff: self.section_cutoff.unwrap_or(config.section_cutoff),
            strict: self.strict || config.strict,
        }
    }
}

pub fn run(args: &ConvertArgs, config: &StackshiftConfig) -> Result<()> {
    let output_dir = args.output_dir.as_deref().or(config.output_dir.as_deref());
    let options = args.options(config);

    let document = SourceDocument::load(&args.template)?;
    let catalog = super::load_catalog(args.catalog.as_deref(), config)?;

    tracing::info!(
        template = %args.template.display(),
        match_cutoff = options.match_cutoff,
        section_cutoff = options.section_cutoff,
        strict = options.strict,
        "converting"
    );

    // The report shares stdout only when the configuration goes to files
    let term = if output_dir.is_some() {
        Term::stdout()
    } else {
        console::set_colors_enabled(console::colors_enabled_stderr());
        Term::stderr()
    };

    let result = match convert_with_options(&document, catalog, options) {
        Ok(result) => result,
        Err(ConvertError::Strict { count, warnings }) => {
            if !args.quiet {
                let report = Report::new(&term, args.verbose);
                report.warnings(&warnings)?;
            }
            return Err(ConvertError::Strict { count, warnings }.into());
        }
        Err(err) => return Err(err.into()),
    };

    let written = match output_dir {
        Some(dir) => output::write_files(&result.configuration, dir)?,
        None => {
            print!("{}", result.configuration.render());
            Vec::new()
        }
    };

    if !args.quiet {
        let report = Report::new(&term, args.verbose);
        report.header(&args.template, document.description(), output_dir)?;
        report.blocks(&result)?;
        report.files(&written)?;
        report.warnings(&result.warnings)?;
        report.summary(&result)?;
        report.next_steps(&result, output_dir)?;
    }

    Ok(())
}

// =============================================================================
// REPORT
// =============================================================================

struct Report<'a> {
    term: &'a Term,
    verbose: bool,
}

impl<'a> Report<'a> {
    fn new(term: &'a Term, verbose: bool) -> Self {
        Self { term, verbose }
    }

    fn line(&self, text: impl AsRef<str>) -> io::Result<()> {
        self.term.write_line(text.as_ref())
    }

    fn title(&self, title: &str) -> io::Result<()> {
        self.line(format!("  {}", style(title).bold()))?;
        self.line(format!(
            "  {}",
            style("─".repeat(title.chars().count())).dim()
        ))
    }

    fn header(
        &self,
        template: &Path,
        description: Option<&str>,
        output_dir: Option<&Path>,
    ) -> io::Result<()> {
        self.line("")?;
        self.line(format!(
            "  {} {} {}",
            style("Stackshift Convert").bold().cyan(),
            style("─").dim(),
            style("CloudFormation → Terraform").dim()
        ))?;
        self.line("")?;
        self.line(format!(
            "  {} {} {}",
            style("Source:").dim(),
            style(template.display()).cyan(),
            style("(CloudFormation template)").dim()
        ))?;
        if let Some(description) = description {
            self.line(format!("          {}", style(description).italic()))?;
        }
        let target = match output_dir {
            Some(dir) => style(dir.display().to_string()).green(),
            None => style("stdout".to_string()).green(),
        };
        self.line(format!(
            "  {} {} {}",
            style("Target:").dim(),
            target,
            style("(Terraform HCL)").dim()
        ))?;
        self.line("")
    }

    fn blocks(&self, result: &ConversionResult) -> io::Result<()> {
        self.title("Converted Blocks")?;
        for block in result.configuration.blocks() {
            self.line(format!(
                "  {} {}",
                style("✓").green().bold(),
                block_address(block)
            ))?;
        }
        self.line("")
    }

    fn files(&self, written: &[PathBuf]) -> io::Result<()> {
        if written.is_empty() {
            return Ok(());
        }
        self.title("Written Files")?;
        for path in written {
            self.line(format!("  {} {}", style("→").blue(), path.display()))?;
        }
        self.line("")
    }

    fn warnings(&self, warnings: &[ConversionWarning]) -> io::Result<()> {
        if warnings.is_empty() {
            return Ok(());
        }

        let mut by_category: HashMap<WarningCategory, Vec<&ConversionWarning>> = HashMap::new();
        for warning in warnings {
            by_category.entry(warning.category).or_default().push(warning);
        }

        let significant = warnings
            .iter()
            .any(|w| w.severity != WarningSeverity::Info);

        if !significant && !self.verbose {
            self.line(format!(
                "  {} {} {} {}",
                style("ℹ").cyan(),
                warnings.len(),
                style("attributes kept as comments").dim(),
                style("(use --verbose to see details)").dim()
            ))?;
            return self.line("");
        }

        self.title("Conversion Notes")?;
        self.line("")?;

        let groups = [
            (
                WarningCategory::Schema,
                style("Schema").red().bold(),
                "resources skipped",
            ),
            (
                WarningCategory::Unsupported,
                style("Unsupported").magenta().bold(),
                "manual migration needed",
            ),
            (
                WarningCategory::Expression,
                style("Expressions").red().bold(),
                "kept as comments",
            ),
            (
                WarningCategory::Property,
                style("Properties").yellow().bold(),
                "review the mapping",
            ),
        ];

        for (category, label, note) in groups {
            if let Some(group) = by_category.get(&category) {
                self.line(format!("  {} {}", label, style(format!("─ {note}")).dim()))?;
                for warning in group {
                    self.warning(warning)?;
                }
                self.line("")?;
            }
        }

        if self.verbose
            && let Some(preserved) = by_category.get(&WarningCategory::Preserved)
        {
            self.line(format!(
                "  {} {}",
                style("Preserved").cyan().bold(),
                style("─ no Terraform equivalent").dim()
            ))?;
            for warning in preserved {
                self.warning(warning)?;
            }
            self.line("")?;
        }

        Ok(())
    }

    fn warning(&self, warning: &ConversionWarning) -> io::Result<()> {
        let icon = match warning.severity {
            WarningSeverity::Info => style("ℹ").cyan(),
            WarningSeverity::Warning => style("⚠").yellow(),
            WarningSeverity::Unsupported => style("✗").magenta(),
            WarningSeverity::Error => style("✗").red().bold(),
        };

        self.line(format!(
            "    {} {} {}",
            icon,
            style(&warning.pattern).bold(),
            style(format!("in {}.{}", warning.section, warning.logical_id)).dim()
        ))?;
        self.line(format!("      {}", style(&warning.message).dim()))?;

        if let Some(ref suggestion) = warning.suggestion {
            self.line(format!("      {} {}", style("→").green(), suggestion))?;
        }
        Ok(())
    }

    fn summary(&self, result: &ConversionResult) -> io::Result<()> {
        let configuration = &result.configuration;
        let count = |severity: WarningSeverity| {
            result
                .warnings
                .iter()
                .filter(|w| w.severity == severity)
                .count()
        };

        self.title("Summary")?;

        for (kind, noun) in [
            (BlockKind::Resource, "resource"),
            (BlockKind::Variable, "variable"),
            (BlockKind::Output, "output"),
        ] {
            let n = configuration.of_kind(&kind).count();
            if n > 0 {
                self.line(format!(
                    "  {} {}{}",
                    style(format!("{:>3}", n)).green().bold(),
                    noun,
                    plural(n)
                ))?;
            }
        }

        let errors = count(WarningSeverity::Error);
        if errors > 0 {
            self.line(format!(
                "  {} conversion error{}",
                style(format!("{:>3}", errors)).red().bold(),
                plural(errors)
            ))?;
        }

        let unsupported = count(WarningSeverity::Unsupported);
        if unsupported > 0 {
            self.line(format!(
                "  {} unsupported construct{} {}",
                style(format!("{:>3}", unsupported)).magenta().bold(),
                plural(unsupported),
                style("(needs manual fix)").dim()
            ))?;
        }

        let warnings = count(WarningSeverity::Warning);
        if warnings > 0 {
            self.line(format!(
                "  {} warning{} {}",
                style(format!("{:>3}", warnings)).yellow().bold(),
                plural(warnings),
                style("(review recommended)").dim()
            ))?;
        }

        self.line("")
    }

    fn next_steps(&self, result: &ConversionResult, output_dir: Option<&Path>) -> io::Result<()> {
        self.title("Next Steps")?;

        let mut step = 1;
        if result.actionable().next().is_some() {
            self.line(format!(
                "  {} {}",
                style(format!("{step}.")).dim(),
                style("Search the output for `// CF` comments").yellow()
            ))?;
            self.line(format!(
                "     {}",
                style("Each one marks a construct to rewrite by hand").dim()
            ))?;
            self.line("")?;
            step += 1;
        }

        let init = match output_dir {
            Some(dir) => format!("terraform -chdir={} init", dir.display()),
            None => "terraform init".to_string(),
        };
        self.line(format!(
            "  {} {}",
            style(format!("{step}.")).dim(),
            style(init).cyan()
        ))?;
        self.line(format!(
            "     {}",
            style("Install the AWS provider").dim()
        ))?;
        self.line("")?;
        step += 1;

        self.line(format!(
            "  {} {}",
            style(format!("{step}.")).dim(),
            style("terraform validate").cyan()
        ))?;
        self.line(format!(
            "     {}",
            style("Check the generated configuration").dim()
        ))?;
        self.line("")
    }
}

/// `resource.aws_s3_bucket.logs`, `locals`, `variable.env`
fn block_address(block: &Block) -> String {
    std::iter::once(block.kind.keyword())
        .chain(block.labels.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(".")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
