//! Stackshift CLI - convert CloudFormation templates to Terraform

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod exit_codes;
mod output;

use commands::convert::ConvertArgs;
use config::StackshiftConfig;

#[derive(Parser)]
#[command(name = "stackshift")]
#[command(author = "Stackshift Contributors")]
#[command(version)]
#[command(about = "Convert CloudFormation templates to Terraform", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.config/stackshift/config.yaml)
    #[arg(long, global = true, env = "STACKSHIFT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CloudFormation template to Terraform HCL
    Convert {
        /// Template file (JSON or YAML)
        template: PathBuf,

        /// Schema catalog file
        #[arg(short, long, env = "STACKSHIFT_CATALOG")]
        catalog: Option<PathBuf>,

        /// Output directory (if not set, outputs to stdout)
        #[arg(short, long, env = "STACKSHIFT_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Minimum score (0-100) for property and attribute name matches
        #[arg(long, env = "STACKSHIFT_MATCH_CUTOFF", value_parser = clap::value_parser!(u8).range(0..=100))]
        match_cutoff: Option<u8>,

        /// Minimum score (0-100) for a property to become a nested block
        #[arg(long, env = "STACKSHIFT_SECTION_CUTOFF", value_parser = clap::value_parser!(u8).range(0..=100))]
        section_cutoff: Option<u8>,

        /// Fail if anything had to be kept as a comment
        #[arg(long)]
        strict: bool,

        /// Do not print the conversion report
        #[arg(short, long)]
        quiet: bool,

        /// Show every conversion note
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the schema a CloudFormation type resolves to
    Lookup {
        /// CloudFormation type, e.g. AWS::S3::Bucket
        cfn_type: String,

        /// Schema catalog file
        #[arg(short, long, env = "STACKSHIFT_CATALOG")]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
        Err(err) => err.exit(),
    };

    init_tracing(cli.debug);

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    let config = StackshiftConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            template,
            catalog,
            output_dir,
            match_cutoff,
            section_cutoff,
            strict,
            quiet,
            verbose,
        } => commands::convert::run(
            &ConvertArgs {
                template,
                catalog,
                output_dir,
                match_cutoff,
                section_cutoff,
                strict,
                quiet,
                verbose,
            },
            &config,
        ),

        Commands::Lookup { cfn_type, catalog } => {
            commands::lookup::run(&cfn_type, catalog.as_deref(), &config)
        }
    }
}
