use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::pipeline::Mode;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Merge referrer and trust-metrics backlink exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile uploaded exports and write the requested report(s)
    Run(RunArgs),
    /// Print the built-in header alias table as YAML
    Aliases(AliasesArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Domain referrer + domain trust exports
    Domain,
    /// Page referrer + page trust exports
    Page,
    /// Domain and page reports side by side
    Both,
    /// Page rows attached to their root domain
    Combined,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Domain => Mode::Domain,
            ModeArg::Page => Mode::Page,
            ModeArg::Both => Mode::Both,
            ModeArg::Combined => Mode::Combined,
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Which report(s) to build
    #[arg(long, value_enum)]
    pub mode: ModeArg,
    /// Domain-level referrer export (UTF-16, tab-separated)
    #[arg(long = "domain-referrer")]
    pub domain_referrer: Option<PathBuf>,
    /// Domain-level trust-metrics export (comma-separated)
    #[arg(long = "domain-trust")]
    pub domain_trust: Option<PathBuf>,
    /// Page-level referrer export (UTF-16, tab-separated)
    #[arg(long = "page-referrer")]
    pub page_referrer: Option<PathBuf>,
    /// Page-level trust-metrics export (comma-separated)
    #[arg(long = "page-trust")]
    pub page_trust: Option<PathBuf>,
    /// YAML alias table replacing the built-in one
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    /// Directory receiving the report file(s)
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// Print the first N rows of each report
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct AliasesArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
