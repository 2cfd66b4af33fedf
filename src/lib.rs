pub mod aliases;
pub mod cli;
pub mod coerce;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod join;
pub mod keys;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod table;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, error, info};

use crate::{
    cli::{AliasesArgs, Cli, Commands, RunArgs},
    pipeline::{Pipeline, UploadBatch},
    schema::CanonicalSchema,
    table::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("backlink_metrics", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(&args),
        Commands::Aliases(args) => handle_aliases(&args),
    }
}

fn load_input(path: Option<&Path>) -> Result<Option<Table>> {
    path.map(|p| {
        io_utils::read_source_path(p).with_context(|| format!("Reading export {p:?}"))
    })
    .transpose()
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let schema = match &args.aliases {
        Some(path) => CanonicalSchema::load(path)
            .with_context(|| format!("Loading alias table from {path:?}"))?,
        None => CanonicalSchema::builtin(),
    };
    let batch = UploadBatch {
        domain_referrer: load_input(args.domain_referrer.as_deref())?,
        domain_trust: load_input(args.domain_trust.as_deref())?,
        page_referrer: load_input(args.page_referrer.as_deref())?,
        page_trust: load_input(args.page_trust.as_deref())?,
    };
    debug!("Running {:?} mode", args.mode);

    let outcomes = Pipeline::new(schema).run(args.mode.into(), &batch);
    let mut failures = Vec::new();
    for outcome in outcomes {
        let report = match outcome.result {
            Ok(report) => report,
            Err(err) => {
                error!("{} report failed: {err}", outcome.kind);
                failures.push(outcome.kind.to_string());
                continue;
            }
        };
        let bytes = report.to_csv_bytes()?;
        let destination = args.output_dir.join(report.file_name());
        fs::write(&destination, bytes)
            .with_context(|| format!("Writing report to {destination:?}"))?;
        info!(
            "Wrote {} report ({} row(s)) to {:?}",
            report.kind(),
            report.table().row_count(),
            destination
        );
        if let Some(limit) = args.preview {
            print!("{}", table::render_preview(report.table(), limit));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{} report(s) failed: {}", failures.len(), failures.join(", ")))
    }
}

fn handle_aliases(args: &AliasesArgs) -> Result<()> {
    let schema = CanonicalSchema::builtin();
    match &args.output {
        Some(path) => {
            schema.save(path)?;
            info!("Alias table written to {path:?}");
        }
        None => print!("{}", schema.to_yaml_string()?),
    }
    Ok(())
}
