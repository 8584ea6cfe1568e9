//! `aptx` command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # List the tables of an SQL export, or print one of them
//! aptx sql 1234.sql
//! aptx sql 1234.sql exposures --json
//!
//! # Summarize proposals
//! aptx summary 1234.aptx 5678.aptx
//!
//! # Write guide-star windows of observation 3 to 1234_3.gswin
//! aptx gswin 1234 3 --tform isot
//!
//! # Group proposals by schema version
//! aptx schemaver *.aptx
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use aptx_rust::config::AptxConfig;
use aptx_rust::io::{ProposalLoader, ReportLoader, SqlExportLoader};
use aptx_rust::services::{
    format_schema_groups, group_by_schema_version, gswin_file_name, root_name, target_summaries,
    GuideStarWindowDecoder, ProposalSummary,
};
use aptx_rust::time::TimeFormat;

#[derive(Parser, Debug)]
#[command(name = "aptx", version, about = "Inspect proposal archives and their exports")]
struct Cli {
    /// Configuration file (defaults to ./aptx.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tables of an SQL export, or print one table
    Sql {
        file: PathBuf,
        table: Option<String>,
        /// Print the table as JSON instead of a grid
        #[arg(long)]
        json: bool,
    },
    /// Print a summary of each proposal archive
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also summarize targets
        #[arg(long)]
        targets: bool,
    },
    /// Extract guide-star windows of one observation into <root>_<obs>.gswin
    Gswin {
        /// Archive name without the .aptx extension
        root: String,
        obs: u32,
        /// Output time format: unix, isot or decimalyear
        #[arg(long)]
        tform: Option<TimeFormat>,
    },
    /// Print proposal roots grouped by schema version
    Schemaver {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a .pointing report as a table
    Pointing { file: PathBuf },
    /// Print a .times report as tables
    Times { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = AptxConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Sql { file, table, json } => run_sql(&file, table.as_deref(), json, &config),
        Command::Summary { files, targets } => run_summary(&files, targets),
        Command::Gswin { root, obs, tform } => run_gswin(&root, obs, tform, &config),
        Command::Schemaver { files } => run_schemaver(&files),
        Command::Pointing { file } => {
            println!("{}", ReportLoader::load_pointing(&file)?);
            Ok(())
        }
        Command::Times { file } => {
            let report = ReportLoader::load_times(&file)?;
            println!("{}", report.observations_dataframe()?);
            println!("{}", report.visits_dataframe()?);
            println!("{}", report.exposures_dataframe()?);
            Ok(())
        }
    }
}

fn run_sql(file: &Path, table: Option<&str>, json: bool, config: &AptxConfig) -> anyhow::Result<()> {
    let Some(table) = table else {
        for name in SqlExportLoader::list_tables(file, config)? {
            println!("{}", name);
        }
        return Ok(());
    };

    let result = SqlExportLoader::load_table(file, table)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result.table)?);
    } else {
        println!("{}", result.table.to_dataframe()?);
    }
    Ok(())
}

fn run_summary(files: &[PathBuf], targets: bool) -> anyhow::Result<()> {
    for file in files {
        let proposal = ProposalLoader::load(file)?;
        let summary = ProposalSummary::from_proposal(&file.display().to_string(), &proposal)?;
        println!("{}", summary);
        if targets {
            for target in target_summaries(&proposal)? {
                println!("{}", target);
            }
        }
        println!("-----");
    }
    Ok(())
}

fn run_gswin(root: &str, obs: u32, tform: Option<TimeFormat>, config: &AptxConfig) -> anyhow::Result<()> {
    let archive = PathBuf::from(format!("{}.aptx", root));
    let proposal = ProposalLoader::load(&archive)?;
    let observation = proposal.observation(&obs.to_string())?;

    let mut decoder = GuideStarWindowDecoder::from_config(config);
    if let Some(tform) = tform {
        decoder = decoder.with_time_format(tform);
    }
    let windows = decoder.decode_observation(&observation)?;

    let output = gswin_file_name(root, &obs.to_string());
    println!("writing results to {}", output);
    let mut file = std::fs::File::create(&output)
        .with_context(|| format!("Failed to create {}", output))?;
    decoder.write_windows(&windows, &mut file)?;

    info!("Wrote {} windows to {}", windows.len(), output);
    Ok(())
}

fn run_schemaver(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut entries = Vec::new();
    for file in files {
        match ProposalLoader::schema_version(file) {
            Ok(version) => entries.push((root_name(&file.display().to_string()), version)),
            Err(e) => eprintln!("error reading schema version for {}: {:#}", file.display(), e),
        }
    }

    for line in format_schema_groups(&group_by_schema_version(entries)) {
        println!("{}", line);
    }
    Ok(())
}
