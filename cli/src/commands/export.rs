//! Export commands - flattened chart views
//!
//! One row per employee, team or vacancy, written as JSON lines or CSV to a
//! file or stdout.

use anyhow::{Context, Result};
use clap::Args;
use orgchart::{OrgChart, write_csv, write_json_lines};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::output;

#[derive(Args)]
pub struct ExportArgs {
    /// Chart location: CouchDB database URL, file:// URL or local path
    #[arg(long, env = "ORG_CHART_DATA_URL")]
    pub data_url: String,

    /// Write CSV instead of JSON lines
    #[arg(long)]
    pub csv: bool,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Employee at the top of every reporting line, overriding the chart's
    #[arg(long)]
    pub root_employee: Option<String>
}

pub async fn employees(args: ExportArgs) -> Result<()> {
    let chart = load(&args).await?;
    let rows = chart
        .employee_exports()
        .context("Failed to flatten employees")?;
    write_rows(&args, &rows)
}

pub async fn teams(args: ExportArgs) -> Result<()> {
    let chart = load(&args).await?;
    let rows = chart.team_exports().context("Failed to flatten teams")?;
    write_rows(&args, &rows)
}

pub async fn vacancies(args: ExportArgs) -> Result<()> {
    let chart = load(&args).await?;
    write_rows(&args, &chart.vacancy_exports())
}

async fn load(args: &ExportArgs) -> Result<OrgChart> {
    let chart = orgchart::load_chart(&args.data_url)
        .await
        .with_context(|| format!("Failed to load org chart from {}", args.data_url))?;
    debug!(
        data_url = %args.data_url,
        teams = chart.teams().len(),
        employees = chart.employees().len(),
        "Loaded org chart"
    );

    Ok(match &args.root_employee {
        Some(root) => chart.with_root_employee(root.clone()),
        None => chart
    })
}

fn write_rows<T: Serialize>(args: &ExportArgs, rows: &[T]) -> Result<()> {
    let writer: Box<dyn Write> = match &args.output_file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?
        )),
        None => Box::new(io::stdout().lock())
    };

    if args.csv {
        write_csv(writer, rows)?;
    } else {
        write_json_lines(writer, rows)?;
    }

    if let Some(path) = &args.output_file {
        output::info(&format!("Wrote {} rows to {}", rows.len(), path.display()));
    }
    Ok(())
}
