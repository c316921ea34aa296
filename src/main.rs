//! Tabula CLI
//!
//! Runs one grid request against a JSON data file and prints the rows and
//! totals:
//!
//! ```text
//! tabula --grid orders.toml --data orders.json --query "grid-filter=Freight__5__10" --sort Freight:desc
//! tabula init-config
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabula::config::{generate_default_config, Config, LoggingConfig};
use tabula::{Grid, GridDefinition, GridView, MemoryExecutor, RequestFilterSettings, SortDirection};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Filter, sort and total tabular data from a grid definition")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Grid definition (TOML)
    #[arg(long)]
    pub grid: Option<PathBuf>,

    /// Data file: a JSON object mapping entity names to arrays of records
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Request query string (grid-filter=Column__code__value&...)
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Sort column, optionally with direction (Column:asc or Column:desc)
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the default config file
    InitConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::InitConfig { output }) = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Wrote default config to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging);

    let (Some(grid_path), Some(data_path)) = (&cli.grid, &cli.data) else {
        bail!("--grid and --data are required (or use the init-config command)");
    };

    let definition = GridDefinition::load(grid_path)?;
    let mut grid = definition.build(&config)?;

    let data = std::fs::read_to_string(data_path)
        .with_context(|| format!("Failed to read {}", data_path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("Invalid JSON in {}", data_path.display()))?;
    let executor = MemoryExecutor::from_json(&document)?;

    if let Some(sort) = &cli.sort {
        let (column, direction) = match sort.split_once(':') {
            Some((column, direction)) => (column, direction.parse::<SortDirection>().map_err(anyhow::Error::msg)?),
            None => (sort.as_str(), SortDirection::Ascending),
        };
        grid.sort_by(column, Some(direction))?;
    }

    let settings = RequestFilterSettings::from_query(&cli.query);
    let view = grid.process(settings, &executor)?;

    match cli.format.as_str() {
        "json" => print_json(&grid, &view)?,
        _ => print_table(&grid, &view),
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabula={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Cell text for a column of a row
fn cell(row: &serde_json::Value, expression: Option<&str>) -> String {
    let value = expression
        .map(|e| format!("/{}", e.replace('.', "/")))
        .and_then(|pointer| row.pointer(&pointer).cloned());

    match value {
        None | Some(serde_json::Value::Null) => "-".to_string(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn print_table(grid: &Grid, view: &GridView) {
    let columns: Vec<_> = grid.columns().iter().filter(|c| !c.is_hidden()).collect();

    let header: Vec<String> = columns.iter().map(|c| format!("{:<16}", c.title())).collect();
    println!("{}", header.join(" "));
    println!("{}", "-".repeat(17 * columns.len()));

    for row in &view.rows {
        let row = serde_json::Value::Object(row.clone());
        let cells: Vec<String> = columns
            .iter()
            .map(|c| format!("{:<16}", cell(&row, c.expression())))
            .collect();
        println!("{}", cells.join(" "));
    }

    println!();
    println!("{} rows", view.rows.len());

    let totals = grid.rendered_totals();
    if !totals.is_empty() {
        println!();
        for total in totals {
            println!("{:<16} {:<10} {}", total.column, total.label, total.text);
        }
    }
}

fn print_json(grid: &Grid, view: &GridView) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "filter": view.predicate.as_ref().map(|p| p.to_string()),
        "order": view.order.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
        "rows": view.rows,
        "totals": grid.rendered_totals(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
