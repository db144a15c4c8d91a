use analytics::{ProcessingResult, StatisticsEngine};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use configuration::{ServerOverrides, Settings, init_tracing, load_settings};
use core_types::PortfolioRequest;
use std::path::PathBuf;

/// The main entry point for the Portfolio Lens application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load PORTFOLIO_LENS__* overrides from a .env file when one is present.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    let _guard = init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(overrides) => {
            settings.server.apply(&overrides);
            web_server::run_server(settings).await?;
        }
        Commands::Process(args) => handle_process(args, &settings)?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Descriptive statistics for per-ISIN return series, over HTTP or from a file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults to `config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServerOverrides),
    /// Compute statistics for a request body stored on disk.
    Process(ProcessArgs),
}

#[derive(Parser)]
struct ProcessArgs {
    /// A JSON file shaped like the body of `POST /api/process-data`.
    #[arg(long, short)]
    input: PathBuf,

    /// Print the raw JSON result instead of a table.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Process Command Logic
// ==============================================================================

fn handle_process(args: ProcessArgs, settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(input = %args.input.display(), "Processing request file.");
    let body = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let request = PortfolioRequest::from_slice(&body)
        .with_context(|| format!("{} is not a valid request", args.input.display()))?;

    let engine = StatisticsEngine::new()
        .with_failure_isolation(settings.engine.isolate_failures)
        .with_risk_free_rate(settings.engine.risk_free_rate);
    let result = engine.process(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_table(&result));
        for (isin, message) in &result.failures {
            eprintln!("{isin}: {message}");
        }
    }

    Ok(())
}

/// Renders one row per ISIN. ISINs without data show only their weight.
fn render_table(result: &ProcessingResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "ISIN", "Weight", "Obs", "Cum. Return %", "Volatility", "Mean", "Median", "Min", "Max",
        "Skew", "Kurt", "Max DD", "Sharpe",
    ]);

    for isin in &result.isins {
        let weight = result
            .weights
            .get(isin.as_str())
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut row = vec![Cell::new(isin), Cell::new(weight)];
        match result.results.get(isin) {
            Some(report) => {
                let s = &report.stats;
                row.push(Cell::new(report.data.len()).set_alignment(CellAlignment::Right));
                for value in [
                    s.cumulative_return,
                    s.volatility,
                    s.mean,
                    s.median,
                    s.min,
                    s.max,
                    s.skewness,
                    s.kurtosis,
                    s.max_drawdown,
                    s.sharpe_ratio,
                ] {
                    row.push(Cell::new(format_stat(value)).set_alignment(CellAlignment::Right));
                }
            }
            None => row.push(Cell::new(0).set_alignment(CellAlignment::Right)),
        }
        table.add_row(row);
    }

    table
}

fn format_stat(value: f64) -> String {
    if value.is_nan() { "n/a".to_string() } else { format!("{value:.4}") }
}
