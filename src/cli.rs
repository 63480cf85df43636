//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{CsvPriceAdapter, CsvTradeAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report::{
    MarkdownReportAdapter, render_benchmark, render_metrics_table, render_patterns,
    render_recommendations, render_risk_table, render_ticker_table,
};
use crate::domain::analysis::{AnalysisInputs, JournalAnalysis};
use crate::domain::benchmark::DEFAULT_BENCHMARK;
use crate::domain::config_validation::validate_journal_config;
use crate::domain::error::JournalError;
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;
use crate::ports::trade_port::TradePort;

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Trading journal performance and pattern analytics")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print performance, risk and per-ticker statistics
    Analyze {
        #[arg(short, long)]
        trades: PathBuf,
        /// Latest quotes used to mark open trades
        #[arg(short, long)]
        quotes: Option<PathBuf>,
    },
    /// Detect trading patterns and print recommendations
    Patterns {
        #[arg(short, long)]
        trades: PathBuf,
    },
    /// Compare closed-trade returns with a benchmark price series
    Benchmark {
        #[arg(short, long)]
        trades: PathBuf,
        #[arg(short, long)]
        series: PathBuf,
        #[arg(long, default_value = DEFAULT_BENCHMARK)]
        symbol: String,
    },
    /// Write the full Markdown report described by a config file
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load and validate a trades file
    Validate {
        #[arg(short, long)]
        trades: PathBuf,
    },
}

/// Settings for the `report` command, read from a validated config.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub trades_path: PathBuf,
    pub quotes_path: Option<PathBuf>,
    pub benchmark_path: Option<PathBuf>,
    pub benchmark_symbol: String,
    pub output_path: PathBuf,
    pub title: String,
    pub top_tickers: usize,
    pub include_monthly: bool,
    pub log_level: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze { trades, quotes } => {
            init_logging(cli.verbose, None);
            run_analyze(&trades, quotes.as_ref())
        }
        Command::Patterns { trades } => {
            init_logging(cli.verbose, None);
            run_patterns(&trades)
        }
        Command::Benchmark {
            trades,
            series,
            symbol,
        } => {
            init_logging(cli.verbose, None);
            run_benchmark(&trades, &series, &symbol)
        }
        Command::Report { config, output } => run_report(&config, output.as_ref(), cli.verbose),
        Command::Validate { trades } => {
            init_logging(cli.verbose, None);
            run_validate(&trades)
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`, which
/// wins over the configured level. Safe to call more than once.
pub fn init_logging(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = JournalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: JournalError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Relative paths in a config file are resolved against the file's directory.
fn resolve_path(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value.trim());
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

pub fn build_report_settings(
    config: &dyn ConfigPort,
    config_dir: &Path,
) -> Result<ReportSettings, JournalError> {
    validate_journal_config(config)?;

    let optional_path = |key: &str| {
        config
            .get_string("journal", key)
            .map(|v| resolve_path(config_dir, &v))
    };
    let trades_path = optional_path("trades_path").ok_or_else(|| JournalError::ConfigMissing {
        section: "journal".to_string(),
        key: "trades_path".to_string(),
    })?;

    let top_tickers = config.get_int("report", "top_tickers", 0);
    let top_tickers = usize::try_from(top_tickers).map_err(|_| JournalError::ConfigInvalid {
        section: "report".to_string(),
        key: "top_tickers".to_string(),
        reason: "must not be negative".to_string(),
    })?;

    Ok(ReportSettings {
        trades_path,
        quotes_path: optional_path("quotes_path"),
        benchmark_path: optional_path("benchmark_path"),
        benchmark_symbol: config
            .get_string_or("journal", "benchmark_symbol", DEFAULT_BENCHMARK)
            .to_uppercase(),
        output_path: resolve_path(
            config_dir,
            &config.get_string_or("report", "output_path", "report.md"),
        ),
        title: config.get_string_or("report", "title", "Trading Journal Report"),
        top_tickers,
        include_monthly: config.get_bool("report", "include_monthly", true),
        log_level: config
            .get_string("logging", "level")
            .map(|l| l.trim().to_lowercase()),
    })
}

/// Load trades from `port`, treating an empty journal as an error.
pub fn load_trades(port: &dyn TradePort, source_name: &str) -> Result<Vec<Trade>, JournalError> {
    let trades = port.load_trades()?;
    if trades.is_empty() {
        return Err(JournalError::NoTrades {
            source_name: source_name.to_string(),
        });
    }
    Ok(trades)
}

/// Load everything the analysis needs and run it. Quotes are only requested
/// when a price port is supplied, history only when a symbol is named.
pub fn run_analysis_pipeline(
    trade_port: &dyn TradePort,
    source_name: &str,
    price_port: Option<&dyn PricePort>,
    benchmark_symbol: Option<&str>,
) -> Result<JournalAnalysis, JournalError> {
    let trades = load_trades(trade_port, source_name)?;

    let quotes = price_port.map(|p| p.current_prices()).transpose()?;
    let history = match (price_port, benchmark_symbol) {
        (Some(port), Some(symbol)) => Some((symbol, port.price_history(symbol)?)),
        _ => None,
    };

    let inputs = AnalysisInputs {
        quotes: quotes.as_ref(),
        benchmark: history
            .as_ref()
            .map(|(symbol, series)| (*symbol, series.as_slice())),
    };
    let analysis = JournalAnalysis::run(&trades, &inputs);

    if let (Some(symbol), None) = (benchmark_symbol, &analysis.benchmark) {
        warn!(symbol, "benchmark series does not overlap the closed trades");
    }
    info!(
        trades = analysis.metrics.total_trades,
        closed = analysis.metrics.closed_trades,
        patterns = analysis.patterns.summary.total_patterns,
        "analysis finished"
    );
    Ok(analysis)
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

fn run_analyze(trades_path: &PathBuf, quotes_path: Option<&PathBuf>) -> ExitCode {
    let trades = CsvTradeAdapter::new(trades_path.clone());
    let prices = quotes_path.map(|q| CsvPriceAdapter::new().with_quotes(q.clone()));

    let analysis = match run_analysis_pipeline(
        &trades,
        &source_name(trades_path),
        prices.as_ref().map(|p| p as &dyn PricePort),
        None,
    ) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    println!("## Performance\n");
    print!("{}", render_metrics_table(&analysis.metrics));
    println!("## Risk\n");
    print!("{}", render_risk_table(&analysis.risk));
    println!("## By Ticker\n");
    print!("{}", render_ticker_table(&analysis.per_ticker, 0));
    ExitCode::SUCCESS
}

fn run_patterns(trades_path: &PathBuf) -> ExitCode {
    let trades = CsvTradeAdapter::new(trades_path.clone());
    let analysis = match run_analysis_pipeline(&trades, &source_name(trades_path), None, None) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    println!("## Patterns\n");
    print!("{}", render_patterns(&analysis.patterns));
    println!("## Recommendations\n");
    print!("{}", render_recommendations(&analysis.recommendations));
    ExitCode::SUCCESS
}

fn run_benchmark(trades_path: &PathBuf, series_path: &PathBuf, symbol: &str) -> ExitCode {
    let trades = CsvTradeAdapter::new(trades_path.clone());
    let prices = CsvPriceAdapter::new().with_history(symbol, series_path.clone());

    let analysis = match run_analysis_pipeline(
        &trades,
        &source_name(trades_path),
        Some(&prices),
        Some(symbol),
    ) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    match &analysis.benchmark {
        Some(cmp) => {
            print!("{}", render_benchmark(cmp, true));
            ExitCode::SUCCESS
        }
        None => fail(JournalError::NoPriceData {
            symbol: symbol.to_string(),
        }),
    }
}

fn run_report(config_path: &PathBuf, output_override: Option<&PathBuf>, verbose: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let settings = match build_report_settings(&config, config_dir) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    init_logging(verbose, settings.log_level.as_deref());
    debug!(?settings, "report settings");

    match write_report(&settings, output_override) {
        Ok(path) => {
            eprintln!("Report written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Run the configured analysis and write it with the Markdown adapter.
/// Returns the path written.
pub fn write_report(
    settings: &ReportSettings,
    output_override: Option<&PathBuf>,
) -> Result<PathBuf, JournalError> {
    let trades = CsvTradeAdapter::new(settings.trades_path.clone());

    let mut prices = CsvPriceAdapter::new();
    if let Some(q) = &settings.quotes_path {
        prices = prices.with_quotes(q.clone());
    }
    if let Some(b) = &settings.benchmark_path {
        prices = prices.with_history(&settings.benchmark_symbol, b.clone());
    }
    let symbol = settings
        .benchmark_path
        .as_ref()
        .map(|_| settings.benchmark_symbol.as_str());

    let analysis = run_analysis_pipeline(
        &trades,
        &source_name(&settings.trades_path),
        Some(&prices),
        symbol,
    )?;

    let output = output_override
        .cloned()
        .unwrap_or_else(|| settings.output_path.clone());
    let report = MarkdownReportAdapter::new(settings.top_tickers, settings.include_monthly);
    report.write(&analysis, &settings.title, &output.display().to_string())?;
    Ok(output)
}

fn run_validate(trades_path: &PathBuf) -> ExitCode {
    eprintln!("Validating trades: {}", trades_path.display());
    let adapter = CsvTradeAdapter::new(trades_path.clone());
    let trades = match load_trades(&adapter, &source_name(trades_path)) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    let open = trades.iter().filter(|t| t.is_open()).count();
    let mut tickers: Vec<&str> = trades.iter().map(|t| t.ticker.as_str()).collect();
    tickers.sort_unstable();
    tickers.dedup();

    eprintln!(
        "{} trades are valid ({} closed, {} open) across {} tickers.",
        trades.len(),
        trades.len() - open,
        open,
        tickers.len()
    );
    ExitCode::SUCCESS
}
