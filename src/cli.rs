//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_data_config, validate_strategy_config};
use crate::domain::error::VixpeError;
use crate::domain::observation::Observation;
use crate::domain::rule::Rule;
use crate::domain::rule_parser;
use crate::domain::series::{self, ColumnMap, DateFormat};
use crate::domain::strategy::{EntryCombine, Strategy, ThresholdRules};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "vixpe", about = "VIX + PE threshold strategy backtester")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV series
    Backtest {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the trade table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip malformed rows instead of failing
        #[arg(long)]
        lenient: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Show row count, date range and indicator ranges of a series
    Info {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            data,
            config,
            output,
            lenient,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&data, config.as_deref())
            } else {
                run_backtest(&data, config.as_deref(), output.as_deref(), lenient)
            }
        }
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Info { data, config } => run_info(&data, config.as_deref()),
    }
}

fn fail(err: VixpeError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

/// Load the INI file, or an empty config (all defaults) when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, VixpeError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, VixpeError> {
    validate_data_config(adapter)?;

    let defaults = ColumnMap::default();
    let column = |key: &str, default: String| {
        adapter
            .get_string("data", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
    };

    let date_format = match adapter.get_string("data", "date_format") {
        Some(fmt) => DateFormat::Fixed(fmt.trim().to_string()),
        None => DateFormat::Auto,
    };

    Ok(BacktestConfig {
        columns: ColumnMap {
            date: column("date_column", defaults.date),
            close: column("close_column", defaults.close),
            indicator_a: column("indicator_a_column", defaults.indicator_a),
            indicator_b: column("indicator_b_column", defaults.indicator_b),
        },
        date_format,
        lenient: adapter.get_bool("data", "lenient", false),
    })
}

pub fn build_threshold_rules(adapter: &dyn ConfigPort) -> Result<ThresholdRules, VixpeError> {
    let defaults = ThresholdRules::default();

    let entry_combine = match adapter
        .get_string("strategy", "entry_combine")
        .filter(|s| !s.trim().is_empty())
    {
        Some(s) => s
            .parse::<EntryCombine>()
            .map_err(|reason| VixpeError::ConfigInvalid {
                section: "strategy".into(),
                key: "entry_combine".into(),
                reason,
            })?,
        None => defaults.entry_combine,
    };

    let holding = adapter.get_int(
        "strategy",
        "max_holding_days",
        defaults.max_holding_days.unwrap_or(0),
    );

    Ok(ThresholdRules {
        entry_a_max: adapter.get_double("strategy", "entry_a_max", defaults.entry_a_max),
        entry_b_max: adapter.get_double("strategy", "entry_b_max", defaults.entry_b_max),
        entry_combine,
        exit_a_min: adapter.get_double("strategy", "exit_a_min", defaults.exit_a_min),
        exit_b_min: adapter.get_double("strategy", "exit_b_min", defaults.exit_b_min),
        max_holding_days: (holding > 0).then_some(holding),
    })
}

fn parse_rule_key(adapter: &dyn ConfigPort, key: &str) -> Result<Option<Rule>, VixpeError> {
    match adapter
        .get_string("strategy", key)
        .filter(|s| !s.trim().is_empty())
    {
        Some(text) => match rule_parser::parse(&text) {
            Ok(rule) => Ok(Some(rule)),
            Err(e) => {
                eprintln!(
                    "error: failed to parse {}:\n{}",
                    key,
                    e.display_with_context(&text)
                );
                Err(e.into())
            }
        },
        None => Ok(None),
    }
}

/// Build the strategy from `[strategy]`: threshold keys first, then `entry` /
/// `exit` rule expressions replace the corresponding generated rule.
pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, VixpeError> {
    let entry = parse_rule_key(adapter, "entry")?;
    let exit = parse_rule_key(adapter, "exit")?;
    validate_strategy_config(adapter)?;

    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "VIX + PE".to_string());
    let mut strategy = build_threshold_rules(adapter)?.into_strategy(&name);

    let overridden = entry.is_some() || exit.is_some();
    if let Some(rule) = entry {
        strategy.entry = rule;
    }
    if let Some(rule) = exit {
        strategy.exit = rule;
    }
    if overridden {
        strategy.description = format!("entry: {}; exit: {}", strategy.entry, strategy.exit);
    }
    if let Some(description) = adapter.get_string("strategy", "description") {
        strategy.description = description;
    }

    Ok(strategy)
}

fn run_backtest(
    data_path: &Path,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    lenient: bool,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    bt_config.lenient |= lenient;

    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    eprintln!("Loading strategy: {}", strategy.name);

    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let reporter = CsvReportAdapter;
    let output = output_path.map(|p| p.display().to_string());
    let report = output
        .as_deref()
        .map(|path| (&reporter as &dyn ReportPort, path));

    run_backtest_pipeline(&data_port, &strategy, &bt_config, report)
}

/// Load, simulate, summarize and optionally write a report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    report: Option<(&dyn ReportPort, &str)>,
) -> ExitCode {
    let series = match data_port.load_series() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("Running backtest over {} rows", series.len());
    let result = match backtest_engine::run_backtest(&series, strategy, bt_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print!("{}", format_trade_table(&result));
    eprint!("{}", format_summary(&result));

    if let Some((port, path)) = report {
        if let Err(e) = port.write(&result, strategy, path) {
            return fail(e);
        }
        eprintln!("\nTrades written to: {}", path);
    }

    ExitCode::SUCCESS
}

pub fn format_trade_table(result: &BacktestResult) -> String {
    let mut out = format!(
        "{:<12} {:<12} {:>12} {:>12} {:>10} {:>6}\n",
        "Entry Date", "Exit Date", "Entry Price", "Exit Price", "Return(%)", "Days"
    );
    for t in &result.trades {
        out.push_str(&format!(
            "{:<12} {:<12} {:>12.2} {:>12.2} {:>10.2} {:>6}\n",
            t.entry_date.to_string(),
            t.exit_date.to_string(),
            t.entry_price,
            t.exit_price,
            t.return_pct,
            t.holding_days
        ));
    }
    out
}

pub fn format_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::from("\n=== Results ===\n");
    out.push_str(&format!("Observations:     {}\n", result.observations));
    if result.skipped_rows > 0 {
        out.push_str(&format!("Skipped rows:     {}\n", result.skipped_rows));
    }
    out.push_str(&format!("Total Trades:     {}\n", m.total_trades));
    out.push_str(&format!("Win Rate:         {:.2}%\n", result.win_rate));
    out.push_str(&format!(
        "Average Return per Trade: {:.2}%\n",
        result.avg_return
    ));
    if m.total_trades > 0 {
        out.push_str(&format!(
            "Won/Lost/Even:    {}/{}/{}\n",
            m.trades_won, m.trades_lost, m.trades_breakeven
        ));
        out.push_str(&format!("Best Trade:       {:.2}%\n", m.best_return));
        out.push_str(&format!("Worst Trade:      {:.2}%\n", m.worst_return));
        out.push_str(&format!("Avg Holding:      {:.1} days\n", m.avg_holding_days));
        out.push_str(&format!("Compounded:       {:.2}%\n", m.total_return));
    }
    out
}

pub fn run_dry_run(data_path: &Path, config_path: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    eprintln!("Config validated successfully");

    eprintln!("\nStrategy: {}", strategy.name);
    eprintln!("  entry: {}", strategy.entry);
    eprintln!("  exit:  {}", strategy.exit);

    let cols = &bt_config.columns;
    eprintln!("\nColumns:");
    eprintln!("  date:        {}", cols.date);
    eprintln!("  close:       {}", cols.close);
    eprintln!("  indicator_a: {}", cols.indicator_a);
    eprintln!("  indicator_b: {}", cols.indicator_b);

    let raw = match CsvAdapter::new(data_path.to_path_buf()).load_series() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if let Err(e) = series::validate_schema(&raw, cols) {
        return fail(e);
    }

    eprintln!("\nDry run complete: {} rows, schema is valid", raw.len());
    ExitCode::SUCCESS
}

fn run_validate(strategy_path: &Path) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = match load_config(Some(strategy_path)) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("\nEntry Rule:");
    eprintln!("  Parsed: {}", strategy.entry);
    eprintln!("\nExit Rule:");
    eprintln!("  Parsed: {}", strategy.exit);
    if !strategy.exit.uses_holding_days() {
        eprintln!("  (no holding-period exit)");
    }

    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn run_info(data_path: &Path, config_path: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let raw = match CsvAdapter::new(data_path.to_path_buf()).load_series() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let parsed = match series::parse_observations(
        &raw,
        &bt_config.columns,
        &bt_config.date_format,
        true,
    ) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    println!(
        "{}: {} rows ({} malformed)",
        data_path.display(),
        raw.len(),
        parsed.skipped_rows
    );
    match describe(&parsed.observations) {
        Some(summary) => println!("{}", summary),
        None => eprintln!("no valid observations"),
    }
    ExitCode::SUCCESS
}

fn describe(observations: &[Observation]) -> Option<String> {
    let first = observations.iter().map(|o| o.date).min()?;
    let last = observations.iter().map(|o| o.date).max()?;
    let range = |f: fn(&Observation) -> f64| {
        observations
            .iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    };
    let (close_lo, close_hi) = range(|o| o.close);
    let (a_lo, a_hi) = range(|o| o.indicator_a);
    let (b_lo, b_hi) = range(|o| o.indicator_b);
    Some(format!(
        "dates:       {} to {}\nclose:       {:.2} to {:.2}\nindicator_a: {:.2} to {:.2}\nindicator_b: {:.2} to {:.2}",
        first, last, close_lo, close_hi, a_lo, a_hi, b_lo, b_hi
    ))
}
