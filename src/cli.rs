//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::rank_csv_adapter::RankCsvAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    optional_date, ranking_depth, validate_backtest_config, validate_data_config,
    validate_score_config, weights_from_config,
};
use crate::domain::error::TrendrankError;
use crate::domain::metrics::Metrics;
use crate::domain::price_history::PriceHistory;
use crate::domain::price_lookup::PriceLookup;
use crate::domain::rank_snapshot::{group_rank_rows, RankSnapshot};
use crate::domain::score::{compute_score_tables, Cadence, ScoreParams, ScoreTable};
use crate::domain::universe::{load_universe, parse_tickers, UniverseLoad};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::rank_port::RankPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "trendrank", about = "Trend-score ranking and rotation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the universe and write rankings
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma separated tickers, overriding [universe]
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Backtest the rotation over a rankings file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        rankings: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Score the universe, then backtest the fresh rankings
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Validate a configuration without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in the price directory
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Score {
            config,
            output,
            tickers,
        } => run_score(&config, output.as_deref(), tickers.as_deref()),
        Command::Backtest {
            config,
            rankings,
            output_dir,
        } => run_backtest_command(&config, rankings.as_deref(), output_dir.as_deref()),
        Command::Run {
            config,
            output_dir,
            tickers,
        } => run_full(&config, output_dir.as_deref(), tickers.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListInstruments { config } => run_list_instruments(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendrankError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_score_params(adapter: &dyn ConfigPort) -> Result<ScoreParams, TrendrankError> {
    let cadence = match adapter.get_string("score", "cadence") {
        Some(s) => s
            .parse::<Cadence>()
            .map_err(|reason| TrendrankError::ConfigInvalid {
                section: "score".into(),
                key: "cadence".into(),
                reason,
            })?,
        None => Cadence::Daily,
    };
    Ok(ScoreParams {
        weights: weights_from_config(adapter)?,
        ..ScoreParams::for_cadence(cadence)
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TrendrankError> {
    validate_backtest_config(adapter)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        top_n: adapter
            .get_int("backtest", "top_n")?
            .map_or(defaults.top_n, |v| v as usize),
        hold_max_rank: adapter
            .get_int("backtest", "hold_max_rank")?
            .map_or(defaults.hold_max_rank, |v| v as usize),
        starting_equity: adapter
            .get_double("backtest", "starting_equity")?
            .unwrap_or(defaults.starting_equity),
    })
}

fn price_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, TrendrankError> {
    validate_data_config(adapter)?;
    let dir = adapter
        .get_string("data", "price_dir")
        .ok_or_else(|| TrendrankError::ConfigMissing {
            section: "data".into(),
            key: "price_dir".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

fn history_range(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), TrendrankError> {
    Ok((
        optional_date(adapter, "data", "history_start")?.unwrap_or(NaiveDate::MIN),
        optional_date(adapter, "data", "history_end")?.unwrap_or(NaiveDate::MAX),
    ))
}

/// Tickers from, in order of precedence: the command line, `[universe]
/// tickers`, `[universe] tickers_file`, or every instrument in the price
/// directory.
pub fn resolve_universe(
    override_list: Option<&str>,
    adapter: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, TrendrankError> {
    if let Some(list) = override_list {
        return Ok(parse_tickers(list)?);
    }
    if let Some(list) = adapter.get_string("universe", "tickers") {
        return Ok(parse_tickers(&list)?);
    }
    if let Some(file) = adapter.get_string("universe", "tickers_file") {
        let content = fs::read_to_string(file.trim()).map_err(|e| TrendrankError::Data {
            source_name: file.clone(),
            reason: e.to_string(),
        })?;
        return Ok(parse_tickers(&content)?);
    }
    let all = data_port.list_instruments()?;
    if all.is_empty() {
        return Err(TrendrankError::ConfigMissing {
            section: "universe".into(),
            key: "tickers".into(),
        });
    }
    Ok(all)
}

fn output_dir(override_dir: Option<&Path>, adapter: &dyn ConfigPort) -> PathBuf {
    override_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        adapter
            .get_string("backtest", "output_dir")
            .map(|s| PathBuf::from(s.trim()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Load history, score every evaluation date and write rankings (and
/// coverage when enabled).
pub fn run_score_pipeline(
    adapter: &dyn ConfigPort,
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    tickers: &[String],
    output: &Path,
) -> Result<(PriceHistory, Vec<ScoreTable>), TrendrankError> {
    validate_score_config(adapter)?;
    let params = build_score_params(adapter)?;
    let (start, end) = history_range(adapter)?;

    eprintln!("Loading {} tickers...", tickers.len());
    let load: UniverseLoad = load_universe(data_port, tickers, start, end)?;
    let universe = load.loaded();

    if adapter.get_bool("score", "write_coverage", true) {
        report_port.write_coverage(&output.with_file_name("coverage.csv"), &load.coverage)?;
    }

    let history = PriceHistory::from_bars(load.bars);
    let scan_start = optional_date(adapter, "score", "scan_start")?.unwrap_or(NaiveDate::MIN);
    let scan_end = optional_date(adapter, "score", "scan_end")?.unwrap_or(NaiveDate::MAX);

    eprintln!(
        "Scoring {} instruments ({} cadence, {} history rows)",
        universe.len(),
        params.cadence,
        history.len()
    );
    let tables = compute_score_tables(&history, &universe, &params, scan_start, scan_end);
    if tables.is_empty() {
        return Err(TrendrankError::NoSnapshots);
    }

    report_port.write_rankings(output, &tables)?;
    eprintln!(
        "  {} snapshots, {} to {}",
        tables.len(),
        tables[0].date,
        tables[tables.len() - 1].date
    );
    Ok((history, tables))
}

/// Run the rotation, write trades and equity, print the summary.
pub fn run_backtest_pipeline(
    snapshots: &[RankSnapshot],
    prices: &PriceLookup,
    bt_config: &BacktestConfig,
    report_port: &dyn ReportPort,
    output_dir: &Path,
) -> Result<BacktestResult, TrendrankError> {
    eprintln!(
        "Running backtest: {} snapshots, top_n {}, hold_max_rank {}",
        snapshots.len(),
        bt_config.top_n,
        bt_config.hold_max_rank
    );

    let result = run_backtest(snapshots, prices, bt_config)?;

    report_port.write_trades(&output_dir.join("trades.csv"), &result.events)?;
    report_port.write_equity(&output_dir.join("equity.csv"), &result.equity_curve)?;

    let metrics = Metrics::compute(&result.equity_curve, &result.events, bt_config.starting_equity);
    print_summary(&metrics, &result);
    Ok(result)
}

fn print_summary(metrics: &Metrics, result: &BacktestResult) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Final Equity:     {:.4}", result.final_equity());
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annual Return:    {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Closed Trades:    {}", metrics.closed_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Avg Return:       {:.2}%", metrics.avg_return_pct);
    eprintln!("Best / Worst:     {:.2}% / {:.2}%", metrics.best_return_pct, metrics.worst_return_pct);
    if metrics.unfilled_exits > 0 {
        eprintln!("Unfilled Exits:   {}", metrics.unfilled_exits);
    }
}

fn run_score(config_path: &Path, output: Option<&Path>, tickers: Option<&str>) -> Result<(), TrendrankError> {
    let config = load_config(config_path)?;
    let data_port = price_adapter(&config)?;
    let tickers = resolve_universe(tickers, &config, &data_port)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| rankings_path(&config));
    let report = CsvReportAdapter::new(ranking_depth(&config)?);

    run_score_pipeline(&config, &data_port, &report, &tickers, &output)?;
    eprintln!("\nRankings written to: {}", output.display());
    Ok(())
}

fn rankings_path(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("score", "output")
        .map(|s| PathBuf::from(s.trim()))
        .unwrap_or_else(|| PathBuf::from("rankings.csv"))
}

fn run_backtest_command(
    config_path: &Path,
    rankings: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), TrendrankError> {
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config)?;
    let data_port = price_adapter(&config)?;

    let rankings = match rankings {
        Some(p) => p.to_path_buf(),
        None => config
            .get_string("backtest", "rankings")
            .map(|s| PathBuf::from(s.trim()))
            .ok_or_else(|| TrendrankError::ConfigMissing {
                section: "backtest".into(),
                key: "rankings".into(),
            })?,
    };

    eprintln!("Loading rankings from {}", rankings.display());
    let rows = RankCsvAdapter::new(rankings).load_rank_rows()?;
    let tickers: Vec<String> = rows
        .iter()
        .map(|r| r.instrument.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let snapshots = group_rank_rows(rows)?;

    let (start, end) = history_range(&config)?;
    eprintln!("Loading prices for {} tickers...", tickers.len());
    let load = load_universe(&data_port, &tickers, start, end)?;
    let prices = PriceLookup::from_history(&PriceHistory::from_bars(load.bars));

    let out_dir = output_dir(output_override, &config);
    run_backtest_pipeline(&snapshots, &prices, &bt_config, &CsvReportAdapter::default(), &out_dir)?;
    eprintln!("\nResults written to: {}", out_dir.display());
    Ok(())
}

fn run_full(
    config_path: &Path,
    output_override: Option<&Path>,
    tickers: Option<&str>,
) -> Result<(), TrendrankError> {
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config)?;
    let data_port = price_adapter(&config)?;
    let tickers = resolve_universe(tickers, &config, &data_port)?;
    let out_dir = output_dir(output_override, &config);
    let depth = ranking_depth(&config)?;
    let report = CsvReportAdapter::new(depth);

    let (history, tables) =
        run_score_pipeline(&config, &data_port, &report, &tickers, &out_dir.join("rankings.csv"))?;
    let snapshots = backtest_snapshots(&tables, depth);
    let prices = PriceLookup::from_history(&history);

    run_backtest_pipeline(&snapshots, &prices, &bt_config, &report, &out_dir)?;
    eprintln!("\nResults written to: {}", out_dir.display());
    Ok(())
}

/// Snapshots cut to the written ranking depth, so `run` trades exactly what
/// `score` followed by `backtest` would.
pub fn backtest_snapshots(tables: &[ScoreTable], depth: usize) -> Vec<RankSnapshot> {
    tables.iter().map(|t| t.snapshot().top(depth)).collect()
}

fn run_validate(config_path: &Path) -> Result<(), TrendrankError> {
    let config = load_config(config_path)?;

    validate_data_config(&config)?;
    validate_score_config(&config)?;
    let params = build_score_params(&config)?;
    eprintln!("\nScore parameters:");
    eprintln!("  cadence:  {}", params.cadence);
    eprintln!(
        "  windows:  m6 {}, m12 {}, sma {}/{}/{}, atr {}",
        params.m6_period,
        params.m12_period,
        params.sma_short,
        params.sma_mid,
        params.sma_long,
        params.atr_window
    );
    eprintln!(
        "  weights:  m6 {}, m12 {}, sma {}, va {}",
        params.weights.m6, params.weights.m12, params.weights.sma, params.weights.vol_adj
    );

    if config.get_string("backtest", "top_n").is_some() {
        let bt = build_backtest_config(&config)?;
        eprintln!("\nBacktest:");
        eprintln!("  top_n:         {}", bt.top_n);
        eprintln!("  hold_max_rank: {}", bt.hold_max_rank);
        eprintln!("  equity:        {}", bt.starting_equity);
    }

    let data_port = price_adapter(&config)?;
    let tickers = resolve_universe(None, &config, &data_port)?;
    eprintln!("\nUniverse: {} tickers", tickers.len());

    eprintln!("\nConfiguration is valid");
    Ok(())
}

fn run_list_instruments(config_path: &Path) -> Result<(), TrendrankError> {
    let config = load_config(config_path)?;
    let data_port = price_adapter(&config)?;
    let instruments = data_port.list_instruments()?;

    if instruments.is_empty() {
        eprintln!("No instruments found");
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        eprintln!("{} instruments found", instruments.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::score::{Factors, ScoredInstrument};

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn score_params_follow_cadence() {
        let params = build_score_params(&config("[score]\ncadence = weekly\n")).unwrap();
        assert_eq!(params, ScoreParams::weekly());

        let params = build_score_params(&config("[score]\n")).unwrap();
        assert_eq!(params.cadence, Cadence::Daily);
    }

    #[test]
    fn score_params_read_weights() {
        let params = build_score_params(&config(
            "[score]\nweight_m6 = 0.4\nweight_m12 = 0.4\nweight_sma = 0.1\nweight_va = 0.1\n",
        ))
        .unwrap();
        assert_eq!(params.weights.m6, 0.4);
        assert_eq!(params.weights.vol_adj, 0.1);
    }

    #[test]
    fn score_params_reject_bad_cadence() {
        let err = build_score_params(&config("[score]\ncadence = hourly\n")).unwrap_err();
        assert!(matches!(err, TrendrankError::ConfigInvalid { key, .. } if key == "cadence"));
    }

    #[test]
    fn backtest_config_reads_values() {
        let bt = build_backtest_config(&config(
            "[backtest]\ntop_n = 3\nhold_max_rank = 6\nstarting_equity = 100\n",
        ))
        .unwrap();
        assert_eq!(
            bt,
            BacktestConfig {
                top_n: 3,
                hold_max_rank: 6,
                starting_equity: 100.0,
            }
        );
    }

    #[test]
    fn backtest_config_defaults_equity() {
        let bt = build_backtest_config(&config("[backtest]\ntop_n = 2\nhold_max_rank = 2\n")).unwrap();
        assert_eq!(bt.starting_equity, 1.0);
    }

    #[test]
    fn backtest_config_requires_top_n() {
        let err = build_backtest_config(&config("[backtest]\nhold_max_rank = 2\n")).unwrap_err();
        assert!(matches!(err, TrendrankError::ConfigMissing { key, .. } if key == "top_n"));
    }

    #[test]
    fn backtest_config_rejects_non_numeric_equity() {
        let err = build_backtest_config(&config(
            "[backtest]\ntop_n = 2\nhold_max_rank = 2\nstarting_equity = lots\n",
        ))
        .unwrap_err();
        assert!(matches!(err, TrendrankError::ConfigInvalid { key, .. } if key == "starting_equity"));
    }

    #[test]
    fn backtest_snapshots_keep_ranking_depth() {
        let row = |instrument: &str, rank: usize, score: f64| ScoredInstrument {
            instrument: instrument.to_string(),
            rank,
            score,
            factors: Factors {
                m6: 0.0,
                m12: 0.0,
                sma_norm: 0.0,
                va_raw: 0.0,
            },
        };
        let table = ScoreTable {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            rows: vec![row("AAA", 1, 0.9), row("BBB", 2, 0.8), row("CCC", 3, 0.7)],
        };

        let snaps = backtest_snapshots(&[table], 2);
        assert_eq!(snaps[0].ordered().collect::<Vec<_>>(), vec!["AAA", "BBB"]);
        assert_eq!(snaps[0].rank_of("CCC"), None);
    }

    #[test]
    fn output_dir_precedence() {
        let c = config("[backtest]\noutput_dir = results\n");
        assert_eq!(output_dir(None, &c), PathBuf::from("results"));
        assert_eq!(output_dir(Some(Path::new("cli")), &c), PathBuf::from("cli"));
        assert_eq!(output_dir(None, &config("[backtest]\n")), PathBuf::from("."));
    }
}
