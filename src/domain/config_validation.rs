//! Configuration validation.
//!
//! Validates all config fields before a scoring or backtest run.

use crate::domain::error::TrendrankError;
use crate::domain::score::{Cadence, ScoreWeights};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Ranking rows kept per date when `[score] top_k` is absent.
pub const DEFAULT_TOP_K: usize = 30;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    match config.get_string("data", "price_dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(TrendrankError::ConfigMissing {
                section: "data".to_string(),
                key: "price_dir".to_string(),
            })
        }
    }
    validate_date_range(config, "data", "history_start", "history_end")
}

pub fn validate_score_config(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    validate_cadence(config)?;
    validate_date_range(config, "score", "scan_start", "scan_end")?;
    ranking_depth(config)?;
    validate_weights(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let top_n = required_int(config, "backtest", "top_n")?;
    if top_n < 1 {
        return Err(TrendrankError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "top_n".to_string(),
            reason: "top_n must be at least 1".to_string(),
        });
    }

    let hold_max_rank = required_int(config, "backtest", "hold_max_rank")?;
    if hold_max_rank < top_n {
        return Err(TrendrankError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "hold_max_rank".to_string(),
            reason: format!("hold_max_rank must be >= top_n ({top_n})"),
        });
    }

    let equity = config.get_double("backtest", "starting_equity")?.unwrap_or(1.0);
    if !(equity > 0.0) || !equity.is_finite() {
        return Err(TrendrankError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "starting_equity".to_string(),
            reason: "starting_equity must be positive".to_string(),
        });
    }
    Ok(())
}

fn required_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<i64, TrendrankError> {
    config
        .get_int(section, key)?
        .ok_or_else(|| TrendrankError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn validate_cadence(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    if let Some(value) = config.get_string("score", "cadence") {
        value
            .parse::<Cadence>()
            .map_err(|reason| TrendrankError::ConfigInvalid {
                section: "score".to_string(),
                key: "cadence".to_string(),
                reason,
            })?;
    }
    Ok(())
}

/// Rows kept per ranking date, from `[score] top_k`.
///
/// Both the written rankings and the snapshots `run` backtests are cut to
/// this depth.
pub fn ranking_depth(config: &dyn ConfigPort) -> Result<usize, TrendrankError> {
    match config.get_int("score", "top_k")? {
        None => Ok(DEFAULT_TOP_K),
        Some(value) if value >= 1 => Ok(value as usize),
        Some(_) => Err(TrendrankError::ConfigInvalid {
            section: "score".to_string(),
            key: "top_k".to_string(),
            reason: "top_k must be at least 1".to_string(),
        }),
    }
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let weights = weights_from_config(config)?;
    for (key, value) in [
        ("weight_m6", weights.m6),
        ("weight_m12", weights.m12),
        ("weight_sma", weights.sma),
        ("weight_va", weights.vol_adj),
    ] {
        if !(value >= 0.0) {
            return Err(TrendrankError::ConfigInvalid {
                section: "score".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be non-negative"),
            });
        }
    }
    if !weights.is_normalized() {
        return Err(TrendrankError::ConfigInvalid {
            section: "score".to_string(),
            key: "weight_m6".to_string(),
            reason: format!("weights must sum to 1.0 (got {})", weights.sum()),
        });
    }
    Ok(())
}

/// Score weights from `[score]`, falling back to the defaults per key.
pub fn weights_from_config(config: &dyn ConfigPort) -> Result<ScoreWeights, TrendrankError> {
    let defaults = ScoreWeights::default();
    let weight = |key: &str, default: f64| -> Result<f64, TrendrankError> {
        Ok(config.get_double("score", key)?.unwrap_or(default))
    };
    Ok(ScoreWeights {
        m6: weight("weight_m6", defaults.m6)?,
        m12: weight("weight_m12", defaults.m12)?,
        sma: weight("weight_sma", defaults.sma)?,
        vol_adj: weight("weight_va", defaults.vol_adj)?,
    })
}

fn validate_date_range(
    config: &dyn ConfigPort,
    section: &str,
    start_key: &str,
    end_key: &str,
) -> Result<(), TrendrankError> {
    let start = optional_date(config, section, start_key)?;
    let end = optional_date(config, section, end_key)?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(TrendrankError::ConfigInvalid {
                section: section.to_string(),
                key: start_key.to_string(),
                reason: format!("{start_key} must not be after {end_key}"),
            });
        }
    }
    Ok(())
}

/// Parse an optional YYYY-MM-DD value.
pub fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, TrendrankError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| TrendrankError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {key} format, expected YYYY-MM-DD"),
            }),
    }
}
