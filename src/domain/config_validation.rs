//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Every key is optional;
//! these checks only reject values that are present but unusable.

use crate::domain::error::VixpeError;
use crate::domain::rule_parser;
use crate::domain::strategy::EntryCombine;
use crate::ports::config_port::ConfigPort;

const THRESHOLD_KEYS: &[&str] = &["entry_a_max", "entry_b_max", "exit_a_min", "exit_b_min"];

const COLUMN_KEYS: &[&str] = &[
    "date_column",
    "close_column",
    "indicator_a_column",
    "indicator_b_column",
];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    validate_columns(config)?;
    validate_date_format(config)?;
    validate_lenient(config)?;
    Ok(())
}

/// Boolean spellings accepted in config files.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    validate_thresholds(config)?;
    validate_entry_combine(config)?;
    validate_max_holding_days(config)?;
    validate_rules(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> VixpeError {
    VixpeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_columns(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    for key in COLUMN_KEYS {
        if let Some(value) = config.get_string("data", key) {
            if value.trim().is_empty() {
                return Err(invalid("data", key, "column name must not be blank"));
            }
        }
    }
    Ok(())
}

fn validate_date_format(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    match config.get_string("data", "date_format") {
        Some(fmt) if fmt.trim().is_empty() => {
            Err(invalid("data", "date_format", "date_format must not be blank"))
        }
        Some(fmt) if !fmt.contains('%') => Err(invalid(
            "data",
            "date_format",
            "date_format must contain strftime specifiers such as %Y-%m-%d",
        )),
        _ => Ok(()),
    }
}

fn validate_lenient(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    if let Some(raw) = present(config, "data", "lenient") {
        if parse_flag(&raw).is_none() {
            return Err(invalid(
                "data",
                "lenient",
                format!("expected true/false, yes/no, on/off or 1/0, found '{}'", raw),
            ));
        }
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    for key in THRESHOLD_KEYS {
        if let Some(raw) = present(config, "strategy", key) {
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => {}
                _ => return Err(invalid("strategy", key, "threshold must be a finite number")),
            }
        }
    }
    Ok(())
}

fn validate_entry_combine(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    if let Some(raw) = present(config, "strategy", "entry_combine") {
        raw.parse::<EntryCombine>()
            .map_err(|reason| invalid("strategy", "entry_combine", reason))?;
    }
    Ok(())
}

fn validate_max_holding_days(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    if let Some(raw) = present(config, "strategy", "max_holding_days") {
        match raw.parse::<i64>() {
            Ok(v) if v >= 0 => {}
            _ => {
                return Err(invalid(
                    "strategy",
                    "max_holding_days",
                    "max_holding_days must be a non-negative integer (0 disables)",
                ));
            }
        }
    }
    Ok(())
}

fn validate_rules(config: &dyn ConfigPort) -> Result<(), VixpeError> {
    if let Some(entry) = present(config, "strategy", "entry") {
        let rule = rule_parser::parse(&entry)?;
        if rule.uses_holding_days() {
            return Err(VixpeError::RuleInvalid {
                reason: "entry rule cannot reference holding_days".to_string(),
            });
        }
    }
    if let Some(exit) = present(config, "strategy", "exit") {
        rule_parser::parse(&exit)?;
    }
    Ok(())
}
