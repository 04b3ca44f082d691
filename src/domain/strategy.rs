//! Strategy configuration and composition.
//!
//! A [`Strategy`] is an entry rule and an exit rule. [`ThresholdRules`] builds
//! the standard VIX/PE shape from plain numbers:
//!
//! ```text
//! entry: indicator_a <= entry_a_max  AND|OR  indicator_b <= entry_b_max
//! exit:  indicator_a >= exit_a_min  OR  indicator_b >= exit_b_min
//!        [OR holding_days >= max_holding_days]
//! ```

use crate::domain::rule::{Operand, Rule};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub entry: Rule,
    pub exit: Rule,
}

impl Default for Strategy {
    fn default() -> Self {
        ThresholdRules::default().into_strategy("VIX + PE")
    }
}

/// How the two entry clauses combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryCombine {
    #[default]
    And,
    Or,
}

impl FromStr for EntryCombine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(EntryCombine::And),
            "or" => Ok(EntryCombine::Or),
            other => Err(format!("expected 'and' or 'or', found '{}'", other)),
        }
    }
}

impl fmt::Display for EntryCombine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryCombine::And => write!(f, "and"),
            EntryCombine::Or => write!(f, "or"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRules {
    pub entry_a_max: f64,
    pub entry_b_max: f64,
    pub entry_combine: EntryCombine,
    pub exit_a_min: f64,
    pub exit_b_min: f64,
    /// `None` disables the holding-period exit.
    pub max_holding_days: Option<i64>,
}

impl Default for ThresholdRules {
    fn default() -> Self {
        Self {
            entry_a_max: 13.0,
            entry_b_max: 18.0,
            entry_combine: EntryCombine::And,
            exit_a_min: 18.0,
            exit_b_min: 22.0,
            max_holding_days: Some(30),
        }
    }
}

impl ThresholdRules {
    pub fn entry_rule(&self) -> Rule {
        let clauses = vec![
            Rule::AtMost {
                left: Operand::IndicatorA,
                right: Operand::Constant(self.entry_a_max),
            },
            Rule::AtMost {
                left: Operand::IndicatorB,
                right: Operand::Constant(self.entry_b_max),
            },
        ];
        match self.entry_combine {
            EntryCombine::And => Rule::And(clauses),
            EntryCombine::Or => Rule::Or(clauses),
        }
    }

    pub fn exit_rule(&self) -> Rule {
        let mut clauses = vec![
            Rule::AtLeast {
                left: Operand::IndicatorA,
                right: Operand::Constant(self.exit_a_min),
            },
            Rule::AtLeast {
                left: Operand::IndicatorB,
                right: Operand::Constant(self.exit_b_min),
            },
        ];
        if let Some(days) = self.max_holding_days {
            clauses.push(Rule::AtLeast {
                left: Operand::HoldingDays,
                right: Operand::Constant(days as f64),
            });
        }
        Rule::Or(clauses)
    }

    pub fn into_strategy(self, name: &str) -> Strategy {
        let holding = match self.max_holding_days {
            Some(days) => format!(", or after {} days", days),
            None => String::new(),
        };
        Strategy {
            name: name.to_string(),
            description: format!(
                "enter when indicator_a <= {} {} indicator_b <= {}; exit when indicator_a >= {} or indicator_b >= {}{}",
                self.entry_a_max,
                self.entry_combine,
                self.entry_b_max,
                self.exit_a_min,
                self.exit_b_min,
                holding,
            ),
            entry: self.entry_rule(),
            exit: self.exit_rule(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_match_text_form() {
        let rules = ThresholdRules::default();
        assert_eq!(
            rules.entry_rule().to_string(),
            "AND(AT_MOST(indicator_a, 13), AT_MOST(indicator_b, 18))"
        );
        assert_eq!(
            rules.exit_rule().to_string(),
            "OR(AT_LEAST(indicator_a, 18), AT_LEAST(indicator_b, 22), AT_LEAST(holding_days, 30))"
        );
    }

    #[test]
    fn or_combined_entry() {
        let rules = ThresholdRules {
            entry_combine: EntryCombine::Or,
            ..ThresholdRules::default()
        };
        assert!(matches!(rules.entry_rule(), Rule::Or(ref c) if c.len() == 2));
    }

    #[test]
    fn holding_exit_can_be_disabled() {
        let rules = ThresholdRules {
            max_holding_days: None,
            ..ThresholdRules::default()
        };
        let exit = rules.exit_rule();
        assert!(!exit.uses_holding_days());
        assert!(matches!(exit, Rule::Or(ref c) if c.len() == 2));
    }

    #[test]
    fn entry_combine_from_str() {
        assert_eq!("AND".parse::<EntryCombine>(), Ok(EntryCombine::And));
        assert_eq!(" or ".parse::<EntryCombine>(), Ok(EntryCombine::Or));
        assert!("xor".parse::<EntryCombine>().is_err());
    }

    #[test]
    fn default_strategy() {
        let s = Strategy::default();
        assert_eq!(s.name, "VIX + PE");
        assert!(s.description.contains("after 30 days"));
        assert!(!s.entry.uses_holding_days());
        assert!(s.exit.uses_holding_days());
    }
}
