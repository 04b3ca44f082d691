//! Rule AST data structures.
//!
//! - `Operand`: What can be compared (close price, indicators, holding period, constants)
//! - `Rule`: Threshold comparisons and their boolean composition
//!
//! `Display` renders a rule back into the text form accepted by
//! [`rule_parser::parse`](crate::domain::rule_parser::parse).

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Close,
    IndicatorA,
    IndicatorB,
    /// Calendar days since entry. NaN while no position is open.
    HoldingDays,
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Above {
        left: Operand,
        right: Operand,
    },
    Below {
        left: Operand,
        right: Operand,
    },
    AtLeast {
        left: Operand,
        right: Operand,
    },
    AtMost {
        left: Operand,
        right: Operand,
    },
    Equals {
        left: Operand,
        right: Operand,
    },
    Between {
        operand: Operand,
        lower: f64,
        upper: f64,
    },
    And(Vec<Rule>),
    Or(Vec<Rule>),
    Not(Box<Rule>),
}

impl Rule {
    /// True if any comparison in the tree reads `holding_days`.
    pub fn uses_holding_days(&self) -> bool {
        match self {
            Rule::Above { left, right }
            | Rule::Below { left, right }
            | Rule::AtLeast { left, right }
            | Rule::AtMost { left, right }
            | Rule::Equals { left, right } => {
                *left == Operand::HoldingDays || *right == Operand::HoldingDays
            }
            Rule::Between { operand, .. } => *operand == Operand::HoldingDays,
            Rule::And(rules) | Rule::Or(rules) => rules.iter().any(Rule::uses_holding_days),
            Rule::Not(rule) => rule.uses_holding_days(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Close => write!(f, "close"),
            Operand::IndicatorA => write!(f, "indicator_a"),
            Operand::IndicatorB => write!(f, "indicator_b"),
            Operand::HoldingDays => write!(f, "holding_days"),
            Operand::Constant(v) => write!(f, "{}", v),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, rules: &[Rule]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", rule)?;
    }
    write!(f, ")")
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Above { left, right } => write!(f, "ABOVE({}, {})", left, right),
            Rule::Below { left, right } => write!(f, "BELOW({}, {})", left, right),
            Rule::AtLeast { left, right } => write!(f, "AT_LEAST({}, {})", left, right),
            Rule::AtMost { left, right } => write!(f, "AT_MOST({}, {})", left, right),
            Rule::Equals { left, right } => write!(f, "EQUALS({}, {})", left, right),
            Rule::Between {
                operand,
                lower,
                upper,
            } => write!(f, "BETWEEN({}, {}, {})", operand, lower, upper),
            Rule::And(rules) => write_list(f, "AND", rules),
            Rule::Or(rules) => write_list(f, "OR", rules),
            Rule::Not(rule) => write!(f, "NOT({})", rule),
        }
    }
}
