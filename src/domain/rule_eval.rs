//! Rule evaluation against a single observation.
//!
//! # Evaluation Semantics
//!
//! - Comparisons read the current observation only
//! - `holding_days` resolves to NaN when no position is open, so every
//!   comparison against it is `false` (and `NOT` of it is `true`)
//! - `AND`: Short-circuits on first `false`
//! - `OR`: Short-circuits on first `true`

use crate::domain::observation::Observation;
use crate::domain::rule::{Operand, Rule};

const EPSILON: f64 = 1e-9;

/// Inputs visible to a rule at one step of the scan.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub observation: &'a Observation,
    pub holding_days: Option<i64>,
}

impl<'a> EvalContext<'a> {
    pub fn flat(observation: &'a Observation) -> Self {
        Self {
            observation,
            holding_days: None,
        }
    }

    pub fn holding(observation: &'a Observation, holding_days: i64) -> Self {
        Self {
            observation,
            holding_days: Some(holding_days),
        }
    }
}

pub fn evaluate(rule: &Rule, ctx: &EvalContext<'_>) -> bool {
    match rule {
        Rule::Above { left, right } => resolve(left, ctx) > resolve(right, ctx),
        Rule::Below { left, right } => resolve(left, ctx) < resolve(right, ctx),
        Rule::AtLeast { left, right } => resolve(left, ctx) >= resolve(right, ctx),
        Rule::AtMost { left, right } => resolve(left, ctx) <= resolve(right, ctx),
        Rule::Equals { left, right } => (resolve(left, ctx) - resolve(right, ctx)).abs() < EPSILON,
        Rule::Between {
            operand,
            lower,
            upper,
        } => {
            let val = resolve(operand, ctx);
            val >= *lower && val <= *upper
        }
        Rule::And(rules) => rules.iter().all(|r| evaluate(r, ctx)),
        Rule::Or(rules) => rules.iter().any(|r| evaluate(r, ctx)),
        Rule::Not(rule) => !evaluate(rule, ctx),
    }
}

fn resolve(operand: &Operand, ctx: &EvalContext<'_>) -> f64 {
    match operand {
        Operand::Close => ctx.observation.close,
        Operand::IndicatorA => ctx.observation.indicator_a,
        Operand::IndicatorB => ctx.observation.indicator_b,
        Operand::HoldingDays => ctx.holding_days.map_or(f64::NAN, |d| d as f64),
        Operand::Constant(v) => *v,
    }
}
