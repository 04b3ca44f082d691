//! Rule DSL parser.
//!
//! Hand-written recursive descent over the input string. Every error carries
//! the byte offset where parsing stopped.
//!
//! ```text
//! rule     := CMP '(' operand ',' operand ')'
//!           | 'BETWEEN' '(' operand ',' number ',' number ')'
//!           | ('AND' | 'OR') '(' rule (',' rule)+ ')'
//!           | 'NOT' '(' rule ')'
//! CMP      := 'ABOVE' | 'BELOW' | 'AT_LEAST' | 'AT_MOST' | 'EQUALS'
//! operand  := 'close' | 'indicator_a' | 'vix' | 'indicator_b' | 'pe'
//!           | 'holding_days' | number
//! ```

use crate::domain::error::ParseError;
use crate::domain::rule::{Operand, Rule};

type Comparison = fn(Operand, Operand) -> Rule;

const COMPARISONS: &[(&str, Comparison)] = &[
    ("ABOVE", |left, right| Rule::Above { left, right }),
    ("BELOW", |left, right| Rule::Below { left, right }),
    ("AT_LEAST", |left, right| Rule::AtLeast { left, right }),
    ("AT_MOST", |left, right| Rule::AtMost { left, right }),
    ("EQUALS", |left, right| Rule::Equals { left, right }),
];

/// Parse a complete rule expression. Trailing input is an error.
pub fn parse(input: &str) -> Result<Rule, ParseError> {
    let mut cursor = Cursor { src: input, at: 0 };
    let rule = cursor.rule()?;
    cursor.skip_ws();
    if !cursor.rest().is_empty() {
        return cursor.fail(format!("trailing input after rule: '{}'", cursor.rest()));
    }
    Ok(rule)
}

struct Cursor<'a> {
    src: &'a str,
    /// Byte offset of the next unread character.
    at: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.at..]
    }

    fn next_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.at += rest.len() - rest.trim_start().len();
    }

    fn fail<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.into(),
            position: self.at,
        })
    }

    /// The identifier at the cursor, possibly empty.
    fn word(&self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// What the cursor is looking at, for error messages.
    fn found(&self) -> String {
        match (self.word(), self.next_char()) {
            ("", None) => "end of input".to_string(),
            ("", Some(c)) => format!("'{}'", c),
            (word, _) => format!("'{}'", word),
        }
    }

    fn punct(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.next_char() == Some(expected) {
            self.at += expected.len_utf8();
            Ok(())
        } else {
            self.fail(format!("expected '{}', found {}", expected, self.found()))
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        self.skip_ws();
        let rest = self.rest();
        let sign = usize::from(rest.starts_with('-'));
        let len = sign
            + rest[sign..]
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len() - sign);
        let text = &rest[..len];

        if !text.bytes().any(|b| b.is_ascii_digit()) {
            return self.fail(format!("expected number, found {}", self.found()));
        }
        let value = match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => return self.fail(format!("malformed number '{}'", text)),
        };
        self.at += len;
        Ok(value)
    }

    fn operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_ws();
        if self
            .next_char()
            .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.')
        {
            return self.number().map(Operand::Constant);
        }

        let word = self.word();
        let operand = match word {
            "close" => Operand::Close,
            "indicator_a" | "vix" => Operand::IndicatorA,
            "indicator_b" | "pe" => Operand::IndicatorB,
            "holding_days" => Operand::HoldingDays,
            _ => {
                return self.fail(format!(
                    "expected operand (close, indicator_a, vix, indicator_b, pe, holding_days or a number), found {}",
                    self.found()
                ));
            }
        };
        self.at += word.len();
        Ok(operand)
    }

    fn rule(&mut self) -> Result<Rule, ParseError> {
        self.skip_ws();
        let name = self.word();

        if let Some((_, build)) = COMPARISONS.iter().find(|(k, _)| *k == name) {
            self.at += name.len();
            self.punct('(')?;
            let left = self.operand()?;
            self.punct(',')?;
            let right = self.operand()?;
            self.punct(')')?;
            return Ok(build(left, right));
        }

        match name {
            "BETWEEN" => {
                self.at += name.len();
                self.punct('(')?;
                let operand = self.operand()?;
                self.punct(',')?;
                let lower = self.number()?;
                self.punct(',')?;
                let upper = self.number()?;
                self.punct(')')?;
                Ok(Rule::Between {
                    operand,
                    lower,
                    upper,
                })
            }
            "AND" | "OR" => {
                self.at += name.len();
                let children = self.children(name)?;
                Ok(if name == "AND" {
                    Rule::And(children)
                } else {
                    Rule::Or(children)
                })
            }
            "NOT" => {
                self.at += name.len();
                self.punct('(')?;
                let inner = self.rule()?;
                self.punct(')')?;
                Ok(Rule::Not(Box::new(inner)))
            }
            _ => self.fail(format!("expected rule, found {}", self.found())),
        }
    }

    /// `'(' rule (',' rule)+ ')'` for AND / OR.
    fn children(&mut self, name: &str) -> Result<Vec<Rule>, ParseError> {
        self.punct('(')?;
        let mut children = vec![self.rule()?];
        loop {
            self.skip_ws();
            match self.next_char() {
                Some(',') => {
                    self.at += 1;
                    children.push(self.rule()?);
                }
                Some(')') => {
                    self.at += 1;
                    break;
                }
                _ => {
                    return self.fail(format!(
                        "expected ',' or ')' in {}, found {}",
                        name,
                        self.found()
                    ));
                }
            }
        }
        if children.len() < 2 {
            return self.fail(format!(
                "{} needs at least two rules, found {}",
                name,
                children.len()
            ));
        }
        Ok(children)
    }
}
