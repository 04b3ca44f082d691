//! Domain error types.

/// A parse error with position information for rule parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    ///
    /// `position` is a byte offset; the caret is indented by characters.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position)
            .map_or(self.position, |prefix| prefix.chars().count());
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for vixpe.
#[derive(Debug, thiserror::Error)]
pub enum VixpeError {
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("row {row}, field {field}: {reason} (value: {value:?})")]
    DataFormat {
        row: usize,
        field: String,
        value: String,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VixpeError> for std::process::ExitCode {
    fn from(err: &VixpeError) -> Self {
        let code: u8 = match err {
            VixpeError::Io(_) | VixpeError::Csv(_) => 1,
            VixpeError::ConfigParse { .. } | VixpeError::ConfigInvalid { .. } => 2,
            VixpeError::RuleParse(_) | VixpeError::RuleInvalid { .. } => 4,
            VixpeError::Schema { .. } | VixpeError::DataFormat { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
