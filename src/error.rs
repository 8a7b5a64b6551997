use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("syntax error at line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("literal {literal} not in [-{var_count}, {var_count}] derived from nbvars")]
    LiteralOutOfBounds { literal: i64, var_count: usize },

    #[error("claimed number of {what} is {declared}, but is actually {computed}")]
    HeaderMismatch {
        what: &'static str,
        declared: usize,
        computed: usize,
    },

    #[error("empty clause: clause terminator without pending literals")]
    EmptyClause,

    #[error("formula contains no clauses")]
    EmptyFormula,

    #[error("protocol violation: {0}")]
    Protocol(&'static str),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("malformed report: {0}")]
    Report(String),
}

impl Error {
    pub fn syntax(line: usize, reason: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
