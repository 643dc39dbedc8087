use thiserror::Error;

/// Query parse failure. Evaluation itself cannot fail.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unterminated quote in query")]
    UnterminatedQuote,

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("unknown macro ${0}")]
    UnknownMacro(String),

    #[error("macro ${0} expands to another macro")]
    NestedMacro(String),

    #[error("empty value in term {0:?}")]
    EmptyValue(String),

    #[error("invalid date {0:?} (want YYYY, YYYY-MM or YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid number in {0:?}")]
    InvalidNumber(String),

    #[error("invalid range {0:?}")]
    InvalidRange(String),

    #[error("{0} terms cannot be negated")]
    NegatedRange(String),

    #[error("{0} given more than once")]
    Duplicate(&'static str),

    #[error("unknown sort key {0:?}")]
    UnknownSortKey(String),

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
