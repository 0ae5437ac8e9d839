use std::num::{ParseFloatError, ParseIntError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The source value's shape does not fit the converter at `path`.
    #[error("{} is invalid type (want: {expected}, has: {actual})", subject(.path))]
    InvalidType {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path} is required, but the source has no value for it")]
    RequiredFieldMissing { path: String },

    /// Dispatch has no strategy for this type; compilation is aborted.
    #[error("unsupported type: {name}")]
    UnsupportedType { name: String },

    #[error("{name} is not a record type")]
    NotARecord { name: String },

    #[error("{}{source}", prefix(.path))]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Failure of a string-to-scalar literal parse, as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid integer literal {literal:?}: {source}")]
    Int {
        literal: String,
        #[source]
        source: ParseIntError,
    },
    #[error("integer literal {literal:?} is out of range")]
    OutOfRange { literal: String },
    #[error("invalid syntax in literal {literal:?}")]
    Syntax { literal: String },
    #[error("invalid float literal {literal:?}: {source}")]
    Float {
        literal: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("invalid boolean literal {literal:?}")]
    Bool { literal: String },
}

impl Error {
    pub fn invalid_type(path: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::InvalidType {
            path: path.to_owned(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn required(path: &str) -> Self {
        Error::RequiredFieldMissing { path: path.to_owned() }
    }

    pub fn parse(path: &str, source: ParseError) -> Self {
        Error::Parse { path: path.to_owned(), source }
    }

    /// Property path the error is attached to, if it is field-scoped.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::InvalidType { path, .. }
            | Error::RequiredFieldMissing { path }
            | Error::Parse { path, .. } => Some(path),
            Error::UnsupportedType { .. } | Error::NotARecord { .. } => None,
        }
    }
}

/// The root of a conversion has an empty path.
fn subject(path: &str) -> &str {
    if path.is_empty() { "source value" } else { path }
}

fn prefix(path: &str) -> String {
    if path.is_empty() { String::new() } else { format!("{path}: ") }
}
