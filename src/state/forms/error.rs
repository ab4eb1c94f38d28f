//! Misuse of the form controller API

use thiserror::Error;

/// Rejected controller operations. Validation failures are never reported
/// here; they land in the error map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("`{path}` expects {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
    },

    #[error("`{path}` is not a number: {input:?}")]
    NotANumber { path: String, input: String },

    #[error("`{0}` is disabled")]
    FieldDisabled(String),

    #[error("no more than {0} witnesses allowed")]
    WitnessLimit(usize),
}
