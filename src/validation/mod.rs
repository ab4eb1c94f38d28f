//! Schema-driven validation of the form value tree
//!
//! Synchronous rules are evaluated immediately; the email uniqueness rule
//! reads verdicts committed by the debounced [`EmailCheckScheduler`].

mod email_check;
mod error_map;
mod rules;
pub mod schema;

pub use email_check::{
    CheckResolution, CheckTiming, EmailCheckScheduler, Verdict, VerdictLookup,
};
pub use error_map::ErrorMap;
pub use rules::{is_valid_email, Rule};
pub use schema::Schema;
