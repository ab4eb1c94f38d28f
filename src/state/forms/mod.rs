//! Form domain layer
//!
//! Type-safe field input, declared leaves, and the controller that owns the
//! claim form's value tree.

mod error;
mod field;
mod form_state;

pub use error::FormError;
pub use field::{FieldValue, FormField};
pub use form_state::{FormController, SubmitOutcome};
