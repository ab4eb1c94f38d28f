//! Form state module

mod field_path;
mod form_value;
mod forms;

pub use field_path::*;
pub use form_value::*;
pub use forms::*;
