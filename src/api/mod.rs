//! HTTP access to the category catalog and the user directory

mod client;
mod error;
mod traits;

pub use client::ApiClient;
pub use error::ApiError;
pub use traits::{CategoryCatalog, UserDirectory};

#[cfg(test)]
pub use traits::{MockCategoryCatalog, MockUserDirectory};
