//! Trait abstraction over the remote endpoints to enable mocking in tests

use super::ApiError;
use crate::state::CategoryOption;
use async_trait::async_trait;

/// Source of selectable categories
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    /// Fetch every category, already mapped to `{ value, label }`
    async fn fetch_categories(&self) -> Result<Vec<CategoryOption>, ApiError>;
}

/// Registered-user lookup used by the email uniqueness rule
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Number of users matching `query` as typed
    async fn count_matches(&self, query: &str) -> Result<u64, ApiError>;
}
