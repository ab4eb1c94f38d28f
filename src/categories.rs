//! Fetch-once cache of category options

use crate::api::CategoryCatalog;
use crate::state::CategoryOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    /// Fetch failed; the option list stays empty for the session
    Failed,
}

/// Category options for the select control, fetched once per session
#[derive(Debug, Clone, Default)]
pub struct CategoryOptionSource {
    options: Vec<CategoryOption>,
    state: LoadState,
}

impl CategoryOptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the catalog on first call. Later calls return the cached result
    /// without touching the network, including after a failure.
    pub async fn load(&mut self, catalog: &dyn CategoryCatalog) -> &[CategoryOption] {
        if self.state != LoadState::NotLoaded {
            return &self.options;
        }
        match catalog.fetch_categories().await {
            Ok(options) => {
                tracing::info!("Loaded {} categories", options.len());
                self.options = options;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                tracing::warn!("Failed to load categories: {e}");
                self.state = LoadState::Failed;
            }
        }
        &self.options
    }

    pub fn options(&self) -> &[CategoryOption] {
        &self.options
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    pub fn label_of(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}
