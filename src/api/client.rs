//! reqwest client for the catalog and user directory endpoints

use super::{ApiError, CategoryCatalog, UserDirectory};
use crate::config::FormConfig;
use crate::state::CategoryOption;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// One record of `GET /products/categories`
#[derive(Debug, Clone, Deserialize)]
struct CategoryRecord {
    slug: String,
    name: String,
}

impl From<CategoryRecord> for CategoryOption {
    fn from(record: CategoryRecord) -> Self {
        Self {
            value: record.slug,
            label: record.name,
        }
    }
}

/// Body of `GET /users/search`
#[derive(Debug, Clone, Deserialize)]
struct UserSearchResponse {
    total: u64,
}

/// HTTP client for the remote catalog and user directory
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &FormConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: config.api_base(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {url} {query:?}");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::error!("{url} request failed with status {status}");
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CategoryCatalog for ApiClient {
    async fn fetch_categories(&self) -> Result<Vec<CategoryOption>, ApiError> {
        let records: Vec<CategoryRecord> = self.get_json("/products/categories", &[]).await?;
        Ok(records.into_iter().map(CategoryOption::from).collect())
    }
}

#[async_trait]
impl UserDirectory for ApiClient {
    async fn count_matches(&self, query: &str) -> Result<u64, ApiError> {
        let body: UserSearchResponse = self.get_json("/users/search", &[("q", query)]).await?;
        Ok(body.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_record_maps_slug_and_name() {
        let json = r#"[
            {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
            {"slug": "kitchen-accessories", "name": "Kitchen Accessories"}
        ]"#;
        let records: Vec<CategoryRecord> = serde_json::from_str(json).unwrap();
        let options: Vec<CategoryOption> = records.into_iter().map(Into::into).collect();

        assert_eq!(
            options,
            vec![
                CategoryOption {
                    value: "beauty".to_string(),
                    label: "Beauty".to_string(),
                },
                CategoryOption {
                    value: "kitchen-accessories".to_string(),
                    label: "Kitchen Accessories".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_user_search_reads_total() {
        let json = r#"{"users": [], "total": 0, "skip": 0, "limit": 0}"#;
        let body: UserSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.total, 0);
    }

    #[test]
    fn test_user_search_without_total_is_rejected() {
        let json = r#"{"users": []}"#;
        assert!(serde_json::from_str::<UserSearchResponse>(json).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = FormConfig {
            api_base: Some("http://127.0.0.1:9".to_string()),
            request_timeout_secs: Some(2),
            ..Default::default()
        };
        // The env override would point elsewhere
        if std::env::var(crate::config::API_BASE_ENV).is_ok() {
            return;
        }
        let client = ApiClient::new(&config).unwrap();
        let result = client.count_matches("a@b.cz").await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
