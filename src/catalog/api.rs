//! Remote field catalog
//!
//! Fetches entity and field metadata from an HTTP metadata service and snapshots it
//! into a [`StaticFieldCatalog`]. A failed fetch leaves nothing half-loaded; callers
//! retry by calling [`ApiCatalogClient::fetch_catalog`] again.

use super::{CatalogError, StaticFieldCatalog};
use crate::models::{EntityDescriptor, FieldDescriptor};
use tracing::info;

/// Client for a metadata service exposing
/// `GET {base}/entities` and `GET {base}/entities/{id}/fields`
pub struct ApiCatalogClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl ApiCatalogClient {
    /// Create a new catalog client
    ///
    /// # Example
    ///
    /// ```rust
    /// use custom_export_sdk::catalog::ApiCatalogClient;
    ///
    /// let client = ApiCatalogClient::new("https://metadata.example.com/api/v1", None);
    /// ```
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);

        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let response = self
            .build_request(path)
            .send()
            .await
            .map_err(|e| CatalogError::Network(format!("GET {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(CatalogError::Network(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(format!("Invalid response for {}: {}", path, e)))
    }

    /// List entities without their fields
    pub async fn fetch_entities(&self) -> Result<Vec<EntityDescriptor>, CatalogError> {
        self.get_json("/entities").await
    }

    /// Fetch the fields of a single entity
    pub async fn fetch_fields(&self, entity_id: &str) -> Result<Vec<FieldDescriptor>, CatalogError> {
        let path = format!("/entities/{}/fields", urlencoding::encode(entity_id));
        self.get_json(&path).await
    }

    /// Fetch every entity with its fields and validate the result
    pub async fn fetch_catalog(&self) -> Result<StaticFieldCatalog, CatalogError> {
        let entities = self.fetch_entities().await?;
        let mut catalog = StaticFieldCatalog::new();
        for entity in entities {
            let fields = self.fetch_fields(&entity.id).await?;
            catalog.insert_entity(entity, fields);
        }
        catalog.validate()?;

        info!(
            "Fetched field catalog with {} entities from {}",
            super::FieldCatalog::entities(&catalog).len(),
            self.base_url
        );
        Ok(catalog)
    }
}
