use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// The slice of the Product API's product projection this service cares about.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProduct {
    pub product_id: i32,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProductClientError {
    #[error("Product service request failed: {0}")]
    Request(String),
    #[error("Product service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to decode product service response: {0}")]
    Decode(String),
}

impl ProductClientError {
    /// Upstream response body, when the failure carried one.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            ProductClientError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// HTTP client for the Product API's product collection.
///
/// `base_url` points at the collection itself,
/// e.g. `http://localhost:5007/api/products`.
#[derive(Clone, Debug)]
pub struct ProductClient {
    http: Client,
    base_url: String,
}

impl ProductClient {
    pub fn new(base_url: String) -> Self {
        ProductClient {
            http: Client::new(),
            base_url,
        }
    }

    pub async fn fetch_product(&self, product_id: i32) -> Result<RemoteProduct, ProductClientError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, product_id))
            .send()
            .await
            .map_err(|err| ProductClientError::Request(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProductClientError::Status { status, body });
        }

        response
            .json::<RemoteProduct>()
            .await
            .map_err(|err| ProductClientError::Decode(err.to_string()))
    }

    /// Blind absolute overwrite of the remote stock value.
    pub async fn update_stock(
        &self,
        product_id: i32,
        new_stock: i32,
    ) -> Result<RemoteProduct, ProductClientError> {
        let response = self
            .http
            .put(format!("{}/{}/stock", self.base_url, product_id))
            .json(&UpdateStockRequest { stock: new_stock })
            .send()
            .await
            .map_err(|err| ProductClientError::Request(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProductClientError::Status { status, body });
        }

        response
            .json::<RemoteProduct>()
            .await
            .map_err(|err| ProductClientError::Decode(err.to_string()))
    }
}

#[derive(Serialize)]
struct UpdateStockRequest {
    stock: i32,
}
