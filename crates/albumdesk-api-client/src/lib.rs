//! Shared HTTP client for the Albumdesk order backend.
//!
//! Provides a minimal client with generic GET/POST/PATCH helpers and domain
//! methods for every endpoint the dashboard core consumes. The checklist
//! wire convention (step strings carrying the `" (done)"` suffix) is encoded
//! and decoded here and nowhere else; the rest of the workspace sees
//! [`albumdesk_core::ChecklistStep`] values.

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;

use albumdesk_core::{AppError, Config};

/// HTTP client for the order backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from [`Config::from_env`]: `ALBUMDESK_API_URL` plus
    /// the standard timeout settings.
    pub fn from_env() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.build_url(path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response)
    }

    /// GET request. Deserializes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST a JSON body and deserialize the response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// POST a JSON body; the response body is not consulted.
    pub async fn post_ok<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// PATCH a JSON body; the response body is not consulted.
    pub async fn patch_ok<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PATCH, path, Some(body)).await?;
        Ok(())
    }
}

// Re-export request/response types for convenience.
pub use api::{FolderUpdate, OrderUpdate, TrackingRecord};
