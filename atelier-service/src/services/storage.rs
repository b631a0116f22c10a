//! Image hosting client.
//!
//! Design sketches and payment screenshots are uploaded to an external
//! host; the durable URL comes back and is stored on the referencing
//! document. The host itself is a collaborator, not reimplemented here.

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::StorageConfig;

#[derive(Clone)]
pub struct ImageHostClient {
    client: Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl ImageHostClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if the image host is configured (endpoint and key are set).
    pub fn is_configured(&self) -> bool {
        !self.config.api_url.is_empty() && !self.config.api_key.expose_secret().is_empty()
    }

    /// Upload a file and return its durable URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        if !self.is_configured() {
            return Err(anyhow!("image hosting is not configured"));
        }

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("image host returned {}: {}", status, body));
        }

        let upload: UploadResponse = response.json().await?;
        Ok(upload.url)
    }
}
