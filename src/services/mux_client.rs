//! REST client for the Mux Video API.
//!
//! Wraps asset creation and deletion using [`reqwest`] with HTTP basic auth
//! (access token id / secret).

use crate::{
    config::MuxConfig,
    services::video_host::{Asset, HostingError, NewAsset, VideoHost},
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Mux wraps every payload in a `data` member.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client for one Mux environment.
#[derive(Clone)]
pub struct MuxClient {
    client: reqwest::Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

impl MuxClient {
    pub fn new(config: &MuxConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Build a client reusing an existing [`reqwest::Client`] connection pool.
    pub fn with_client(client: reqwest::Client, config: &MuxConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
        }
    }

    fn assets_url(&self) -> String {
        format!("{}/video/v1/assets", self.base_url)
    }

    /// Turn a non-2xx response into [`HostingError::Api`], keeping the body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HostingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HostingError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl VideoHost for MuxClient {
    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset, HostingError> {
        let response = self
            .client
            .post(self.assets_url())
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(asset)
            .send()
            .await?;

        let envelope: Envelope<Asset> = Self::check_status(response).await?.json().await?;
        debug!(asset_id = %envelope.data.id, "created mux asset");
        Ok(envelope.data)
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), HostingError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.assets_url(), asset_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;

        Self::check_status(response).await?;
        debug!(asset_id, "deleted mux asset");
        Ok(())
    }
}
