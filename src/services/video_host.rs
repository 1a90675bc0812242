//! Port for the third-party video host.
//!
//! The chapter service only needs two operations: ingest a new asset from a
//! URL and delete an asset by id. [`super::mux_client::MuxClient`] talks to
//! Mux; tests substitute their own implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who may play back an asset.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPolicy {
    Public,
    Signed,
}

/// Request body for creating an asset.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAsset {
    /// Source URL the host ingests from.
    pub input: String,
    pub playback_policy: Vec<PlaybackPolicy>,
    /// Test assets are watermarked and expire; never used for real chapters.
    pub test: bool,
}

impl NewAsset {
    /// A production asset with public playback.
    pub fn public(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            playback_policy: vec![PlaybackPolicy::Public],
            test: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

/// An asset as reported back by the host.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
}

impl Asset {
    /// First playback id, or `""` when the host returned none.
    pub fn first_playback_id(&self) -> &str {
        self.playback_ids
            .first()
            .map(|p| p.id.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum HostingError {
    /// The HTTP request itself failed (network, DNS, TLS, ...).
    #[error("video host request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host answered with a non-2xx status.
    #[error("video host error ({status}): {body}")]
    Api { status: u16, body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Create a remote asset and return its id and playback ids.
    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset, HostingError>;

    /// Delete a remote asset by id.
    async fn delete_asset(&self, asset_id: &str) -> Result<(), HostingError>;
}
