//! Local bookkeeping for videos hosted on Mux.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tracks the remote asset backing a chapter's video.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MuxVideo {
    /// Local row identifier.
    pub id: String,

    /// Asset id on the hosting side, used for deletion.
    pub asset_id: String,

    pub chapter_id: String,

    /// The URL the asset was ingested from.
    pub video_url: String,

    /// First public playback id, or empty when the host returned none.
    pub playback_id: String,

    pub created_at: DateTime<Utc>,
}

/// Progress of a chapter through the video replace sequence.
///
/// `PendingReplace` is written before the old asset is touched and only
/// cleared once the new metadata row exists, so a chapter stuck in it
/// points at an interrupted replace.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VideoState {
    NoAsset,
    PendingReplace,
    HasAsset,
}

impl VideoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoState::NoAsset => "no_asset",
            VideoState::PendingReplace => "pending_replace",
            VideoState::HasAsset => "has_asset",
        }
    }
}
