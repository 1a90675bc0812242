//! Represents a chapter, the content unit a course is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single chapter scoped under a course.
///
/// Ids are opaque strings issued by whoever created the chapter; this service
/// never mints them for live traffic.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter identifier.
    pub id: String,

    /// Identifier of the parent course.
    pub course_id: String,

    pub title: String,

    pub description: Option<String>,

    /// Rich-text body shown to learners.
    pub content: Option<String>,

    /// Source URL of the chapter video, as submitted by the author.
    pub video_url: Option<String>,

    /// Ordering within the course.
    pub position: i64,

    pub is_published: bool,

    /// Whether the chapter can be watched without buying the course.
    pub is_free: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Fields needed to seed a chapter row.
#[derive(Debug, Clone, Default)]
pub struct NewChapter {
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub position: i64,
    pub is_free: bool,
}
