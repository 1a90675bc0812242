//! ChapterService: chapter mutations backed by SQLite, plus the video
//! replace sequence that keeps local metadata in step with the video host.
//!
//! The replace sequence is not transactional with the remote calls. Its
//! progress is written to `chapter_video_states` so an interrupted replace is
//! visible and can be resolved by [`ChapterService::reconcile_video_states`].

use crate::{
    models::{
        chapter::{Chapter, NewChapter},
        video::{MuxVideo, VideoState},
    },
    schemas::ChapterPatch,
    services::video_host::{HostingError, NewAsset, VideoHost},
};
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("chapter `{chapter_id}` not found in course `{course_id}`")]
    ChapterNotFound {
        course_id: String,
        chapter_id: String,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Hosting(#[from] HostingError),
}

pub type ChapterResult<T> = Result<T, ChapterError>;

#[derive(Clone)]
pub struct ChapterService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,

    videos: Arc<dyn VideoHost>,
}

impl ChapterService {
    pub fn new(db: Arc<SqlitePool>, videos: Arc<dyn VideoHost>) -> Self {
        Self { db, videos }
    }

    /// Insert a chapter row. Chapters are authored elsewhere; this seeds them.
    pub async fn create_chapter(&self, new: NewChapter) -> ChapterResult<Chapter> {
        let now = Utc::now();
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"
            INSERT INTO chapters (
                id, course_id, title, description, content, video_url,
                position, is_published, is_free, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING id, course_id, title, description, content, video_url,
                      position, is_published, is_free, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new.course_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.content)
        .bind(&new.video_url)
        .bind(new.position)
        .bind(new.is_free)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        Ok(chapter)
    }

    /// Fetch a chapter scoped to its course.
    pub async fn get_chapter(&self, course_id: &str, chapter_id: &str) -> ChapterResult<Chapter> {
        sqlx::query_as::<_, Chapter>(
            "SELECT id, course_id, title, description, content, video_url,
                    position, is_published, is_free, created_at, updated_at
             FROM chapters WHERE id = ? AND course_id = ?",
        )
        .bind(chapter_id)
        .bind(course_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| not_found(course_id, chapter_id))
    }

    /// Delete a chapter and return the removed row.
    ///
    /// Video metadata and the remote asset are left untouched.
    pub async fn delete_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
    ) -> ChapterResult<Chapter> {
        let deleted = sqlx::query_as::<_, Chapter>(
            "DELETE FROM chapters WHERE id = ? AND course_id = ?
             RETURNING id, course_id, title, description, content, video_url,
                       position, is_published, is_free, created_at, updated_at",
        )
        .bind(chapter_id)
        .bind(course_id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| not_found(course_id, chapter_id))?;

        info!(course_id, chapter_id, "chapter deleted");
        Ok(deleted)
    }

    /// Merge `patch` into the chapter, then replace its video when the patch
    /// carries a video reference.
    ///
    /// Returns the chapter as written by the merge. The replace runs on every
    /// call with a reference, even when the URL is unchanged.
    pub async fn update_chapter(
        &self,
        course_id: &str,
        chapter_id: &str,
        patch: &ChapterPatch,
    ) -> ChapterResult<Chapter> {
        let chapter = self.apply_patch(course_id, chapter_id, patch).await?;

        if let Some(video_url) = patch.video_reference() {
            self.replace_video(chapter_id, video_url).await?;
        }

        Ok(chapter)
    }

    async fn apply_patch(
        &self,
        course_id: &str,
        chapter_id: &str,
        patch: &ChapterPatch,
    ) -> ChapterResult<Chapter> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE chapters SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(title) = &patch.title {
            builder.push(", title = ");
            builder.push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ");
            builder.push_bind(description.clone());
        }
        if let Some(content) = &patch.content {
            builder.push(", content = ");
            builder.push_bind(content.clone());
        }
        if let Some(is_free) = patch.is_free {
            builder.push(", is_free = ");
            builder.push_bind(is_free);
        }
        if let Some(is_published) = patch.is_published {
            builder.push(", is_published = ");
            builder.push_bind(is_published);
        }
        if let Some(position) = patch.position {
            builder.push(", position = ");
            builder.push_bind(position);
        }
        if let Some(video_url) = &patch.video_url {
            builder.push(", video_url = ");
            builder.push_bind(video_url.clone());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(chapter_id.to_string());
        builder.push(" AND course_id = ");
        builder.push_bind(course_id.to_string());
        builder.push(
            " RETURNING id, course_id, title, description, content, video_url, \
             position, is_published, is_free, created_at, updated_at",
        );

        let chapter = builder
            .build_query_as::<Chapter>()
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| not_found(course_id, chapter_id))?;

        debug!(course_id, chapter_id, "chapter fields merged");
        Ok(chapter)
    }

    /// Swap the chapter's hosted video for one ingested from `video_url`.
    ///
    /// Order: mark pending, delete old remote asset, delete old metadata,
    /// create new remote asset, insert new metadata, mark `has_asset`.
    /// Any failure aborts the sequence and leaves the state `pending_replace`.
    pub async fn replace_video(&self, chapter_id: &str, video_url: &str) -> ChapterResult<MuxVideo> {
        if self.video_state(chapter_id).await? == VideoState::PendingReplace {
            warn!(chapter_id, "previous video replace did not finish; starting over");
        }
        self.set_video_state(chapter_id, VideoState::PendingReplace)
            .await?;

        if let Some(existing) = self.find_video(chapter_id).await? {
            self.videos.delete_asset(&existing.asset_id).await?;
            self.delete_video_record(&existing.id).await?;
            debug!(chapter_id, asset_id = %existing.asset_id, "old video removed");
        }

        let asset = self.videos.create_asset(&NewAsset::public(video_url)).await?;

        let record = sqlx::query_as::<_, MuxVideo>(
            "INSERT INTO mux_videos (id, asset_id, chapter_id, video_url, playback_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, asset_id, chapter_id, video_url, playback_id, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&asset.id)
        .bind(chapter_id)
        .bind(video_url)
        .bind(asset.first_playback_id())
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;

        self.set_video_state(chapter_id, VideoState::HasAsset).await?;
        info!(chapter_id, asset_id = %record.asset_id, "chapter video replaced");
        Ok(record)
    }

    /// The video metadata currently attached to a chapter, if any.
    pub async fn find_video(&self, chapter_id: &str) -> ChapterResult<Option<MuxVideo>> {
        let video = sqlx::query_as::<_, MuxVideo>(
            "SELECT id, asset_id, chapter_id, video_url, playback_id, created_at
             FROM mux_videos WHERE chapter_id = ?
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(chapter_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(video)
    }

    async fn delete_video_record(&self, id: &str) -> ChapterResult<()> {
        sqlx::query("DELETE FROM mux_videos WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Last completed step of the replace sequence; `NoAsset` if never started.
    pub async fn video_state(&self, chapter_id: &str) -> ChapterResult<VideoState> {
        let state = sqlx::query_scalar::<_, VideoState>(
            "SELECT state FROM chapter_video_states WHERE chapter_id = ?",
        )
        .bind(chapter_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(state.unwrap_or(VideoState::NoAsset))
    }

    async fn set_video_state(&self, chapter_id: &str, state: VideoState) -> ChapterResult<()> {
        sqlx::query(
            "INSERT INTO chapter_video_states (chapter_id, state, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(chapter_id) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at",
        )
        .bind(chapter_id)
        .bind(state)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        debug!(chapter_id, state = state.as_str(), "video state recorded");
        Ok(())
    }

    /// Settle every chapter stuck in `pending_replace`.
    ///
    /// A chapter that still has a metadata row becomes `has_asset`; one without
    /// becomes `no_asset`. Remote assets are not inspected.
    pub async fn reconcile_video_states(&self) -> ChapterResult<Vec<(String, VideoState)>> {
        let pending: Vec<String> = sqlx::query_scalar(
            "SELECT chapter_id FROM chapter_video_states WHERE state = ? ORDER BY chapter_id",
        )
        .bind(VideoState::PendingReplace)
        .fetch_all(&*self.db)
        .await?;

        let mut resolved = Vec::with_capacity(pending.len());
        for chapter_id in pending {
            let state = if self.find_video(&chapter_id).await?.is_some() {
                VideoState::HasAsset
            } else {
                VideoState::NoAsset
            };
            self.set_video_state(&chapter_id, state).await?;
            warn!(chapter_id = %chapter_id, state = state.as_str(), "reconciled interrupted video replace");
            resolved.push((chapter_id, state));
        }

        Ok(resolved)
    }
}

fn not_found(course_id: &str, chapter_id: &str) -> ChapterError {
    ChapterError::ChapterNotFound {
        course_id: course_id.to_string(),
        chapter_id: chapter_id.to_string(),
    }
}
