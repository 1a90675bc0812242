//! Defines routes for chapter authoring.
//!
//! ## Structure
//! - **Chapter endpoints**
//!   - `PATCH  /api/teacher/update/{courseId}/chapter/{chapterId}`: merge fields, replace video
//!   - `DELETE /api/teacher/update/{courseId}/chapter/{chapterId}`: delete chapter
//!
//! - **Health checks**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        chapter_handlers::{delete_chapter, update_chapter},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch},
};
use tower_http::trace::TraceLayer;

/// Build the router. State is attached by the caller with `with_state`.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/api/teacher/update/{courseId}/chapter/{chapterId}",
            patch(update_chapter).delete(delete_chapter),
        )
        .layer(TraceLayer::new_for_http())
}
