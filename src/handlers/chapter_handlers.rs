//! HTTP handlers for chapter update and delete.
//!
//! Both return the affected chapter flattened into a `{message, ...}` envelope.
//! Store and video-host failures surface as a generic 500 via [`AppError`].

use crate::{
    auth::Caller,
    errors::AppError,
    schemas::{ChapterPatch, SchemaError},
    state::AppState,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const IDS_REQUIRED: &str = "CourseId and ChapterId are required";
const FIELD_REQUIRED: &str = "field is required to update";

/// Path parameters shared by both chapter routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPath {
    pub course_id: String,
    pub chapter_id: String,
}

impl ChapterPath {
    fn require_ids(&self) -> Result<(), AppError> {
        if self.course_id.trim().is_empty() || self.chapter_id.trim().is_empty() {
            return Err(AppError::validation(IDS_REQUIRED));
        }
        Ok(())
    }
}

/// Success body: a message plus every field of the record.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    #[serde(flatten)]
    pub record: T,
}

/// DELETE `/api/teacher/update/{courseId}/chapter/{chapterId}`
pub async fn delete_chapter(
    State(state): State<AppState>,
    caller: Caller,
    Path(path): Path<ChapterPath>,
) -> Result<impl IntoResponse, AppError> {
    path.require_ids()?;
    let Caller(Some(caller_id)) = caller else {
        return Err(AppError::Auth);
    };

    let deleted = state
        .chapters
        .delete_chapter(&path.course_id, &path.chapter_id)
        .await?;

    info!(caller = %caller_id, course_id = %path.course_id, chapter_id = %path.chapter_id, "delete chapter request served");
    Ok((
        StatusCode::OK,
        Json(Envelope {
            message: "Chapter deleted",
            record: deleted,
        }),
    ))
}

/// PATCH `/api/teacher/update/{courseId}/chapter/{chapterId}`
///
/// Identity is checked before the path ids. The body is parsed by hand so a
/// malformed payload cannot short-circuit that order.
pub async fn update_chapter(
    State(state): State<AppState>,
    caller: Caller,
    Path(path): Path<ChapterPath>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let Caller(Some(caller_id)) = caller else {
        return Err(AppError::Auth);
    };
    path.require_ids()?;
    let patch = parse_patch(&body)?;

    let updated = state
        .chapters
        .update_chapter(&path.course_id, &path.chapter_id, &patch)
        .await?;

    info!(
        caller = %caller_id,
        course_id = %path.course_id,
        chapter_id = %path.chapter_id,
        video_replaced = patch.video_reference().is_some(),
        "update chapter request served"
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            message: "chapter updated...",
            record: updated,
        }),
    ))
}

fn parse_patch(body: &[u8]) -> Result<ChapterPatch, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::validation(FIELD_REQUIRED));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::validation("request body must be valid JSON"))?;
    if is_falsy(&value) {
        return Err(AppError::validation(FIELD_REQUIRED));
    }

    let patch: ChapterPatch = serde_json::from_value(value).map_err(SchemaError::from)?;
    if patch.is_empty() {
        return Err(AppError::validation(FIELD_REQUIRED));
    }
    patch.check()?;
    Ok(patch)
}

/// JSON values a JavaScript client would treat as "no body".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
