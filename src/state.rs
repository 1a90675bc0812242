use crate::{auth::IdentityProvider, services::chapter_service::ChapterService};
use std::sync::Arc;

/// Shared state handed to every handler via `State<AppState>`.
///
/// Cheap to clone: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub chapters: ChapterService,
    pub identity: Arc<dyn IdentityProvider>,
}
