pub mod chapter_handlers;
pub mod health_handlers;
