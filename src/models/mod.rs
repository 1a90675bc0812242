//! Core data models for the chapter service.
//!
//! These entities map to database tables via `sqlx::FromRow` and serialize
//! as camelCase JSON via `serde`, matching what the authoring frontend sends.

pub mod chapter;
pub mod video;
