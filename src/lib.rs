//! Chapter authoring API: update and delete chapters of a course, keeping the
//! chapter's hosted video in step with the submitted video URL.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod schemas;
pub mod services;
pub mod state;
