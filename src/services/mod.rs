pub mod chapter_service;
pub mod mux_client;
pub mod video_host;
