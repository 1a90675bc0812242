#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use chapter_api::auth::{Claims, JwtIdentity};
use chapter_api::config::AuthConfig;
use chapter_api::db;
use chapter_api::models::chapter::{Chapter, NewChapter};
use chapter_api::routes::routes::routes;
use chapter_api::services::chapter_service::ChapterService;
use chapter_api::services::video_host::{
    Asset, HostingError, NewAsset, PlaybackId, PlaybackPolicy, VideoHost,
};
use chapter_api::state::AppState;

pub const AUTH_SECRET: &str = "integration-test-secret";

/// One call observed by [`RecordingHost`], with the number of local metadata
/// rows for the chapter at the moment the call arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Delete {
        asset_id: String,
        local_rows: i64,
    },
    Create {
        input: String,
        playback_policy: Vec<PlaybackPolicy>,
        test: bool,
        local_rows: i64,
    },
}

/// Fake video host that hands out `asset-N` / `play-N` ids and records calls.
#[derive(Clone)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    pool: SqlitePool,
    fail_create: bool,
}

impl RecordingHost {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            pool,
            fail_create: false,
        }
    }

    pub fn failing(pool: SqlitePool) -> Self {
        Self {
            fail_create: true,
            ..Self::new(pool)
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn local_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM mux_videos")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

#[async_trait]
impl VideoHost for RecordingHost {
    async fn create_asset(&self, asset: &NewAsset) -> Result<Asset, HostingError> {
        let local_rows = self.local_rows().await;
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(HostCall::Create {
                input: asset.input.clone(),
                playback_policy: asset.playback_policy.clone(),
                test: asset.test,
                local_rows,
            });
            calls
                .iter()
                .filter(|c| matches!(c, HostCall::Create { .. }))
                .count()
        };

        if self.fail_create {
            return Err(HostingError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }

        Ok(Asset {
            id: format!("asset-{}", n),
            playback_ids: vec![PlaybackId {
                id: format!("play-{}", n),
                policy: Some("public".into()),
            }],
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), HostingError> {
        let local_rows = self.local_rows().await;
        self.calls.lock().unwrap().push(HostCall::Delete {
            asset_id: asset_id.to_string(),
            local_rows,
        });
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub chapters: ChapterService,
    pub host: RecordingHost,
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect_in_memory().await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

pub async fn build_test_app() -> TestApp {
    let pool = test_pool().await;
    let host = RecordingHost::new(pool.clone());
    assemble(pool, host)
}

pub fn assemble(pool: SqlitePool, host: RecordingHost) -> TestApp {
    let chapters = ChapterService::new(Arc::new(pool.clone()), Arc::new(host.clone()));
    let identity = JwtIdentity::new(&AuthConfig {
        secret: AUTH_SECRET.into(),
        issuer: None,
    });
    let state = AppState {
        chapters: chapters.clone(),
        identity: Arc::new(identity),
    };

    TestApp {
        router: routes().with_state(state),
        pool,
        chapters,
        host,
    }
}

pub fn token_for(user: &str) -> String {
    let claims = Claims {
        sub: user.into(),
        exp: chrono::Utc::now().timestamp() + 600,
        iss: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(AUTH_SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn seed_chapter(chapters: &ChapterService, course_id: &str) -> Chapter {
    chapters
        .create_chapter(NewChapter {
            course_id: course_id.into(),
            title: "Getting started".into(),
            description: Some("What this course covers".into()),
            content: Some("c".repeat(60)),
            position: 1,
            ..Default::default()
        })
        .await
        .unwrap()
}

pub fn chapter_uri(course_id: &str, chapter_id: &str) -> String {
    format!("/api/teacher/update/{}/chapter/{}", course_id, chapter_id)
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(raw) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(raw.to_string())
        }
        None => Body::empty(),
    };

    app.router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
