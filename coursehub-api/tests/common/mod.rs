//! Shared harness for API integration tests
//!
//! - [`lazy_app`] builds the router over a pool that never connects, for
//!   tests that stop before the database (auth rejections, guards, 404s).
//! - [`TestContext`] connects to `DATABASE_URL`, runs migrations and returns
//!   `None` when the variable is unset so database tests skip themselves.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use coursehub_api::{
    app::{build_router, AppState},
    config::Config,
};
use coursehub_shared::{
    auth::jwt::{create_token, Claims, TokenType},
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{create_pool, DatabaseConfig},
    },
    models::{
        profile::{CreateProfile, Profile},
        role::{AppRole, UserRole},
        user::{CreateUser, User},
    },
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

const UNREACHABLE_DB: &str = "postgresql://coursehub@127.0.0.1:1/unused";

/// Router over a pool that fails fast on first use
pub fn lazy_app() -> (Router, Config) {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(UNREACHABLE_DB)
        .expect("lazy pool");
    let config = Config::for_tests(UNREACHABLE_DB);
    let state = AppState::new(pool, config.clone()).expect("state");
    (build_router(state), config)
}

pub fn access_token(config: &Config, user_id: Uuid) -> String {
    let claims = Claims::new(user_id, TokenType::Access);
    create_token(&claims, &config.jwt.secret).expect("sign token")
}

pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        };

        ensure_database_exists(&url).await.expect("create database");
        let db = create_pool(DatabaseConfig {
            url: url.clone(),
            max_connections: 5,
            ..Default::default()
        })
        .await
        .expect("connect");
        run_migrations(&db).await.expect("migrations");

        let config = Config::for_tests(url);
        let state = AppState::new(db.clone(), config.clone()).expect("state");

        Some(Self {
            db,
            app: build_router(state),
            config,
        })
    }

    /// Creates a member holding `user` plus `role`; returns (id, bearer token)
    pub async fn member(&self, role: AppRole) -> (Uuid, String) {
        let tag = Uuid::new_v4().simple().to_string()[..12].to_string();

        let user = User::create(
            &self.db,
            CreateUser {
                email: format!("api-{}@example.test", tag),
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            },
        )
        .await
        .expect("create user");

        Profile::create(
            &self.db,
            CreateProfile {
                user_id: user.id,
                username: format!("api_{}", tag),
            },
        )
        .await
        .expect("create profile");

        UserRole::set_role(&self.db, user.id, role).await.expect("grant role");

        (user.id, access_token(&self.config, user.id))
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        send(self.app.clone(), request).await
    }
}

/// Runs one request and decodes the JSON body (`Null` when empty)
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    raw_request(method, uri, token, body.to_string())
}

/// Like [`json_request`] but sends `body` untouched, valid JSON or not
pub fn raw_request(method: &str, uri: &str, token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(body.into()).expect("request")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}
