//! Supply-chain demo sandbox service
//!
//! Provisions and tears down isolated demo environments: seeds reference
//! data, creates demo-scoped users with roles, and exposes lookup/cleanup
//! operations keyed by an opaque guid.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{AuthConfig, AuthService, TokenIssuer};
use crate::services::demos::DemoService;

/// Shared state handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub demos: Arc<DemoService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires the services on top of an open connection pool.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig, logger: slog::Logger) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from_app_config(&config)));
        let issuer: Arc<dyn TokenIssuer> = auth.clone();
        let demos = Arc::new(DemoService::new(
            db.clone(),
            issuer,
            config.seed_dir.clone(),
            logger,
        ));

        Self {
            db,
            config,
            demos,
            auth,
        }
    }

    pub fn demo_service(&self) -> Arc<DemoService> {
        self.demos.clone()
    }
}

/// Routes of the demo lifecycle API, relative to their mount point.
pub fn demo_routes() -> Router<AppState> {
    handlers::demos::routes()
}

/// Full application router with request ids and HTTP tracing applied.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::simple_health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/Demos", demo_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
