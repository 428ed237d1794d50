use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use farmgate_api::{
    config::AppConfig,
    db,
    events::Event,
    handlers::AppServices,
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Tank topology used across the integration suite.
pub fn test_tanks() -> Vec<String> {
    ["Tank A", "Tank B", "Tank C"]
        .iter()
        .map(|tank| tank.to_string())
        .collect()
}

/// Helper harness for spinning up an application state backed by an in-memory
/// SQLite database.
///
/// Each harness owns its own database, so tests are fully isolated and can run
/// in parallel. Events are not consumed by a background task; tests drain the
/// receiver to assert on what was published.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_tanks(test_tanks()).await
    }

    pub async fn with_tanks(tanks: Vec<String>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.storage_tanks = tanks;
        // One connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = farmgate_api::events::EventSender::new(event_tx);

        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            cfg.storage_tanks.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", farmgate_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            events: event_rx,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Events already published by completed requests, oldest first.
    ///
    /// Services publish before responding, so once a request has returned its
    /// events are guaranteed to be buffered.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

/// Decode a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not valid json")
}
