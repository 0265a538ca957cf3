//! Test application setup utilities
//!
//! Every `TestApp` owns a private SQLite file whose name marks it as a test
//! database. The file is reset before use and removed on drop.

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use energy_dashboard::{
    config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ReadingsConfig, ServerConfig},
    create_router,
    db::{self, DbError},
    AppState,
};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    db_file: PathBuf,
}

impl TestApp {
    /// Create a new test application on a fresh database
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool_with_url(&config.database.test_url, &config.database)
            .await
            .expect("Failed to initialize test database");

        match db::reset_database(&db, &config.database).await {
            Ok(()) => {}
            Err(DbError::ProductionDatabase(target)) => {
                eprintln!("{}", production_guard_message(&target));
                std::process::exit(1);
            }
            Err(e) => panic!("Failed to reset test database: {}", e),
        }

        let db_file = config
            .database
            .test_url
            .trim_start_matches("sqlite://")
            .split('?')
            .next()
            .map(PathBuf::from)
            .unwrap_or_default();

        let state = AppState::new(config, db);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            db_file,
        }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a GET request carrying a token in the `token` header
    pub async fn get_with_token(&self, uri: &str, token: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("token", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body and a token in the `token` header
    pub async fn post_json_with_token(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: &str,
    ) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("token", token)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a request with a bearer token
    pub async fn request_with_auth(&self, request: Request<Body>, token: &str) -> TestResponse {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        self.request(Request::from_parts(parts, body)).await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if self.db_file.as_os_str().is_empty() {
            return;
        }
        let _ = std::fs::remove_file(&self.db_file);
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = self.db_file.clone().into_os_string();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(sidecar);
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }
}

/// Printed before the suite exits on a database the guard refuses
pub fn production_guard_message(target: &str) -> String {
    format!(
        "FATAL: refusing to run tests against '{}'. The suite only resets the \
         `database.test_url` it builds in test_config(); keep that a *_test_* file \
         distinct from `database.url`.",
        target
    )
}

/// Create a test configuration with a unique temporary SQLite database
pub fn test_config() -> AppConfig {
    let db_path = format!(
        "/tmp/energy_dashboard_test_{}.db",
        Uuid::new_v4().simple()
    );

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret_key_that_is_at_least_32_bytes_long".to_string(),
            token_expiry_hours: 24,
        },
        database: DatabaseConfig {
            url: "sqlite:///tmp/energy_dashboard_production.db".to_string(),
            test_url: format!("sqlite://{}?mode=rwc", db_path),
            max_connections: 2,
            connect_timeout_secs: 30,
        },
        logging: LoggingConfig::default(),
        readings: ReadingsConfig::default(),
    }
}
