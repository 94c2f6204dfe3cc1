use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use gd_core::domain::{Category, Role};
use gd_server::bootstrap;
use gd_server::classifier::ClassifierClient;
use gd_server::config::{
    AppConfig, ClassifierConfig, LoggingConfig, ProfileConfig, RouteConfig, ServerConfig,
    StorageConfig,
};
use gd_server::handler::{self, AppState};
use gd_store::{GrievanceStore, SqliteGrievanceStore};

// ---------------------------------------------------------------------------
// MockClassifierServer — configurable mock that mimics the completion API
// ---------------------------------------------------------------------------

struct MockConfig {
    response_body: String,
    status_code: u16,
}

pub struct MockClassifierServer {
    addr: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockClassifierServer {
    /// Start a mock whose completion content is `content` (wrapped in a
    /// standard chat-completion envelope).
    pub async fn start_content(content: &str) -> Self {
        Self::start_raw(&completion_envelope(content), 200).await
    }

    /// Start a mock returning `body` verbatim with the given status.
    pub async fn start_raw(body: &str, status: u16) -> Self {
        let config = Arc::new(MockConfig {
            response_body: body.to_owned(),
            status_code: status,
        });

        let app = axum::Router::new()
            .route("/v1/chat/completions", post(mock_completion_handler))
            .with_state(config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock classifier");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            _handle: handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockClassifierServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

async fn mock_completion_handler(State(config): State<Arc<MockConfig>>) -> Response {
    let status =
        StatusCode::from_u16(config.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        config.response_body.clone(),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// TestPortal — starts a real gd gateway against the mock classifier
// ---------------------------------------------------------------------------

pub struct TestPortal {
    pub addr: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestPortal {
    pub async fn start(classifier_url: &str) -> Self {
        let config = AppConfig {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            classifier: ClassifierConfig {
                base_url: classifier_url.to_owned(),
                api_key: Some("sk-classifier-test".to_owned()),
                model: TEST_MODEL.to_owned(),
                timeout_ms: 2000,
            },
            routes: full_routes(),
            profiles: test_profiles(),
        };

        let runtime = bootstrap::into_runtime(config).expect("test config should be valid");

        let store = SqliteGrievanceStore::new_in_memory().expect("open in-memory store");
        store.init().expect("init schema");

        let classifier =
            ClassifierClient::new(runtime.classifier).expect("classifier client builds");

        let state = Arc::new(AppState {
            registry: runtime.registry,
            directory: runtime.directory,
            classifier,
            store: Arc::new(store),
        });

        let app = handler::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind portal");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            _handle: handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestPortal {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

fn full_routes() -> Vec<RouteConfig> {
    [
        (Category::Sanitation, "sanitation-dept"),
        (Category::Roads, "public-works"),
        (Category::Electricity, "power-utility"),
        (Category::Water, "water-board"),
        (Category::LawAndOrder, "city-police"),
        (Category::Other, "municipal-office"),
    ]
    .into_iter()
    .map(|(category, department)| RouteConfig {
        category,
        department: department.to_owned(),
    })
    .collect()
}

fn test_profiles() -> Vec<ProfileConfig> {
    vec![
        ProfileConfig {
            id: "citizen-1".to_owned(),
            api_key: CITIZEN_KEY.to_owned(),
            role: Role::Citizen,
            department: None,
            active: true,
        },
        ProfileConfig {
            id: "citizen-2".to_owned(),
            api_key: SECOND_CITIZEN_KEY.to_owned(),
            role: Role::Citizen,
            department: None,
            active: true,
        },
        ProfileConfig {
            id: "officer-pw".to_owned(),
            api_key: ROADS_OFFICER_KEY.to_owned(),
            role: Role::Officer,
            department: Some("public-works".to_owned()),
            active: true,
        },
        ProfileConfig {
            id: "officer-wb".to_owned(),
            api_key: WATER_OFFICER_KEY.to_owned(),
            role: Role::Officer,
            department: Some("water-board".to_owned()),
            active: true,
        },
        ProfileConfig {
            id: "admin-1".to_owned(),
            api_key: ADMIN_KEY.to_owned(),
            role: Role::Admin,
            department: None,
            active: true,
        },
        ProfileConfig {
            id: "citizen-gone".to_owned(),
            api_key: INACTIVE_KEY.to_owned(),
            role: Role::Citizen,
            department: None,
            active: false,
        },
    ]
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

pub const TEST_MODEL: &str = "llama3-70b";
pub const CITIZEN_KEY: &str = "gd-sk-citizen100000000000000000000";
pub const SECOND_CITIZEN_KEY: &str = "gd-sk-citizen200000000000000000000";
pub const ROADS_OFFICER_KEY: &str = "gd-sk-officerpw0000000000000000000";
pub const WATER_OFFICER_KEY: &str = "gd-sk-officerwb0000000000000000000";
pub const ADMIN_KEY: &str = "gd-sk-admin10000000000000000000000";
pub const INACTIVE_KEY: &str = "gd-sk-inactive00000000000000000000";

pub fn completion_envelope(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
    })
    .to_string()
}

pub fn pothole_content() -> String {
    serde_json::json!({
        "category": "roads",
        "priority": "high",
        "sentiment": "negative",
        "summary": "Large pothole on MG Road causing accidents",
        "confidence": 92
    })
    .to_string()
}

pub fn irrelevant_content() -> String {
    serde_json::json!({
        "category": "irrelevant",
        "priority": "low",
        "sentiment": "neutral",
        "summary": "Input is gibberish, not a civic grievance",
        "confidence": 97
    })
    .to_string()
}

pub async fn submit(
    portal: &TestPortal,
    api_key: &str,
    description: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/v1/grievances", portal.url()))
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&serde_json::json!({"description": description}))
        .send()
        .await
        .expect("request should succeed");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("valid JSON");
    (status, body)
}

pub async fn patch_status(
    portal: &TestPortal,
    api_key: &str,
    id: &str,
    status: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let client = reqwest::Client::new();
    let resp = client
        .patch(format!("{}/v1/grievances/{id}/status", portal.url()))
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&serde_json::json!({"status": status}))
        .send()
        .await
        .expect("request should succeed");

    let http_status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("valid JSON");
    (http_status, body)
}

pub async fn list(
    portal: &TestPortal,
    api_key: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/v1/grievances", portal.url()))
        .header("Authorization", format!("Bearer {api_key}"))
        .send()
        .await
        .expect("request should succeed");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("valid JSON");
    (status, body)
}
