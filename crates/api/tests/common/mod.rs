use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use taskforge_api::auth::jwt::{generate_access_token, JwtConfig};
use taskforge_api::config::ServerConfig;
use taskforge_api::router::build_app_router;
use taskforge_api::state::AppState;
use taskforge_api::store::TaskStore;
use taskforge_api::ws::WsManager;
use taskforge_core::types::DbId;
use taskforge_core::UserIdentity;
use taskforge_events::{
    BroadcastBus, ChangeWatcher, EmailConfig, GroupBus, MailBackend, MailError, MailTransport,
    MessageSaveHook, Notifier, OutgoingEmail, SaveHooks, TaskSaveHook,
};

/// Transport stub that records every email instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Everything a test needs to drive the app and observe its side effects.
pub struct TestApp {
    pub app: Router,
    pub config: ServerConfig,
    pub store: Arc<TaskStore>,
    pub bus: Arc<GroupBus>,
    pub transport: Arc<RecordingTransport>,
}

impl TestApp {
    /// Mint a valid access token for the given user.
    pub fn token(&self, user_id: DbId, role: &str) -> String {
        generate_access_token(user_id, role, &self.config.jwt)
            .expect("token generation should succeed")
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-with-enough-length".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Mail settings pointing at a recording transport; never hits the network.
fn test_email_config() -> EmailConfig {
    EmailConfig {
        disabled: false,
        backend: MailBackend::Smtp,
        host: Some("smtp.example.com".to_string()),
        port: 587,
        username: None,
        password: None,
        use_tls: true,
        timeout: Duration::from_secs(10),
        from_address: Some("noreply@taskforge.local".to_string()),
        frontend_url: "http://localhost:3000".to_string(),
        smtp_debug: false,
        new_task_recipients: vec!["tasks@taskforge.local".to_string()],
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the wiring in `main.rs` (change watcher hooked into the
/// store, bus forwarding, recording mail transport) so integration tests
/// exercise the same save pipeline that production uses. Seeds an admin
/// (id 1) and a client (id 9).
pub async fn build_test_app() -> TestApp {
    let config = test_config();

    let transport = Arc::new(RecordingTransport::default());
    let notifier = Arc::new(Notifier::immediate(
        Arc::new(test_email_config()),
        transport.clone() as Arc<dyn MailTransport>,
    ));

    let bus = Arc::new(GroupBus::default());
    let watcher = Arc::new(ChangeWatcher::new(
        bus.clone() as Arc<dyn BroadcastBus>,
        notifier.clone(),
    ));
    let hooks = SaveHooks::new()
        .on_task(watcher.clone() as Arc<dyn TaskSaveHook>)
        .on_message(watcher as Arc<dyn MessageSaveHook>);

    let store = Arc::new(TaskStore::new(hooks));
    store
        .upsert_user(UserIdentity {
            id: 1,
            handle: "admin".to_string(),
            full_name: Some("Sam Admin".to_string()),
            email: "sam@taskforge.local".to_string(),
        })
        .await;
    store
        .upsert_user(UserIdentity {
            id: 9,
            handle: "client9".to_string(),
            full_name: Some("Jane Doe".to_string()),
            email: "jane@example.com".to_string(),
        })
        .await;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        ws_manager: Arc::new(WsManager::new()),
        notifier,
    };
    let app = build_app_router(state, &config);

    TestApp {
        app,
        config,
        store,
        bus,
        transport,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, path: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should not fail")
}

pub async fn get_auth(app: Router, path: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(path)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request should build"),
    )
    .await
    .expect("request should not fail")
}

pub async fn post_json_auth(
    app: Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request_json(app, "POST", path, body, Some(token)).await
}

pub async fn patch_json_auth(
    app: Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request_json(app, "PATCH", path, body, Some(token)).await
}

async fn request_json(
    app: Router,
    method: &str,
    path: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(
        builder
            .body(Body::from(body.to_string()))
            .expect("request should build"),
    )
    .await
    .expect("request should not fail")
}

/// Deserialize a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Assert a response carries the given status and return its JSON body.
pub async fn assert_status_json(
    response: Response<Body>,
    expected: StatusCode,
) -> serde_json::Value {
    assert_eq!(response.status(), expected);
    body_json(response).await
}
