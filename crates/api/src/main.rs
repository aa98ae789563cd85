use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskforge_api::config::ServerConfig;
use taskforge_api::router::build_app_router;
use taskforge_api::state::AppState;
use taskforge_api::store::TaskStore;
use taskforge_api::ws;
use taskforge_core::roles::{ROLE_ADMIN, ROLE_CLIENT};
use taskforge_core::UserIdentity;
use taskforge_events::delivery::console::ConsoleMailer;
use taskforge_events::delivery::smtp::SmtpMailer;
use taskforge_events::{
    ChangeWatcher, EmailConfig, GroupBus, MailBackend, MailQueue, MailTransport, Notifier,
    SaveHooks,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskforge_api=debug,taskforge_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let email_config = match EmailConfig::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(err) => {
            tracing::error!(error = %err, "Invalid email configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        disabled = email_config.disabled,
        backend = ?email_config.backend,
        host = ?email_config.host,
        "Loaded email configuration"
    );

    // --- Mail transport ---
    let transport: Arc<dyn MailTransport> =
        if email_config.disabled || matches!(email_config.backend, MailBackend::Console) {
            Arc::new(ConsoleMailer)
        } else {
            match SmtpMailer::from_config(&email_config) {
                Ok(mailer) => Arc::new(mailer),
                Err(err) => {
                    tracing::error!(error = %err, "Failed to build SMTP transport");
                    std::process::exit(1);
                }
            }
        };

    // --- Notifier ---
    // EMAIL_DELIVERY selects the policy: "immediate" sends inline and
    // surfaces failures to callers, "queued" buffers into the worker pool.
    let delivery = std::env::var("EMAIL_DELIVERY").unwrap_or_else(|_| "immediate".into());
    let notifier = Arc::new(match delivery.as_str() {
        "queued" => Notifier::queued(
            Arc::clone(&email_config),
            MailQueue::with_defaults(Arc::clone(&transport)),
        ),
        _ => Notifier::immediate(Arc::clone(&email_config), Arc::clone(&transport)),
    });
    tracing::info!(policy = %delivery, "Email notifier ready");

    // --- Broadcast bus + change watcher ---
    let bus = Arc::new(GroupBus::default());
    let watcher = Arc::new(ChangeWatcher::new(
        Arc::clone(&bus) as Arc<dyn taskforge_events::BroadcastBus>,
        Arc::clone(&notifier),
    ));
    let hooks = SaveHooks::new()
        .on_task(Arc::clone(&watcher) as Arc<dyn taskforge_events::TaskSaveHook>)
        .on_message(Arc::clone(&watcher) as Arc<dyn taskforge_events::MessageSaveHook>);

    // --- Store ---
    let store = Arc::new(TaskStore::new(hooks));
    seed_demo_users(&store).await;

    // --- WebSocket manager + background tasks ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));
    let forwarder_handle = ws::start_bus_forwarder(Arc::clone(&bus), Arc::clone(&ws_manager));

    // --- App state + router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        ws_manager: Arc::clone(&ws_manager),
        notifier,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the bus so the forwarder observes a closed channel and exits.
    drop(bus);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), forwarder_handle).await;
    tracing::info!("Bus forwarder stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Seed a demo admin and client so the write path is usable out of the box.
/// There is no registration endpoint; identities normally come from the
/// upstream account system.
async fn seed_demo_users(store: &TaskStore) {
    store
        .upsert_user(UserIdentity {
            id: 1,
            handle: "admin".to_string(),
            full_name: Some("Taskforge Admin".to_string()),
            email: "admin@taskforge.local".to_string(),
        })
        .await;
    store
        .upsert_user(UserIdentity {
            id: 2,
            handle: "demo_client".to_string(),
            full_name: None,
            email: "client@taskforge.local".to_string(),
        })
        .await;
    tracing::info!(
        admin_role = ROLE_ADMIN,
        client_role = ROLE_CLIENT,
        "Seeded demo users (ids 1 and 2)"
    );
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
