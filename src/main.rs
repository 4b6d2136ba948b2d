use authgate::{
    auth::{jwt::JwtService, session::SessionRegistry},
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    routes,
    services::AuthService,
    store::PgUserStore,
    telemetry,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("authgate {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    dotenv::dotenv().ok();

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Authgate starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    let store = Arc::new(PgUserStore::new(db_pool));
    let jwt_service = Arc::new(JwtService::from_config(&config)?);
    let sessions = Arc::new(SessionRegistry::new());

    let auth_service = Arc::new(AuthService::new(
        store.clone(),
        jwt_service.clone(),
        sessions.clone(),
        Arc::new(config.clone()),
    ));

    let app_state = Arc::new(AppState {
        store,
        auth_service,
        jwt_service,
        sessions: sessions.clone(),
    });

    start_session_pruner(
        sessions,
        config.security.session_prune_interval_secs,
        config.security.session_grace_secs,
    );

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    let shutdown_timeout =
        tokio::time::Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        })
        .into_future();

    // In-flight requests get the configured window after the signal;
    // past that the process exits without waiting for them
    tokio::select! {
        result = server => {
            result?;
            tracing::info!("Server shutdown complete");
        }
        _ = async {
            let _ = drain_rx.await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = config.server.graceful_shutdown_timeout_secs,
                "Graceful shutdown timed out, exiting"
            );
        }
    }

    Ok(())
}

/// Background task reclaiming storage for sessions past expiry plus the
/// grace window
fn start_session_pruner(sessions: Arc<SessionRegistry>, interval_secs: u64, grace_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let removed = sessions.prune(chrono::Duration::seconds(grace_secs as i64));
            if removed > 0 {
                tracing::debug!(removed, tracked = sessions.len(), "Pruned expired sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

fn print_help() {
    println!("authgate {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: authgate [options]");
    println!();
    println!("Options:");
    println!("  --version     Print version and exit");
    println!("  --help        Print this help and exit");
    println!();
    println!("Environment:");
    println!("  All configuration is environment-driven (AUTHGATE_ prefix).");
    println!("  See .env.example for the available settings.");
}
