/// Auth Service - Main entry point
/// Serves the REST API and the gRPC AuthService side by side
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use auth_service::{
    config::Settings,
    db::PgUserRepository,
    grpc::AuthGrpcService,
    handlers,
    metrics::initialize_auth_metrics,
    proto::auth_service_server::AuthServiceServer,
    AppState, TokenAuthService,
};
use jwt_security::{
    LoginThrottle, RedisStore, RevocationLedger, SharedStore, ThrottlePolicy, TokenSigner,
    TokenValidator, TokenVerifier,
};
use redis_utils::RedisPool;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting auth-service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!(
        http_port = settings.server.http_port,
        grpc_port = settings.server.grpc_port,
        revocation_failure_mode = %settings.auth.revocation_failure_mode,
        throttle_failure_mode = %settings.auth.throttle_failure_mode,
        "Configuration loaded"
    );

    initialize_auth_metrics();

    // Credential store
    let pg_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database pool created");

    // Shared store for revocation and throttling
    let redis = RedisPool::connect(&settings.redis.url, Duration::from_secs(5))
        .await
        .context("Failed to connect to Redis")?;
    let store: Arc<dyn SharedStore> = Arc::new(RedisStore::new(
        redis.manager(),
        settings.auth.store_timeout,
    ));
    info!("Redis connection established");

    let auth = &settings.auth;
    let validator = Arc::new(TokenValidator::new(
        TokenVerifier::new(&auth.signing_secret),
        RevocationLedger::new(store.clone()),
        auth.revocation_failure_mode,
    ));
    let policy = ThrottlePolicy::new(auth.max_login_attempts, auth.lockout_window)
        .context("Invalid login throttle policy")?;
    let throttle = LoginThrottle::new(store, policy, auth.throttle_failure_mode);

    let service = Arc::new(TokenAuthService::new(
        Arc::new(PgUserRepository::new(pg_pool)),
        TokenSigner::new(&auth.signing_secret),
        validator,
        throttle,
        auth.token_ttl,
    ));
    let app_state = AppState::new(service, settings.server.https_enabled)
        .with_trusted_forwarding(settings.server.trust_forwarded_headers);

    let grpc_addr = format!("{}:{}", settings.server.host, settings.server.grpc_port)
        .parse()
        .context("Invalid gRPC address")?;
    let http_addr = format!("{}:{}", settings.server.host, settings.server.http_port);

    let mut join_set = JoinSet::new();

    let http_state = web::Data::new(app_state.clone());
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(http_state.clone())
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run();

    join_set.spawn(async move {
        http_server
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
    });
    info!("HTTP server listening on http://{}", http_addr);

    let grpc_service = AuthGrpcService::new(app_state);
    join_set.spawn(async move {
        Server::builder()
            .add_service(AuthServiceServer::new(grpc_service))
            .serve_with_shutdown(grpc_addr, shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("gRPC server error: {}", e))
    });
    info!("gRPC server listening on grpc://{}", grpc_addr);

    // Wait for any server to stop (or fail)
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => info!("Server stopped"),
            Ok(Err(e)) => {
                error!("Server failed: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                error!("Server task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Server task panicked: {}", e));
            }
        }
    }

    info!("auth-service shutting down");
    Ok(())
}
