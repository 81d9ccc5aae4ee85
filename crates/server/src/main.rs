use shared_types::AppError;
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use server::auth::jwt::JwtKeys;
use server::db::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = server::config::load_config();

    server::telemetry::init_tracing();
    if config.features.telemetry {
        server::telemetry::init_telemetry();
    }
    server::health::record_start_time();

    let jwt = JwtKeys::from_env()?;

    let state = match db::create_pool()? {
        Some(pool) => {
            db::run_migrations(&pool).await?;
            tracing::info!("using Postgres stores");
            AppState::postgres(config.clone(), jwt, pool)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores (data is lost on exit)");
            AppState::in_memory(config.clone(), jwt)?
        }
    };

    let state = if config.features.s3 {
        state.with_s3().await?
    } else {
        state
    };

    let mut router = server::openapi::api_router(state);
    if config.features.telemetry {
        router = router.layer(server::telemetry::OtelTraceLayer);
    }
    let router = router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {e}", config.server.bind_addr)))?;
    tracing::info!(addr = %config.server.bind_addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
