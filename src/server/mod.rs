use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::{any, get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod routes;
pub mod state;

use crate::config::AppConfig;
use crate::core::access::require_session;
use crate::utils::error::Result;
use routes::{
    add_funds_handler, balance_handler, collection_handler, convert_handler, health_handler,
    item_handler, itinerary_handler, page_handler, seat_handler, transfer_handler,
    wizard_submit_handler, wizard_validate_handler,
};
pub use state::AppState;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/dashboard", get(page_handler))
        .route("/dashboard/{*rest}", get(page_handler))
        .route("/admin", get(page_handler))
        .route("/admin/{*rest}", get(page_handler))
        .route("/supplier", get(page_handler))
        .route("/supplier/{*rest}", get(page_handler))
        .route("/wallet", get(page_handler))
        .route("/profile", get(page_handler));

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/api/wallet/{user_id}/balance", get(balance_handler))
        .route("/api/wallet/add", post(add_funds_handler))
        .route("/api/wallet/transfer", post(transfer_handler))
        .route("/api/wallet/convert", post(convert_handler))
        .route("/api/itinerary/group", post(itinerary_handler))
        .route("/api/wizard/validate", post(wizard_validate_handler))
        .route("/api/wizard/submit", post(wizard_submit_handler))
        .route("/api/seats/select", post(seat_handler))
        .route("/api/{resource}", any(collection_handler))
        .route("/api/{resource}/{id}", any(item_handler));

    pages
        .merge(api)
        .layer(middleware::from_fn_with_state(
            state.access.clone(),
            require_session,
        ))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> Result<()> {
    info!("Initializing state...");
    let address = config.bind_address();
    let state = AppState::new(config)?;
    info!("Proxying backend at {}", state.backend.base_url());

    let app = build_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
