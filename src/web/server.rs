use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{api, AppState};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Home dashboard
        .route("/", get(api::home))
        .route("/charts/:name", get(api::chart_svg))
        // Stock trading
        .route("/stocks", get(api::stocks_page))
        .route("/stocks/search", post(api::search_stock))
        .route("/stocks/orders", post(api::place_order))
        .route("/stocks/orders/:id/cancel", post(api::cancel_order))
        // Local expense tracker
        .route("/expenses", get(api::expenses_page).post(api::add_expense))
        .route("/api/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_dashboard_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Dashboard server starting on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
