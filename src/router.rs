//! Router assembly.

use axum::{
    Router, middleware,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    branding::branding_asset_dir,
    handlers::{branding_strings, client_env, proxy, serve_static},
    middleware::log_requests,
    state::AppState,
};

/// Proxy prefixes go to [`proxy`]; everything else is local.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut proxies = Router::new();
    for route in state.routes.routes() {
        proxies = proxies
            .route(route.prefix, any(proxy))
            .route(&format!("{}/{{*rest}}", route.prefix), any(proxy));
    }

    let local = Router::new()
        .route("/env", get(client_env))
        .route("/branding.json", get(branding_strings))
        .nest_service("/branding", ServeDir::new(branding_asset_dir(&state.env)))
        .fallback(get(serve_static))
        .layer(CompressionLayer::new());

    proxies
        .merge(local)
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
