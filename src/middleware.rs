//! Request logging middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use nanoid::nanoid;
use std::{
    net::{IpAddr, SocketAddr},
    time::Instant,
};
use tracing::info;

use crate::colors::colored_id;

/// Per-request data stored in the request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: String,
    pub started: Instant,
    /// Caller address, known when the server runs with connect info.
    pub client: Option<IpAddr>,
}

/// Tags each request with a short colored id and logs the request line.
pub async fn log_requests(mut req: Request<Body>, next: Next) -> Response {
    let context = RequestContext {
        id: nanoid!(5),
        started: Instant::now(),
        client: req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip()),
    };

    info!(
        "{} → {} {}",
        colored_id(&context.id),
        req.method(),
        req.uri().path()
    );
    req.extensions_mut().insert(context);
    next.run(req).await
}
