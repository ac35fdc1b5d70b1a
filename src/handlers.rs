//! HTTP request handlers.

use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::{Extension, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use hyper::ext::ReasonPhrase;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    branding::BrandingStrings,
    colors::{colored_id, route_label, static_label},
    env::ClientEnv,
    error::ProxyError,
    middleware::RequestContext,
    proxy::ResponseAction,
    state::AppState,
};

/// Placeholder in `index.html` replaced by the encoded client environment.
pub const ENV_PLACEHOLDER: &str = "<%= _env %>";
/// Placeholder in `index.html` replaced by the application title.
pub const TITLE_PLACEHOLDER: &str = "<%= branding.application.title %>";

const INDEX_FILE: &str = "index.html";

/// Forwards a request matching one of the proxy routes.
///
/// The route's rewrite and header policies shape the upstream request; its
/// response policy may replace a 401 with a redirect to `/`. Upstream
/// failures surface as 502 without retry.
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Body,
) -> Result<Response, ProxyError> {
    let route = state
        .routes
        .resolve(uri.path())
        .ok_or_else(|| ProxyError::NoRoute(uri.path().to_string()))?;

    let body = read_body(body, state.env.upload_limit_bytes()).await?;

    let url = route.upstream_url(&uri);
    let upstream_headers = route.upstream_headers(&headers, context.client);

    info!("{} → {} {}", colored_id(&context.id), route_label(route.kind), url);
    let proxy_start_time = Instant::now();

    let response = state
        .client
        .request(method.clone(), &url)
        .headers(upstream_headers)
        .body(body)
        .send()
        .await?;

    let status = response.status();
    info!(
        "{} ← {} {} ({}ms)",
        colored_id(&context.id),
        route_label(route.kind),
        status,
        proxy_start_time.elapsed().as_millis()
    );

    // hyper keeps the reason phrase only when it differs from the canonical one.
    let reason = response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .or_else(|| status.canonical_reason());
    if route.response_action(status, reason, &headers) == ResponseAction::RedirectToRoot {
        debug!("{} unauthorized page load, redirecting to /", colored_id(&context.id));
        log_total(&context, &method, StatusCode::FOUND);
        return Ok(Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "/")
            .body(Body::empty())?);
    }

    let mut builder = Response::builder().status(status);
    for (key, value) in response.headers() {
        if !matches!(
            key.as_str(),
            "transfer-encoding" | "content-encoding" | "connection" | "keep-alive"
        ) {
            builder = builder.header(key, value);
        }
    }

    log_total(&context, &method, status);
    Ok(builder.body(Body::from_stream(response.bytes_stream()))?)
}

/// Buffers the request body, refusing anything over `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    to_bytes(body, limit).await.map_err(|err| {
        let err = err.into_inner();
        if err.is::<LengthLimitError>() {
            ProxyError::BodyTooLarge { limit }
        } else {
            ProxyError::RequestBody(err)
        }
    })
}

fn log_total(context: &RequestContext, method: &Method, status: StatusCode) {
    info!(
        "{} ← {} {} ({}ms)",
        colored_id(&context.id),
        method,
        status,
        context.started.elapsed().as_millis()
    );
}

/// Serves the client bundle.
///
/// Directories resolve to their `index.html`, and paths without a file
/// extension fall back to the root `index.html` so client-side routes load.
/// Every served `index.html` is hydrated with the client environment.
pub async fn serve_static(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    uri: Uri,
) -> Result<Response, StatusCode> {
    let result = match &state.static_dir {
        Some(dir) => read_static(&state, dir, uri.path()).await,
        None => Err(StatusCode::NOT_FOUND),
    };

    let status = result
        .as_ref()
        .map_or_else(|status| *status, |response| response.status());
    info!(
        "{} ← {} {} ({}ms)",
        colored_id(&context.id),
        static_label(),
        status,
        context.started.elapsed().as_millis()
    );
    result
}

async fn read_static(state: &AppState, dir: &Path, path: &str) -> Result<Response, StatusCode> {
    let relative = path.trim_start_matches('/');
    if relative.split('/').any(|segment| segment == "..") {
        return Err(StatusCode::NOT_FOUND);
    }

    let mut file_path = dir.join(relative);
    if fs::metadata(&file_path).await.is_ok_and(|meta| meta.is_dir()) {
        file_path.push(INDEX_FILE);
    }

    let (file_path, content) = match fs::read(&file_path).await {
        Ok(content) => (file_path, content),
        Err(_) if is_client_route(relative) => {
            let index = dir.join(INDEX_FILE);
            let content = fs::read(&index).await.map_err(|_| StatusCode::NOT_FOUND)?;
            (index, content)
        }
        Err(_) => return Err(StatusCode::NOT_FOUND),
    };

    let body = if file_path.file_name().is_some_and(|name| name == INDEX_FILE) {
        Body::from(hydrate_index(
            &String::from_utf8_lossy(&content),
            &state.encoded_env,
            &state.branding,
        ))
    } else {
        Body::from(content)
    };

    let mime_type = mime_guess::from_path(&file_path).first_or_octet_stream();
    let content_type =
        HeaderValue::from_str(mime_type.as_ref()).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}

/// A path the client router owns rather than a missing asset.
fn is_client_route(relative: &str) -> bool {
    PathBuf::from(relative).extension().is_none()
}

/// Fills the `index.html` placeholders.
pub fn hydrate_index(template: &str, encoded_env: &str, branding: &BrandingStrings) -> String {
    template
        .replace(ENV_PLACEHOLDER, encoded_env)
        .replace(TITLE_PLACEHOLDER, &branding.application.title)
}

/// The client-safe environment as JSON.
pub async fn client_env(State(state): State<Arc<AppState>>) -> Json<ClientEnv> {
    Json(state.env.client_safe())
}

/// The effective branding strings as JSON.
pub async fn branding_strings(State(state): State<Arc<AppState>>) -> Json<BrandingStrings> {
    Json(state.branding.clone())
}
