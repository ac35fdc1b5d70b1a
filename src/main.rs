//! Development server for the Konveyor UI.
//!
//! - Proxies `/auth` to the SSO server and `/hub`, `/kai` to the hub
//! - Serves branding assets and the client bundle with a hydrated `index.html`
//! - Logs every request with a color-coded id and latency

use std::{process::ExitCode, sync::Arc};
use tracing::{Level, error, info};

use konveyor_ui_server::{
    branding::{BrandingStrings, branding_asset_dir},
    cli::Cli,
    env::EnvConfig,
    error::StartupError,
    router::build_router,
    state::AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    let level = if std::env::var_os("DEBUG").is_some() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match run(argh::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), StartupError> {
    let env = EnvConfig::from_process_env();
    let bind = args.bind_addr(env.listen_port());
    let branding_dir = branding_asset_dir(&env);
    let branding = BrandingStrings::load(&branding_dir).await?;

    let static_dir = match args.static_dir {
        Some(path) => Some(
            path.canonicalize()
                .map_err(|source| StartupError::StaticDir { path, source })?,
        ),
        None => None,
    };

    let state = Arc::new(AppState::new(env, branding, static_dir)?);

    for route in state.routes.routes() {
        info!("Proxying {}/* to: {}", route.prefix, route.target);
    }
    info!("Branding from: {:?}", branding_dir);
    match &state.static_dir {
        Some(dir) => info!("Serving static files from: {:?}", dir),
        None => info!("No --static-dir given, static requests will 404"),
    }
    info!(
        "Environment: NODE_ENV={} VERSION={} AUTH_REQUIRED={}",
        state.env.node_env, state.env.version, state.env.auth_required
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|source| StartupError::Bind { addr: bind, source })?;
    info!("Server running on: http://{}", bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}
