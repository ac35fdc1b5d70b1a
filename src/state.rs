//! Shared application state.

use std::{path::PathBuf, sync::Arc};

use crate::{
    branding::BrandingStrings,
    codec::encode_env,
    env::{EnvConfig, SERVER_ENV_KEYS},
    error::StartupError,
    proxy::ProxyRouteTable,
};

/// Read-only state handed to every handler. Built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Arc<EnvConfig>,
    pub routes: ProxyRouteTable,
    pub branding: BrandingStrings,
    /// Client-safe environment token injected into `index.html`.
    pub encoded_env: String,
    /// Built client bundle. Without it only the proxies and branding are served.
    pub static_dir: Option<PathBuf>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(
        env: EnvConfig,
        branding: BrandingStrings,
        static_dir: Option<PathBuf>,
    ) -> Result<Self, StartupError> {
        let encoded_env = encode_env(&env, &SERVER_ENV_KEYS)?;
        // Redirects from the auth server and hub belong to the browser.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            routes: ProxyRouteTable::new(&env),
            env: Arc::new(env),
            branding,
            encoded_env,
            static_dir,
            client,
        })
    }
}
