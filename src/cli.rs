//! Command-line interface configuration.

use argh::FromArgs;
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Development server for the UI: proxies /auth, /hub and /kai and serves the client bundle
#[derive(Debug, FromArgs)]
pub struct Cli {
    /// path to the built client bundle (e.g. 'client/dist/')
    #[argh(option, long = "static-dir")]
    pub static_dir: Option<PathBuf>,

    /// server bind address (default: 0.0.0.0 on $PORT, or 8080)
    #[argh(option)]
    pub bind: Option<SocketAddr>,
}

impl Cli {
    pub fn bind_addr(&self, port: u16) -> SocketAddr {
        self.bind
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }
}
