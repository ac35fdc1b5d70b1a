//! Development server for the Konveyor UI: environment resolution, the
//! `/auth`, `/hub` and `/kai` proxies, branding and the client bundle.

pub mod branding;
pub mod cli;
pub mod codec;
pub mod colors;
pub mod env;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
