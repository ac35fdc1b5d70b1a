//! UI environment configuration resolved from process variables over defaults.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Keys only the server needs. They never reach the client.
pub const SERVER_ENV_KEYS: [&str; 4] = ["PORT", "KEYCLOAK_SERVER_URL", "TACKLE_HUB_URL", "BRANDING"];

const DEFAULT_VERSION: &str = "99.0.0";
const DEFAULT_MOCK: &str = "off";
const DEFAULT_KEYCLOAK_REALM: &str = "tackle";
const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "tackle-ui";
const DEFAULT_UPLOAD_LIMIT: &str = "500m";
const DEFAULT_AUTH_TARGET: &str = "http://localhost:9001";
const DEFAULT_HUB_TARGET: &str = "http://localhost:9002";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BRANDING_DIR: &str = "branding";

/// Value of `NODE_ENV`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeEnv {
    Development,
    #[default]
    Production,
    Test,
}

impl FromStr for NodeEnv {
    type Err = UnknownNodeEnv;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(UnknownNodeEnv(other.to_string())),
        }
    }
}

impl fmt::Display for NodeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        })
    }
}

/// A `NODE_ENV` value outside `development`, `production` and `test`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown NODE_ENV value {0:?}")]
pub struct UnknownNodeEnv(pub String);

/// The complete environment of the UI, including server-only fields.
///
/// Built once at startup with [`EnvConfig::build`] and never mutated. Field
/// names serialize exactly as the environment variables they come from, and
/// unset optional fields are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EnvConfig {
    pub node_env: NodeEnv,
    /// Listen port of the UI server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub version: String,
    /// Controls how mock data is injected on the client.
    pub mock: String,
    /// Target of the `/auth` proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keycloak_server_url: Option<String>,
    #[serde(with = "flag")]
    pub auth_required: bool,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    /// Upload size limit, e.g. `500m`.
    pub ui_ingress_proxy_body_size: String,
    /// Whether the hub has RWX volumes for its maven repository.
    #[serde(with = "flag")]
    pub rwx_supported: bool,
    /// Target of the `/hub` and `/kai` proxies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tackle_hub_url: Option<String>,
    /// Location of the branding directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            node_env: NodeEnv::default(),
            port: None,
            version: DEFAULT_VERSION.to_string(),
            mock: DEFAULT_MOCK.to_string(),
            keycloak_server_url: None,
            auth_required: false,
            keycloak_realm: DEFAULT_KEYCLOAK_REALM.to_string(),
            keycloak_client_id: DEFAULT_KEYCLOAK_CLIENT_ID.to_string(),
            ui_ingress_proxy_body_size: DEFAULT_UPLOAD_LIMIT.to_string(),
            rwx_supported: true,
            tackle_hub_url: None,
            branding: None,
        }
    }
}

impl EnvConfig {
    /// Layers `overrides` over the defaults.
    ///
    /// Unknown names are ignored. Empty values and values an enum or flag
    /// field cannot parse leave the default in place.
    pub fn build<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::default();
        for (key, value) in overrides {
            let Some(value) = non_empty(value.into()) else {
                continue;
            };
            match key.as_ref() {
                "NODE_ENV" => {
                    if let Ok(mode) = value.parse() {
                        env.node_env = mode;
                    }
                }
                "PORT" => env.port = Some(value),
                "VERSION" => env.version = value,
                "MOCK" => env.mock = value,
                "KEYCLOAK_SERVER_URL" => env.keycloak_server_url = Some(value),
                "AUTH_REQUIRED" => {
                    if let Some(required) = flag::parse(&value) {
                        env.auth_required = required;
                    }
                }
                "KEYCLOAK_REALM" => env.keycloak_realm = value,
                "KEYCLOAK_CLIENT_ID" => env.keycloak_client_id = value,
                "UI_INGRESS_PROXY_BODY_SIZE" => env.ui_ingress_proxy_body_size = value,
                "RWX_SUPPORTED" => {
                    if let Some(supported) = flag::parse(&value) {
                        env.rwx_supported = supported;
                    }
                }
                "TACKLE_HUB_URL" => env.tackle_hub_url = Some(value),
                "BRANDING" => env.branding = Some(value),
                _ => {}
            }
        }
        env
    }

    /// Reads the current process environment.
    pub fn from_process_env() -> Self {
        Self::build(std::env::vars())
    }

    /// Drops the server-only fields.
    pub fn client_safe(&self) -> ClientEnv {
        ClientEnv::from(self)
    }

    pub fn auth_target(&self) -> &str {
        self.keycloak_server_url
            .as_deref()
            .unwrap_or(DEFAULT_AUTH_TARGET)
    }

    pub fn hub_target(&self) -> &str {
        self.tackle_hub_url.as_deref().unwrap_or(DEFAULT_HUB_TARGET)
    }

    pub fn listen_port(&self) -> u16 {
        self.port
            .as_deref()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn branding_dir(&self) -> &str {
        self.branding.as_deref().unwrap_or(DEFAULT_BRANDING_DIR)
    }

    /// Upload limit in bytes. An unparsable size falls back to `500m`.
    pub fn upload_limit_bytes(&self) -> usize {
        parse_size(&self.ui_ingress_proxy_body_size)
            .or_else(|| parse_size(DEFAULT_UPLOAD_LIMIT))
            .unwrap_or(usize::MAX)
    }
}

/// The part of [`EnvConfig`] that may be shipped to the browser.
///
/// Has no field for any of [`SERVER_ENV_KEYS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClientEnv {
    pub node_env: NodeEnv,
    pub version: String,
    pub mock: String,
    #[serde(with = "flag")]
    pub auth_required: bool,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    pub ui_ingress_proxy_body_size: String,
    #[serde(with = "flag")]
    pub rwx_supported: bool,
}

impl From<&EnvConfig> for ClientEnv {
    fn from(env: &EnvConfig) -> Self {
        Self {
            node_env: env.node_env,
            version: env.version.clone(),
            mock: env.mock.clone(),
            auth_required: env.auth_required,
            keycloak_realm: env.keycloak_realm.clone(),
            keycloak_client_id: env.keycloak_client_id.clone(),
            ui_ingress_proxy_body_size: env.ui_ingress_proxy_body_size.clone(),
            rwx_supported: env.rwx_supported,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses sizes such as `500m`, `64k`, `1g` or a plain byte count.
fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim().to_ascii_lowercase();
    let (digits, multiplier) = match raw.chars().last()? {
        'k' => (&raw[..raw.len() - 1], 1usize << 10),
        'm' => (&raw[..raw.len() - 1], 1 << 20),
        'g' => (&raw[..raw.len() - 1], 1 << 30),
        _ => (raw.as_str(), 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(multiplier)
}

/// `"true"` / `"false"` string flags.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(raw: &str) -> Option<bool> {
        match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("expected \"true\" or \"false\", got {raw:?}")))
    }
}
