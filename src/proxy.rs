//! Route table for the `/auth`, `/hub` and `/kai` development proxies.
//!
//! Each route is plain data: a prefix, an upstream target and three policies
//! applied in order (path rewrite, request headers, response inspection).
//! The handler in [`crate::handlers`] drives the I/O; everything here is pure.

use axum::http::{
    HeaderMap, HeaderName, HeaderValue, StatusCode, Uri,
    header::{ACCEPT, AUTHORIZATION, COOKIE, HOST},
};
use std::net::IpAddr;
use tracing::debug;

use crate::env::EnvConfig;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Cookie carrying the SSO access token.
pub const TOKEN_COOKIE: &str = "keycloak_cookie";

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 10] = [
    "host",
    "accept-encoding",
    "connection",
    "keep-alive",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Auth,
    Hub,
    Kai,
}

impl RouteKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Hub => "HUB",
            Self::Kai => "KAI",
        }
    }
}

/// How the matched prefix is rewritten before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRewrite {
    Keep,
    StripPrefix,
    ReplacePrefix(&'static str),
}

/// Headers added to the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderPolicy {
    /// Set `X-Forwarded-For` and `X-Real-IP` to the caller address.
    pub forward_client_addr: bool,
    /// Set `X-Forwarded-Host` to the incoming `Host`.
    pub forward_host: bool,
    /// Turn this cookie into a bearer `Authorization` header when none is set.
    pub bearer_cookie: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
    PassThrough,
    /// A 401 for a non-JSON request becomes a redirect to `/`.
    RedirectOnUnauthorized,
}

/// What the handler does with the upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Forward,
    RedirectToRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub kind: RouteKind,
    pub prefix: &'static str,
    /// Upstream base URL without a trailing slash.
    pub target: String,
    pub rewrite: PathRewrite,
    pub headers: HeaderPolicy,
    pub response: ResponsePolicy,
}

impl ProxyRoute {
    /// True for the prefix itself or any path continuing it with `/`.
    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Applies the rewrite rule to a path this route matches.
    pub fn rewrite_path(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.prefix).unwrap_or(path);
        match self.rewrite {
            PathRewrite::Keep => path.to_string(),
            PathRewrite::StripPrefix if rest.is_empty() => "/".to_string(),
            PathRewrite::StripPrefix => rest.to_string(),
            PathRewrite::ReplacePrefix(replacement) => format!("{replacement}{rest}"),
        }
    }

    /// Full upstream URL for `uri`, query string included.
    pub fn upstream_url(&self, uri: &Uri) -> String {
        let path = self.rewrite_path(uri.path());
        match uri.query() {
            Some(query) => format!("{}{}?{}", self.target, path, query),
            None => format!("{}{}", self.target, path),
        }
    }

    /// Builds the upstream request headers from the incoming ones.
    ///
    /// Hop-by-hop headers are dropped, so the upstream `Host` comes from the
    /// target URL.
    pub fn upstream_headers(&self, incoming: &HeaderMap, client: Option<IpAddr>) -> HeaderMap {
        let mut upstream = HeaderMap::with_capacity(incoming.len() + 3);
        for (name, value) in incoming {
            if !HOP_BY_HOP.contains(&name.as_str()) {
                upstream.append(name.clone(), value.clone());
            }
        }

        if self.headers.forward_client_addr
            && let Some(addr) = client
            && let Ok(value) = HeaderValue::from_str(&addr.to_string())
        {
            upstream.insert(X_FORWARDED_FOR, value.clone());
            upstream.insert(X_REAL_IP, value);
        }

        if self.headers.forward_host
            && let Some(host) = incoming.get(HOST)
        {
            upstream.insert(X_FORWARDED_HOST, host.clone());
        }

        if let Some(cookie) = self.headers.bearer_cookie
            && !incoming.contains_key(AUTHORIZATION)
            && let Some(token) = cookie_value(incoming, cookie)
        {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    upstream.insert(AUTHORIZATION, value);
                }
                Err(_) => debug!("{} cookie is not a valid header value", cookie),
            }
        }

        upstream
    }

    /// Decides whether the upstream response is forwarded or replaced.
    ///
    /// `reason` is the upstream reason phrase when the transport exposes one.
    pub fn response_action(
        &self,
        status: StatusCode,
        reason: Option<&str>,
        incoming: &HeaderMap,
    ) -> ResponseAction {
        match self.response {
            ResponsePolicy::PassThrough => ResponseAction::Forward,
            ResponsePolicy::RedirectOnUnauthorized => {
                let unauthorized =
                    status == StatusCode::UNAUTHORIZED || reason == Some("Unauthorized");
                if unauthorized && !accepts_json(incoming) {
                    ResponseAction::RedirectToRoot
                } else {
                    ResponseAction::Forward
                }
            }
        }
    }
}

/// The fixed set of proxied prefixes.
#[derive(Debug, Clone)]
pub struct ProxyRouteTable {
    routes: Vec<ProxyRoute>,
}

impl ProxyRouteTable {
    pub fn new(env: &EnvConfig) -> Self {
        let hub_headers = HeaderPolicy {
            bearer_cookie: Some(TOKEN_COOKIE),
            ..HeaderPolicy::default()
        };
        let hub_target = env.hub_target().trim_end_matches('/').to_string();

        Self {
            routes: vec![
                ProxyRoute {
                    kind: RouteKind::Auth,
                    prefix: "/auth",
                    target: env.auth_target().trim_end_matches('/').to_string(),
                    rewrite: PathRewrite::Keep,
                    headers: HeaderPolicy {
                        forward_client_addr: true,
                        forward_host: true,
                        bearer_cookie: None,
                    },
                    response: ResponsePolicy::PassThrough,
                },
                ProxyRoute {
                    kind: RouteKind::Hub,
                    prefix: "/hub",
                    target: hub_target.clone(),
                    rewrite: PathRewrite::StripPrefix,
                    headers: hub_headers,
                    response: ResponsePolicy::RedirectOnUnauthorized,
                },
                ProxyRoute {
                    kind: RouteKind::Kai,
                    prefix: "/kai",
                    target: hub_target,
                    rewrite: PathRewrite::ReplacePrefix("/services/kai"),
                    headers: hub_headers,
                    response: ResponsePolicy::RedirectOnUnauthorized,
                },
            ],
        }
    }

    pub fn routes(&self) -> &[ProxyRoute] {
        &self.routes
    }

    /// The route with the longest prefix matching `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<&ProxyRoute> {
        self.routes
            .iter()
            .filter(|route| route.matches(path))
            .max_by_key(|route| route.prefix.len())
    }
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("application/json"))
}

/// Percent-decoded value of the cookie `name`. Empty values count as absent.
///
/// A value that does not decode to UTF-8 is returned as sent.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))?;

    let value = urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ProxyRouteTable {
        ProxyRouteTable::new(&EnvConfig::default())
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_resolve_and_rewrite() {
        let table = table();

        let hub = table.resolve("/hub/apps").unwrap();
        assert_eq!(hub.kind, RouteKind::Hub);
        assert_eq!(hub.target, "http://localhost:9002");
        assert_eq!(hub.rewrite_path("/hub/apps"), "/apps");

        let kai = table.resolve("/kai/tasks").unwrap();
        assert_eq!(kai.kind, RouteKind::Kai);
        assert_eq!(kai.target, "http://localhost:9002");
        assert_eq!(kai.rewrite_path("/kai/tasks"), "/services/kai/tasks");

        let auth = table.resolve("/auth/login").unwrap();
        assert_eq!(auth.kind, RouteKind::Auth);
        assert_eq!(auth.target, "http://localhost:9001");
        assert_eq!(auth.rewrite_path("/auth/login"), "/auth/login");
    }

    #[test]
    fn test_unmatched_paths() {
        let table = table();
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/applications").is_none());
        assert!(table.resolve("/hubx").is_none());
        assert!(table.resolve("/api/hub").is_none());
    }

    #[test]
    fn test_bare_prefix() {
        let table = table();
        let hub = table.resolve("/hub").unwrap();
        assert_eq!(hub.rewrite_path("/hub"), "/");
        let kai = table.resolve("/kai").unwrap();
        assert_eq!(kai.rewrite_path("/kai"), "/services/kai");
    }

    #[test]
    fn test_upstream_url_keeps_query() {
        let env = EnvConfig::build([("TACKLE_HUB_URL", "http://hub:8080/")]);
        let table = ProxyRouteTable::new(&env);
        let uri: Uri = "/hub/applications?filter=name:foo&limit=10".parse().unwrap();
        let route = table.resolve(uri.path()).unwrap();
        assert_eq!(
            route.upstream_url(&uri),
            "http://hub:8080/applications?filter=name:foo&limit=10"
        );
    }

    #[test]
    fn test_bearer_from_cookie() {
        let table = table();
        let hub = table.resolve("/hub/apps").unwrap();
        let incoming = headers(&[("cookie", "theme=dark; keycloak_cookie=abc123")]);
        let upstream = hub.upstream_headers(&incoming, None);
        assert_eq!(upstream.get(AUTHORIZATION).unwrap(), "Bearer abc123");
        assert!(upstream.get(X_FORWARDED_FOR).is_none());
    }

    #[test]
    fn test_existing_authorization_is_kept() {
        let table = table();
        let kai = table.resolve("/kai/tasks").unwrap();
        let incoming = headers(&[
            ("cookie", "keycloak_cookie=abc123"),
            ("authorization", "Bearer original"),
        ]);
        let upstream = kai.upstream_headers(&incoming, None);
        assert_eq!(upstream.get(AUTHORIZATION).unwrap(), "Bearer original");
    }

    #[test]
    fn test_auth_route_never_injects_bearer() {
        let table = table();
        let auth = table.resolve("/auth/login").unwrap();
        let incoming = headers(&[("cookie", "keycloak_cookie=abc123")]);
        assert!(auth.upstream_headers(&incoming, None).get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_forwarding_headers() {
        let table = table();
        let auth = table.resolve("/auth/realms").unwrap();
        let incoming = headers(&[("host", "ui.example.com"), ("connection", "keep-alive")]);
        let upstream = auth.upstream_headers(&incoming, Some("10.1.2.3".parse().unwrap()));

        assert_eq!(upstream.get(X_FORWARDED_FOR).unwrap(), "10.1.2.3");
        assert_eq!(upstream.get(X_REAL_IP).unwrap(), "10.1.2.3");
        assert_eq!(upstream.get(X_FORWARDED_HOST).unwrap(), "ui.example.com");
        assert!(upstream.get(HOST).is_none());
        assert!(upstream.get("connection").is_none());

        let hub = table.resolve("/hub").unwrap();
        let upstream = hub.upstream_headers(&incoming, Some("10.1.2.3".parse().unwrap()));
        assert!(upstream.get(X_FORWARDED_HOST).is_none());
        assert!(upstream.get(X_REAL_IP).is_none());
    }

    #[test]
    fn test_unauthorized_redirects_browser_requests() {
        let table = table();
        let hub = table.resolve("/hub/apps").unwrap();
        let html = headers(&[("accept", "text/html,application/xhtml+xml")]);
        let json = headers(&[("accept", "application/json, text/plain, */*")]);

        assert_eq!(
            hub.response_action(StatusCode::UNAUTHORIZED, None, &html),
            ResponseAction::RedirectToRoot
        );
        assert_eq!(
            hub.response_action(StatusCode::UNAUTHORIZED, None, &HeaderMap::new()),
            ResponseAction::RedirectToRoot
        );
        assert_eq!(
            hub.response_action(StatusCode::UNAUTHORIZED, None, &json),
            ResponseAction::Forward
        );
        assert_eq!(
            hub.response_action(StatusCode::FORBIDDEN, Some("Unauthorized"), &html),
            ResponseAction::RedirectToRoot
        );
        assert_eq!(
            hub.response_action(StatusCode::OK, Some("OK"), &html),
            ResponseAction::Forward
        );
    }

    #[test]
    fn test_hub_and_kai_share_policies() {
        let table = table();
        let hub = table.resolve("/hub").unwrap();
        let kai = table.resolve("/kai").unwrap();
        assert_eq!(hub.headers, kai.headers);
        assert_eq!(hub.response, kai.response);

        let auth = table.resolve("/auth").unwrap();
        assert_eq!(
            auth.response_action(StatusCode::UNAUTHORIZED, None, &HeaderMap::new()),
            ResponseAction::Forward
        );
    }

    #[test]
    fn test_cookie_value() {
        let map = headers(&[
            ("cookie", "a=1; keycloak_cookie=\"tok\""),
            ("cookie", "b=2"),
        ]);
        assert_eq!(cookie_value(&map, TOKEN_COOKIE).as_deref(), Some("tok"));
        assert_eq!(cookie_value(&map, "b").as_deref(), Some("2"));
        assert_eq!(cookie_value(&map, "c"), None);

        let empty = headers(&[("cookie", "keycloak_cookie=")]);
        assert_eq!(cookie_value(&empty, TOKEN_COOKIE), None);
    }

    #[test]
    fn test_cookie_value_is_percent_decoded() {
        let map = headers(&[("cookie", "keycloak_cookie=ey%2Babc%3D%3D; bad=%FF")]);
        assert_eq!(cookie_value(&map, TOKEN_COOKIE).as_deref(), Some("ey+abc=="));
        assert_eq!(cookie_value(&map, "bad").as_deref(), Some("%FF"));

        let hub = table().resolve("/hub/apps").unwrap().clone();
        let upstream = hub.upstream_headers(&map, None);
        assert_eq!(upstream.get(AUTHORIZATION).unwrap(), "Bearer ey+abc==");
    }

    #[test]
    fn test_hop_by_hop_headers_are_dropped() {
        let table = table();
        let hub = table.resolve("/hub/apps").unwrap();
        let incoming = headers(&[
            ("transfer-encoding", "chunked"),
            ("proxy-authorization", "Basic c2VjcmV0"),
            ("te", "trailers"),
            ("x-request-id", "abc"),
        ]);
        let upstream = hub.upstream_headers(&incoming, None);
        assert!(upstream.get("transfer-encoding").is_none());
        assert!(upstream.get("proxy-authorization").is_none());
        assert!(upstream.get("te").is_none());
        assert_eq!(upstream.get("x-request-id").unwrap(), "abc");
    }
}
