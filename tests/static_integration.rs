//! Integration tests for the client bundle, branding and environment endpoints

use axum::http::StatusCode;
use konveyor_ui_server::{
    branding::BrandingStrings,
    codec::decode_env_as,
    env::{ClientEnv, EnvConfig, SERVER_ENV_KEYS},
    router::build_router,
    state::AppState,
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

const INDEX: &str = r#"<html><head><title><%= branding.application.title %></title></head>
<body><script>window._env="<%= _env %>";</script></body></html>"#;

async fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("konveyor-ui-{}-{}", name, nanoid::nanoid!(6)));
    tokio::fs::create_dir_all(dir.join("static/js")).await.unwrap();
    tokio::fs::create_dir_all(dir.join("branding/images")).await.unwrap();
    tokio::fs::write(dir.join("static/index.html"), INDEX).await.unwrap();
    tokio::fs::write(dir.join("static/js/main.js"), "console.log(1);").await.unwrap();
    tokio::fs::write(dir.join("branding/images/logo.svg"), "<svg/>").await.unwrap();
    dir
}

async fn spawn_server(dir: &PathBuf) -> (SocketAddr, EnvConfig) {
    let env = EnvConfig::build([
        ("BRANDING", dir.join("branding").to_string_lossy().into_owned()),
        ("TACKLE_HUB_URL", "http://hub.internal:8080".to_string()),
        ("AUTH_REQUIRED", "true".to_string()),
    ]);
    let state = AppState::new(
        env.clone(),
        BrandingStrings::builtin().unwrap(),
        Some(dir.join("static")),
    )
    .unwrap();
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    (addr, env)
}

fn extract_env(html: &str) -> ClientEnv {
    let marker = "window._env=\"";
    let start = html.find(marker).unwrap() + marker.len();
    let end = start + html[start..].find('"').unwrap();
    decode_env_as(&html[start..end]).unwrap().unwrap()
}

#[tokio::test]
async fn test_index_is_hydrated() {
    let dir = fixture_dir("index").await;
    let (addr, env) = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    for path in ["/", "/applications/42"] {
        let response = client
            .get(format!("http://{}{}", addr, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let html = response.text().await.unwrap();
        assert!(html.contains("<title>App Decomposer</title>"));
        assert!(!html.contains("hub.internal"));
        assert_eq!(extract_env(&html), env.client_safe());
    }

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_assets_and_missing_files() {
    let dir = fixture_dir("assets").await;
    let (addr, _) = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/js/main.js", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .contains("javascript")
    );
    assert_eq!(response.text().await.unwrap(), "console.log(1);");

    let response = client
        .get(format!("http://{}/js/missing.js", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("http://{}/../Cargo.toml", addr))
        .send()
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_branding_endpoints() {
    let dir = fixture_dir("branding").await;
    let (addr, _) = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/branding/images/logo.svg", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<svg/>");

    let body = client
        .get(format!("http://{}/branding.json", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let strings: BrandingStrings = serde_json::from_str(&body).unwrap();
    assert_eq!(strings, BrandingStrings::builtin().unwrap());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_env_endpoint_is_client_safe() {
    let dir = fixture_dir("env").await;
    let (addr, env) = spawn_server(&dir).await;

    let body = reqwest::Client::new()
        .get(format!("http://{}/env", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();

    let object = value.as_object().unwrap();
    for key in SERVER_ENV_KEYS {
        assert!(!object.contains_key(key));
    }
    assert_eq!(object["AUTH_REQUIRED"], "true");
    assert_eq!(serde_json::from_value::<ClientEnv>(value.clone()).unwrap(), env.client_safe());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
