//! End-to-end: port fallback plus file serving over real sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use static_preview::config::{ServeMode, ServerConfig};
use static_preview::lifecycle::startup;
use static_preview::{LifecycleState, StartupError};

mod common;

use common::LOCALHOST;

fn config_for(site: &tempfile::TempDir, port: u16) -> ServerConfig {
    ServerConfig {
        requested_port: Some(port),
        bind_host: LOCALHOST,
        serving_root: site.path().to_path_buf(),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn busy_port_falls_back_and_serves_html() {
    let site = common::site();
    let (base, mut held) = common::hold_port_block(3);
    held.truncate(1);

    let port = startup::select_port(&config_for(&site, base)).unwrap();
    assert_eq!(port, base + 1);

    let lifecycle = common::lifecycle(site.path());
    let addr = lifecycle.bind(SocketAddr::new(LOCALHOST, port)).unwrap();
    lifecycle.start().unwrap();

    let client = common::client();
    let response = client
        .get(format!("http://{addr}/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    assert_eq!(response.text().await.unwrap(), common::INDEX_HTML);

    let response = client
        .get(format!("http://{addr}/style.css"))
        .send()
        .await
        .unwrap();
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/css"));

    let missing = client
        .get(format!("http://{addr}/missing.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    lifecycle.shutdown().await;
    assert_eq!(lifecycle.state(), LifecycleState::Closed);
}

#[test]
fn full_range_is_port_exhausted() {
    let site = common::site();
    let (base, _held) = common::hold_port_block(10);

    let err = startup::select_port(&config_for(&site, base)).unwrap_err();
    assert!(matches!(
        err,
        StartupError::PortExhausted { start, attempts: 10 } if start == base
    ));
    assert!(err.hint().is_some());
}

#[tokio::test]
async fn background_serve_returns_once_closed() {
    let site = common::site();
    let lifecycle = common::lifecycle(site.path());
    let addr = lifecycle.bind(SocketAddr::new(LOCALHOST, 0)).unwrap();

    let serving = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move { startup::serve(&lifecycle, ServeMode::Background).await })
    };
    common::wait_for_state(&lifecycle, LifecycleState::Serving).await;

    let response = common::client()
        .get(format!("http://{addr}/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(!serving.is_finished());

    lifecycle.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), serving)
        .await
        .expect("serve returned after shutdown")
        .unwrap()
        .unwrap();
}
