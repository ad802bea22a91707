//! Shared utilities for integration tests.

use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use static_preview::http::static_files;
use static_preview::{LifecycleState, ServerLifecycle};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[allow(dead_code)]
pub const INDEX_HTML: &str = "<!doctype html><title>Preview</title><h1>It works</h1>";

/// Bind `len` consecutive localhost ports and keep them occupied.
#[allow(dead_code)]
pub fn hold_port_block(len: u16) -> (u16, Vec<TcpListener>) {
    for _ in 0..50 {
        let base = TcpListener::bind((LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        if base > u16::MAX - len {
            continue;
        }

        let held: Vec<TcpListener> = (base..base + len)
            .map_while(|port| TcpListener::bind((LOCALHOST, port)).ok())
            .collect();
        if held.len() == usize::from(len) {
            return (base, held);
        }
    }
    panic!("no block of {len} consecutive free ports found");
}

/// First port of a block of `len` ports that were free a moment ago.
#[allow(dead_code)]
pub fn free_port_block(len: u16) -> u16 {
    let (base, held) = hold_port_block(len);
    drop(held);
    base
}

/// A small site: an index page and a stylesheet.
#[allow(dead_code)]
pub fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(dir.path().join("style.css"), "h1 { color: teal; }").unwrap();
    dir
}

#[allow(dead_code)]
pub fn lifecycle(root: &Path) -> Arc<ServerLifecycle> {
    Arc::new(ServerLifecycle::new(
        static_files::router(root),
        Duration::from_secs(1),
    ))
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll until the lifecycle reaches `state`, panicking after a second.
#[allow(dead_code)]
pub async fn wait_for_state(lifecycle: &ServerLifecycle, state: LifecycleState) {
    for _ in 0..100 {
        if lifecycle.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lifecycle never reached {state}, still {}", lifecycle.state());
}
