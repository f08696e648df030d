#![cfg(feature = "peer-http")]

//! End-to-end exercise of the wire protocol: a real `axum` server fronting
//! a `Group`, fetched from over real HTTP by an `HttpPeerGetter`. This
//! covers the cross-process mechanics, minus a second independent group
//! registry a literal two-node test would need (registries are process-wide
//! singletons, and this test runs in a single process -- see DESIGN.md for
//! how the rest of that scenario is covered elsewhere).

use std::sync::atomic::{AtomicUsize, Ordering};

use peercache::group::{GetterFn, PeerGetter};
use peercache::transport::HttpPeerGetter;
use peercache::{CacheError, Group};

fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

async fn spawn_server() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = peercache::server::router("/_mycache/");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn fetches_a_value_from_a_running_peer_over_http() {
    let name = unique_name("wire-hit");
    let _group = Group::new(
        name.clone(),
        1024,
        GetterFn(|key: &str| -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
            match key {
                "Sam" => Ok(b"567".to_vec()),
                _ => Err(format!("{key} not exist").into()),
            }
        }),
    );

    let addr = spawn_server().await;
    let getter = HttpPeerGetter::new(reqwest::Client::new(), format!("http://{addr}"), "/_mycache/");

    let bytes = getter.get(&name, "Sam").await.unwrap();
    assert_eq!(bytes, b"567");
}

#[tokio::test]
async fn unknown_group_over_the_wire_surfaces_as_a_peer_error() {
    let addr = spawn_server().await;
    let getter = HttpPeerGetter::new(reqwest::Client::new(), format!("http://{addr}"), "/_mycache/");

    let err = getter.get("no-such-group", "key").await.unwrap_err();
    assert!(matches!(err, CacheError::Peer(_)));
}

#[tokio::test]
async fn origin_failure_over_the_wire_surfaces_as_a_peer_error() {
    let name = unique_name("wire-origin-error");
    let _group = Group::new(
        name.clone(),
        1024,
        GetterFn(|key: &str| -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
            Err(format!("{key} not exist").into())
        }),
    );

    let addr = spawn_server().await;
    let getter = HttpPeerGetter::new(reqwest::Client::new(), format!("http://{addr}"), "/_mycache/");

    let err = getter.get(&name, "missing").await.unwrap_err();
    assert!(matches!(err, CacheError::Peer(_)));
}
