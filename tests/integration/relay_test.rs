use radgate_tests::{access_request, LibDir, RunningRelay};
use std::time::Duration;
use tokio::net::UdpSocket;

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_allowed_request_round_trip() {
    let lib = LibDir::new();
    lib.allow("alice.aabbccddeeff");
    let relay = RunningRelay::start(&lib, "plugins = ['usermac']").await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let request = access_request(1, "Alice", "AA-BB-CC-DD-EE-FF");
    client.send_to(&request, relay.addr).await.unwrap();

    let (forwarded, session_addr) = relay.upstream_recv(WAIT).await.unwrap();
    assert_eq!(forwarded, request);

    relay
        .upstream
        .send_to(b"access-accept", session_addr)
        .await
        .unwrap();
    let mut buf = [0u8; 64];
    let (len, from) = tokio::time::timeout(WAIT, client.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..len], b"access-accept");
    assert_eq!(from.port(), relay.addr.port());
}

#[tokio::test]
async fn test_denied_request_is_dropped() {
    let lib = LibDir::new();
    let relay = RunningRelay::start(&lib, "plugins = ['usermac']").await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&access_request(2, "mallory", "11-22-33-44-55-66"), relay.addr)
        .await
        .unwrap();

    assert!(relay.upstream_recv(QUIET).await.is_none());
    let mut buf = [0u8; 64];
    assert!(tokio::time::timeout(QUIET, client.recv_from(&mut buf))
        .await
        .is_err());
    // The session exists even though nothing was forwarded.
    assert_eq!(relay.server.table().len(), 1);
}

#[tokio::test]
async fn test_undecodable_request_is_forwarded() {
    let lib = LibDir::new();
    let relay = RunningRelay::start(&lib, "plugins = ['usermac']").await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"not radius", relay.addr).await.unwrap();

    let (forwarded, _) = relay.upstream_recv(WAIT).await.unwrap();
    assert_eq!(forwarded, b"not radius");
}

#[tokio::test]
async fn test_sessions_per_client_address() {
    let lib = LibDir::new();
    let relay = RunningRelay::start(&lib, "").await;

    let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let second = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    first.send_to(b"one", relay.addr).await.unwrap();
    let (_, from_first) = relay.upstream_recv(WAIT).await.unwrap();
    first.send_to(b"two", relay.addr).await.unwrap();
    let (_, again) = relay.upstream_recv(WAIT).await.unwrap();
    second.send_to(b"three", relay.addr).await.unwrap();
    let (_, from_second) = relay.upstream_recv(WAIT).await.unwrap();

    assert_eq!(from_first, again);
    assert_ne!(from_first, from_second);
    assert_eq!(relay.server.table().len(), 2);
}

#[tokio::test]
async fn test_reload_resets_sessions_and_cache() {
    let lib = LibDir::new();
    let relay = RunningRelay::start(&lib, "plugins = ['usermac']").await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let request = access_request(3, "bob", "00:11:22:33:44:55");

    client.send_to(&request, relay.addr).await.unwrap();
    assert!(relay.upstream_recv(QUIET).await.is_none());

    // Cached denial survives the new marker until reload.
    lib.allow("bob.001122334455");
    client.send_to(&request, relay.addr).await.unwrap();
    assert!(relay.upstream_recv(QUIET).await.is_none());

    relay.server.reload();
    assert!(relay.server.table().is_empty());

    client.send_to(&request, relay.addr).await.unwrap();
    let (forwarded, _) = relay.upstream_recv(WAIT).await.unwrap();
    assert_eq!(forwarded, request);
    assert_eq!(relay.server.table().len(), 1);
}
