//! Tests for the fan-out socket

use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;

use super::*;

fn test_endpoint(dir: &tempfile::TempDir, name: &str) -> Endpoint {
    Endpoint::new(dir.path().join(name))
}

async fn wait_for_subscribers(socket: &PubSocket, n: usize) {
    for _ in 0..100 {
        if socket.subscriber_count().await >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} subscribers, got {}", socket.subscriber_count().await);
}

#[tokio::test]
async fn test_bind_and_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let socket = PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_secs(1)).unwrap();

    let mut sub = UnixStream::connect(socket.endpoint().path()).await.unwrap();
    wait_for_subscribers(&socket, 1).await;

    let delivered = socket.broadcast(Bytes::from_static(b"hello")).await;
    assert_eq!(delivered, 1);

    let mut buf = [0u8; 5];
    sub.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");

    socket.close().await;
}

#[tokio::test]
async fn test_fan_out_to_many_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let socket = PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_secs(1)).unwrap();

    let mut subs = Vec::new();
    for _ in 0..3 {
        subs.push(UnixStream::connect(socket.endpoint().path()).await.unwrap());
    }
    wait_for_subscribers(&socket, 3).await;

    let delivered = socket.broadcast(Bytes::from_static(b"x")).await;
    assert_eq!(delivered, 3);

    for sub in &mut subs {
        let mut buf = [0u8; 1];
        sub.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"x");
    }

    socket.close().await;
}

#[tokio::test]
async fn test_no_replay_for_late_subscriber() {
    let dir = tempfile::tempdir().unwrap();
    let socket = PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_secs(1)).unwrap();

    // Broadcast before anyone is connected.
    assert_eq!(socket.broadcast(Bytes::from_static(b"early")).await, 0);

    let mut sub = UnixStream::connect(socket.endpoint().path()).await.unwrap();
    wait_for_subscribers(&socket, 1).await;

    // The late subscriber only sees what is broadcast from now on.
    socket.broadcast(Bytes::from_static(b"late!")).await;
    let mut buf = [0u8; 5];
    sub.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"late!");

    socket.close().await;
}

#[tokio::test]
async fn test_slow_subscriber_is_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let socket =
        PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_millis(100)).unwrap();

    // Connect but never read; the kernel buffer is far smaller than 4 MiB,
    // so the write must stall and hit the timeout.
    let _stalled = UnixStream::connect(socket.endpoint().path()).await.unwrap();
    wait_for_subscribers(&socket, 1).await;

    let big = Bytes::from(vec![0u8; 4 * 1024 * 1024]);
    let delivered = socket.broadcast(big).await;
    assert_eq!(delivered, 0);
    assert_eq!(socket.subscriber_count().await, 0);

    socket.close().await;
}

#[tokio::test]
async fn test_stalled_subscribers_time_out_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let socket =
        PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_millis(500)).unwrap();

    // Three subscribers, none of which ever reads. Writes to them must
    // overlap: the whole broadcast takes about one timeout window, not
    // one per stalled subscriber.
    let mut stalled = Vec::new();
    for _ in 0..3 {
        stalled.push(UnixStream::connect(socket.endpoint().path()).await.unwrap());
    }
    wait_for_subscribers(&socket, 3).await;

    let big = Bytes::from(vec![0u8; 4 * 1024 * 1024]);
    let started = std::time::Instant::now();
    let delivered = socket.broadcast(big).await;
    let elapsed = started.elapsed();

    assert_eq!(delivered, 0);
    assert_eq!(socket.subscriber_count().await, 0);
    assert!(
        elapsed < Duration::from_millis(1200),
        "writes did not overlap: {elapsed:?}"
    );

    drop(stalled);
    socket.close().await;
}

#[tokio::test]
async fn test_live_socket_surfaces_address_in_use() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = test_endpoint(&dir, "a.sock");
    let socket = PubSocket::bind(endpoint.clone(), Duration::from_secs(1)).unwrap();

    match PubSocket::bind(endpoint, Duration::from_secs(1)) {
        Err(IpcError::AddressInUse { path }) => {
            assert_eq!(path, socket.endpoint().path());
        }
        other => panic!("expected AddressInUse, got {other:?}"),
    }

    socket.close().await;
}

#[tokio::test]
async fn test_stale_socket_file_is_reclaimed() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = test_endpoint(&dir, "a.sock");

    // A socket file with no listener behind it, as left by a dead process.
    let stale = PubSocket::bind(endpoint.clone(), Duration::from_secs(1)).unwrap();
    stale.cancel.cancel();
    let task = stale.accept_task.lock().take();
    if let Some(task) = task {
        let _ = task.await;
    }
    assert!(endpoint.path().exists());

    let socket = PubSocket::bind(endpoint, Duration::from_secs(1)).unwrap();
    let _sub = UnixStream::connect(socket.endpoint().path()).await.unwrap();
    wait_for_subscribers(&socket, 1).await;

    socket.close().await;
}

#[tokio::test]
async fn test_close_is_idempotent_and_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let socket = PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_secs(1)).unwrap();
    let path = socket.endpoint().path().to_path_buf();
    assert!(path.exists());

    socket.close().await;
    assert!(!path.exists());

    // Second close is a no-op, not an error.
    socket.close().await;

    // And no new subscriber can connect.
    assert!(UnixStream::connect(&path).await.is_err());
}

#[tokio::test]
async fn test_subscriber_sees_eof_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let socket = PubSocket::bind(test_endpoint(&dir, "a.sock"), Duration::from_secs(1)).unwrap();

    let mut sub = UnixStream::connect(socket.endpoint().path()).await.unwrap();
    wait_for_subscribers(&socket, 1).await;
    socket.close().await;

    let mut buf = [0u8; 1];
    let n = sub.read(&mut buf).await.unwrap();
    assert_eq!(n, 0, "expected EOF after close");
}
