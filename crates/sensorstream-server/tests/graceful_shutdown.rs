//! Shutdown with live-tail clients still connected

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sensorstream_core::test_utils::sample;
use sensorstream_server::{AppState, StreamSettings, build_router};
use sensorstream_streaming::{SampleStore, SubscriptionHub};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_open_live_tail_does_not_block_shutdown() {
    let mut store = SampleStore::new(16);
    store.append(sample(1, 1.0));
    let reader = store.reader();

    let shutdown = CancellationToken::new();
    let hub = Arc::new(SubscriptionHub::with_shutdown(
        reader.clone(),
        shutdown.child_token(),
    ));
    let state = AppState::new(reader, Arc::clone(&hub), StreamSettings::default());
    let app = build_router(state, Path::new("does-not-exist"));

    let listener = sensorstream_server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(sensorstream_server::serve(listener, app, shutdown.clone()));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /api/stream?cadence=10 HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let mut buf = vec![0u8; 1024];
    let mut received = String::new();
    while !received.contains("event: sample") {
        let n = timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("no live-tail data within timeout")
            .unwrap();
        assert!(n > 0, "connection closed early: {received}");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    assert_eq!(hub.active_count(), 1);

    shutdown.cancel();
    let served = timeout(Duration::from_secs(3), server)
        .await
        .expect("serve did not return after shutdown");
    served.unwrap().unwrap();

    for _ in 0..100 {
        if hub.active_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.active_count(), 0);
}
