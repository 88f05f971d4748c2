//! End-to-end relay scenarios: streaming chunks into a file sink.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use sim_bridge::{Error, FINISH_SENTINEL, FileSink, FrameSink, RelayConfig, VideoRelay};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Polls a predicate until it holds or the deadline passes.
fn wait_until(mut predicate: impl FnMut() -> bool, deadline: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

/// Streams the given chunks, then the finish sentinel, then disconnects.
fn stream_chunks(addr: SocketAddr, chunks: Vec<Vec<u8>>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("peer runtime");

        rt.block_on(async move {
            let (mut ws_stream, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("peer connect");

            for chunk in chunks {
                ws_stream
                    .send(Message::Binary(chunk.into()))
                    .await
                    .expect("send chunk");
            }

            ws_stream
                .send(Message::Text(FINISH_SENTINEL.into()))
                .await
                .expect("send finish");

            ws_stream.close(None).await.expect("close");
        });
    })
}

#[test]
fn chunks_are_appended_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recorded.webm");

    init_tracing();
    let relay = VideoRelay::new(RelayConfig::new());
    relay.start(FileSink::new(&path)).expect("relay start");
    let addr = relay.local_addr().expect("bound address");

    let peer = stream_chunks(addr, vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
    peer.join().expect("peer thread");

    // The sink finalizes on the sentinel, not on relay shutdown.
    assert!(wait_until(
        || std::fs::read(&path).is_ok_and(|bytes| bytes == [1, 2, 3, 4, 5, 6]),
        Duration::from_secs(5),
    ));

    relay.stop();
}

#[test]
fn sequential_peers_each_record_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recorded.webm");

    init_tracing();
    let relay = VideoRelay::new(RelayConfig::new());
    relay.start(FileSink::new(&path)).expect("relay start");
    let addr = relay.local_addr().expect("bound address");

    stream_chunks(addr, vec![vec![9, 9]]).join().expect("first peer");
    assert!(wait_until(
        || std::fs::read(&path).is_ok_and(|bytes| bytes == [9, 9]),
        Duration::from_secs(5),
    ));

    // A later peer starts a fresh recording in the same sink.
    stream_chunks(addr, vec![vec![7]]).join().expect("second peer");
    assert!(wait_until(
        || std::fs::read(&path).is_ok_and(|bytes| bytes == [7]),
        Duration::from_secs(5),
    ));

    relay.stop();
}

/// Sink that rejects every write, counting the calls it sees.
struct FailingSink {
    writes: Arc<AtomicUsize>,
    finishes: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameSink for FailingSink {
    async fn write_frame(&mut self, _bytes: &[u8]) -> sim_bridge::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(std::io::Error::other("no space left on device").into())
    }

    async fn finish(&mut self) -> sim_bridge::Result<()> {
        self.finishes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn sink_write_failure_drops_the_peer() {
    init_tracing();
    let writes = Arc::new(AtomicUsize::new(0));
    let finishes = Arc::new(AtomicUsize::new(0));

    let relay = VideoRelay::new(RelayConfig::new());
    relay
        .start(FailingSink {
            writes: Arc::clone(&writes),
            finishes: Arc::clone(&finishes),
        })
        .expect("relay start");
    let addr = relay.local_addr().expect("bound address");

    let peer = thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("peer runtime");

        rt.block_on(async move {
            let (mut ws_stream, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("peer connect");

            ws_stream
                .send(Message::Binary(vec![1, 2, 3].into()))
                .await
                .expect("send chunk");

            // The relay closes the connection after the failed write.
            loop {
                match ws_stream.next().await {
                    Some(Ok(message)) if message.is_close() => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        });
    });
    peer.join().expect("peer thread");

    assert_eq!(writes.load(Ordering::SeqCst), 1);
    // The partial recording is finalized, not appended to.
    assert!(wait_until(
        || finishes.load(Ordering::SeqCst) >= 1,
        Duration::from_secs(5),
    ));

    relay.stop();
}

#[test]
fn relay_lifecycle_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_tracing();
    let relay = VideoRelay::new(RelayConfig::new());

    assert!(matches!(relay.local_addr(), Err(Error::NotStarted)));

    relay
        .start(FileSink::new(dir.path().join("a.webm")))
        .expect("start");
    let addr = relay.local_addr().expect("bound address");

    // Second start is a no-op and keeps the original listener.
    relay
        .start(FileSink::new(dir.path().join("b.webm")))
        .expect("idempotent start");
    assert_eq!(relay.local_addr().expect("still bound"), addr);

    relay.stop();
    relay.stop();
    assert!(matches!(relay.local_addr(), Err(Error::NotStarted)));
}
