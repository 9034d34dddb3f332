//! Tests for the disk-queue consumer

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use esgate_cluster::StaticCluster;
use esgate_config::ConsumerConfig;
use esgate_flow::GatewayRequest;
use esgate_queue::{DurableQueue, MemoryQueue};

use super::*;
use crate::{Upstream, UpstreamError, UpstreamResponse};

/// Scripted upstream capturing every dispatched request
#[derive(Default)]
struct StubUpstream {
    responses: Mutex<VecDeque<std::result::Result<UpstreamResponse, UpstreamError>>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl StubUpstream {
    fn returning(status: u16, body: &[u8]) -> Arc<Self> {
        let stub = Self::default();
        stub.push_response(Ok(UpstreamResponse {
            status,
            headers: Vec::new(),
            body: body.to_vec(),
        }));
        Arc::new(stub)
    }

    fn push_response(&self, response: std::result::Result<UpstreamResponse, UpstreamError>) {
        self.responses.lock().push_back(response);
    }

    fn captured(&self) -> Vec<GatewayRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn execute(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<UpstreamResponse, UpstreamError> {
        self.requests.lock().push(request.clone());
        self.responses.lock().pop_front().unwrap_or(Ok(UpstreamResponse {
            status: 200,
            headers: Vec::new(),
            body: b"{}".to_vec(),
        }))
    }
}

fn config(input: &str) -> ConsumerConfig {
    ConsumerConfig {
        input_queue: input.to_string(),
        elasticsearch: "prod".to_string(),
        idle_timeout_in_seconds: 1,
        ..ConsumerConfig::default()
    }
}

fn consumer_with(
    config: ConsumerConfig,
    upstream: Arc<StubUpstream>,
) -> (Arc<MemoryQueue>, Arc<StaticCluster>, DiskQueueConsumer) {
    let queue = Arc::new(MemoryQueue::new());
    let cluster = Arc::new(StaticCluster::new("prod", "10.0.0.1:9200"));
    let consumer = DiskQueueConsumer::new(
        config,
        Arc::clone(&queue) as Arc<dyn DurableQueue>,
        Arc::clone(&cluster) as _,
        upstream,
    );
    (queue, cluster, consumer)
}

fn payload(body: &[u8]) -> Bytes {
    GatewayRequest::new("POST", "/logs/_bulk")
        .with_header("Content-Type", "application/x-ndjson")
        .with_body(body)
        .encode()
}

const BULK_BODY: &[u8] =
    b"{\"index\":{\"_index\":\"logs\",\"_id\":\"1\"}}\n{\"msg\":\"a\"}\n{\"index\":{\"_index\":\"logs\",\"_id\":\"2\"}}\n{\"msg\":\"b\"}\n{\"delete\":{\"_index\":\"logs\",\"_id\":\"3\"}}\n";

#[tokio::test]
async fn test_permanent_rejection_dead_letters_original_bytes() {
    let upstream = StubUpstream::returning(400, b"mapping error");
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), Arc::clone(&upstream));

    let message = payload(BULK_BODY);
    consumer.process_message(&message).await.unwrap();

    let invalid = queue.drain("bulk-invalid");
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0], message);
    assert!(queue.drain("bulk-failure").is_empty());
    assert_eq!(consumer.metrics().snapshot().invalid_enqueued, 1);
}

#[tokio::test]
async fn test_transient_failures_requeue_original_bytes() {
    for status in [429u16, 500, 503] {
        let upstream = StubUpstream::returning(status, b"busy");
        let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

        let message = payload(BULK_BODY);
        consumer.process_message(&message).await.unwrap();

        let failures = queue.drain("bulk-failure");
        assert_eq!(failures.len(), 1, "status {status}");
        assert_eq!(failures[0], message);
        assert!(queue.drain("bulk-invalid").is_empty());
    }
}

#[tokio::test]
async fn test_network_error_requeues() {
    let upstream = Arc::new(StubUpstream::default());
    upstream.push_response(Err(UpstreamError::Unavailable("connection refused".into())));
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

    let message = payload(BULK_BODY);
    consumer.process_message(&message).await.unwrap();
    assert_eq!(queue.drain("bulk-failure").len(), 1);
}

#[tokio::test]
async fn test_not_found_is_terminal_success() {
    let upstream = StubUpstream::returning(404, b"no such index");
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

    consumer.process_message(&payload(BULK_BODY)).await.unwrap();
    assert!(queue.drain("bulk-failure").is_empty());
    assert!(queue.drain("bulk-invalid").is_empty());
    assert_eq!(consumer.metrics().snapshot().succeeded, 1);
}

#[tokio::test]
async fn test_decode_garbage_dead_letters() {
    let upstream = Arc::new(StubUpstream::default());
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), Arc::clone(&upstream));

    let garbage = Bytes::from_static(b"\xde\xad\xbe\xef");
    consumer.process_message(&garbage).await.unwrap();

    assert_eq!(queue.drain("bulk-invalid"), vec![garbage]);
    // Nothing was dispatched upstream
    assert!(upstream.captured().is_empty());
    assert_eq!(consumer.metrics().snapshot().decode_failures, 1);
}

#[tokio::test]
async fn test_request_rewritten_to_active_host() {
    let upstream = StubUpstream::returning(200, b"{}");
    let (_queue, _cluster, consumer) =
        consumer_with(config("plain"), Arc::clone(&upstream));

    let message = GatewayRequest::new("GET", "/_cluster/health").encode();
    consumer.process_message(&message).await.unwrap();

    let captured = upstream.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].uri, "http://10.0.0.1:9200/_cluster/health");
}

#[tokio::test]
async fn test_compression_applied_before_dispatch() {
    let upstream = StubUpstream::returning(200, b"{}");
    let mut cfg = config("plain");
    cfg.compress = true;
    let (_queue, _cluster, consumer) = consumer_with(cfg, Arc::clone(&upstream));

    let message = GatewayRequest::new("POST", "/logs/_doc")
        .with_body(&b"{\"f\":\"value value value\"}"[..])
        .encode();
    consumer.process_message(&message).await.unwrap();

    let captured = upstream.captured();
    assert_eq!(captured[0].header("Content-Encoding"), Some("gzip"));

    // The dispatched body gunzips back to the original
    let mut decoder = flate2::write::GzDecoder::new(Vec::new());
    decoder.write_all(&captured[0].body).unwrap();
    assert_eq!(decoder.finish().unwrap(), b"{\"f\":\"value value value\"}");
}

#[tokio::test]
async fn test_already_gzipped_body_is_not_recompressed() {
    let upstream = StubUpstream::returning(200, b"{}");
    let mut cfg = config("plain");
    cfg.compress = true;
    let (_queue, _cluster, consumer) = consumer_with(cfg, Arc::clone(&upstream));

    let message = GatewayRequest::new("POST", "/logs/_doc")
        .with_header("Content-Encoding", "gzip")
        .with_body(&b"pretend-gzip"[..])
        .encode();
    consumer.process_message(&message).await.unwrap();

    assert_eq!(upstream.captured()[0].body, b"pretend-gzip");
}

#[tokio::test]
async fn test_bulk_partial_failure_routes_buckets() {
    let response = br#"{"took":3,"errors":true,"items":[
      {"index":{"_index":"logs","_id":"1","status":201}},
      {"index":{"_index":"logs","_id":"2","status":429,"error":{"type":"rejected","reason":"queue full"}}},
      {"delete":{"_index":"logs","_id":"3","status":400,"error":{"type":"bad","reason":"nope"}}}]}"#;
    let upstream = StubUpstream::returning(200, response);

    let mut cfg = config("bulk");
    cfg.save_partial_success_requests = true;
    let (queue, _cluster, consumer) = consumer_with(cfg, upstream);

    consumer.process_message(&payload(BULK_BODY)).await.unwrap();

    let failures = queue.drain("bulk-failure");
    assert_eq!(failures.len(), 1);
    let replay = GatewayRequest::decode(&failures[0]).unwrap();
    assert_eq!(
        replay.body,
        b"{\"index\":{\"_index\":\"logs\",\"_id\":\"2\"}}\n{\"msg\":\"b\"}\n"
    );

    let invalid = queue.drain("bulk-invalid");
    assert_eq!(invalid.len(), 1);
    let replay = GatewayRequest::decode(&invalid[0]).unwrap();
    assert_eq!(replay.body, b"{\"delete\":{\"_index\":\"logs\",\"_id\":\"3\"}}\n");

    let partial = queue.drain("bulk-partial-success");
    assert_eq!(partial.len(), 1);
    let replay = GatewayRequest::decode(&partial[0]).unwrap();
    assert_eq!(
        replay.body,
        b"{\"index\":{\"_index\":\"logs\",\"_id\":\"1\"}}\n{\"msg\":\"a\"}\n"
    );
}

#[tokio::test]
async fn test_bulk_all_success_routes_nothing() {
    let response = br#"{"took":3,"errors":false,"items":[
      {"index":{"_index":"logs","_id":"1","status":201}},
      {"index":{"_index":"logs","_id":"2","status":200}},
      {"delete":{"_index":"logs","_id":"3","status":200}}]}"#;
    let upstream = StubUpstream::returning(200, response);
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

    consumer.process_message(&payload(BULK_BODY)).await.unwrap();
    assert!(queue.drain("bulk-failure").is_empty());
    assert!(queue.drain("bulk-invalid").is_empty());
    assert!(queue.drain("bulk-partial-success").is_empty());
}

#[tokio::test]
async fn test_bulk_unparseable_response_dead_letters() {
    let upstream = StubUpstream::returning(200, b"<html>proxy says hi</html>");
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

    let message = payload(BULK_BODY);
    consumer.process_message(&message).await.unwrap();
    assert_eq!(queue.drain("bulk-invalid"), vec![message]);
}

#[tokio::test]
async fn test_pool_exits_when_cluster_unavailable() {
    let upstream = Arc::new(StubUpstream::default());
    let (_queue, cluster, consumer) = consumer_with(config("bulk"), upstream);
    cluster.set_available(false);

    let consumer = Arc::new(consumer);
    tokio::time::timeout(Duration::from_secs(5), consumer.run())
        .await
        .expect("workers must exit promptly")
        .unwrap();
}

#[tokio::test]
async fn test_cancellation_stops_pool() {
    let upstream = Arc::new(StubUpstream::default());
    let mut cfg = config("bulk");
    cfg.worker_size = 3;
    let (_queue, _cluster, consumer) = consumer_with(cfg, upstream);

    let consumer = Arc::new(consumer);
    let cancel = consumer.cancellation_token();
    let pool = tokio::spawn(Arc::clone(&consumer).run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), pool)
        .await
        .expect("pool must stop after cancellation")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_worker_drains_input_queue() {
    let upstream = StubUpstream::returning(400, b"bad");
    let (queue, _cluster, consumer) = consumer_with(config("bulk"), upstream);

    queue.push("bulk", payload(BULK_BODY)).await.unwrap();

    let consumer = Arc::new(consumer);
    let cancel = consumer.cancellation_token();
    let pool = tokio::spawn(Arc::clone(&consumer).run());

    // Wait for the worker to pop and classify
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if queue.depth("bulk-invalid").await.unwrap() == 1 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "worker never processed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), pool)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(consumer.metrics().snapshot().popped, 1);
}

#[tokio::test]
async fn test_zero_workers_rejected() {
    let upstream = Arc::new(StubUpstream::default());
    let mut cfg = config("bulk");
    cfg.worker_size = 0;
    let (_queue, _cluster, consumer) = consumer_with(cfg, upstream);

    assert!(matches!(
        Arc::new(consumer).run().await,
        Err(ConsumerError::NoWorkers)
    ));
}
