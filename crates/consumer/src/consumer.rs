//! Worker pool draining a disk queue into an upstream cluster

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use esgate_bulk::{handle_bulk_response, BulkBufferPool, BulkResponseParseConfig, RetryRules};
use esgate_cluster::ClusterMetadata;
use esgate_config::ConsumerConfig;
use esgate_flow::GatewayRequest;
use esgate_queue::DurableQueue;
use esgate_rate::LimiterRegistry;

use crate::throttle::gate_traffic;
use crate::{ConsumerError, ConsumerMetrics, Result, Upstream, UpstreamError};

const WAITING_AFTER_INTERVAL: Duration = Duration::from_secs(5);

/// Pool of workers replaying one input queue against one cluster
pub struct DiskQueueConsumer {
    config: ConsumerConfig,
    failure_queue: String,
    invalid_queue: String,
    partial_success_queue: String,
    queue: Arc<dyn DurableQueue>,
    cluster: Arc<dyn ClusterMetadata>,
    upstream: Arc<dyn Upstream>,
    limiters: Arc<LimiterRegistry>,
    buffers: Arc<BulkBufferPool>,
    retry_rules: RetryRules,
    metrics: Arc<ConsumerMetrics>,
    cancel: CancellationToken,
}

impl DiskQueueConsumer {
    /// Create a consumer; queue names left empty in the config are derived
    /// from the input queue
    pub fn new(
        config: ConsumerConfig,
        queue: Arc<dyn DurableQueue>,
        cluster: Arc<dyn ClusterMetadata>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        let failure_queue = config.failure_queue();
        let invalid_queue = config.invalid_queue();
        let partial_success_queue = config.partial_success_queue();
        Self {
            config,
            failure_queue,
            invalid_queue,
            partial_success_queue,
            queue,
            cluster,
            upstream,
            limiters: Arc::new(LimiterRegistry::new()),
            buffers: Arc::new(BulkBufferPool::new(8, 64 * 1024)),
            retry_rules: RetryRules::default(),
            metrics: Arc::new(ConsumerMetrics::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Share a limiter cache with other consumers of the same cluster
    #[must_use]
    pub fn with_limiters(mut self, limiters: Arc<LimiterRegistry>) -> Self {
        self.limiters = limiters;
        self
    }

    /// Override the retry policy for whole-response classification
    #[must_use]
    pub fn with_retry_rules(mut self, rules: RetryRules) -> Self {
        self.retry_rules = rules;
        self
    }

    /// Counters shared by the pool
    pub fn metrics(&self) -> Arc<ConsumerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Token cancelling the pool; also set internally on fatal errors
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the worker pool until cancellation, cluster unavailability or a
    /// fatal queue error
    pub async fn run(self: Arc<Self>) -> Result<()> {
        if self.config.worker_size == 0 {
            return Err(ConsumerError::NoWorkers);
        }

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.worker_size {
            let consumer = Arc::clone(&self);
            workers.spawn(async move { consumer.worker_loop(worker_id).await });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "consumer worker failed");
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "consumer worker panicked");
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn worker_loop(&self, worker_id: usize) -> Result<()> {
        let idle = Duration::from_secs(self.config.idle_timeout_in_seconds.max(1));

        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!(worker_id, "worker cancelled");
                return Ok(());
            }

            if !self.cluster.is_available() {
                tracing::debug!(
                    worker_id,
                    cluster = %self.cluster.config().name,
                    "cluster not available, worker stopping"
                );
                return Ok(());
            }

            if self.waiting_on_upstream_queues().await? {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(WAITING_AFTER_INTERVAL) => {}
                }
                continue;
            }

            let popped = self
                .queue
                .pop_timeout(&self.config.input_queue, idle)
                .await
                .inspect_err(|_| self.cancel.cancel())?;
            let Some(payload) = popped.into_payload() else {
                continue;
            };
            ConsumerMetrics::incr(&self.metrics.popped);

            if let Err(error) = self.process_message(&payload).await {
                // A failed push is unrecoverable: the payload would be lost
                tracing::error!(worker_id, error = %error, "queue push failed, cancelling pool");
                self.cancel.cancel();
                return Err(error);
            }
        }
    }

    /// Whether any `waiting_after` queue still has pending payloads
    async fn waiting_on_upstream_queues(&self) -> Result<bool> {
        for name in &self.config.waiting_after {
            let depth = self.queue.depth(name).await?;
            if depth > 0 {
                tracing::debug!(queue = %name, depth, "waiting for queue to drain first");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Replay one payload and route the outcome
    async fn process_message(&self, payload: &Bytes) -> Result<()> {
        let mut request = match GatewayRequest::decode(payload) {
            Ok(request) => request,
            Err(error) => {
                ConsumerMetrics::incr(&self.metrics.decode_failures);
                tracing::error!(error = %error, "failed to decode replay request, dead-lettering");
                return self.push_invalid(payload).await;
            }
        };

        let original_uri = request.uri.clone();
        let host = self.cluster.active_host();
        request.set_scheme_and_host(self.cluster.schema().as_str(), &host);

        let accept_gzip = request
            .header("Accept-Encoding")
            .map(|v| v.contains("gzip"))
            .unwrap_or(false);
        let already_gzipped = request
            .header("Content-Encoding")
            .map(|v| v.eq_ignore_ascii_case("gzip"))
            .unwrap_or(false);

        let mut compressed = false;
        if self.config.compress && !already_gzipped && !request.body.is_empty() {
            match gzip_best(&request.body) {
                Ok(body) => {
                    request.body = body;
                    request.set_header("Content-Encoding", "gzip");
                    request.set_header("Accept-Encoding", "gzip");
                    compressed = true;
                }
                Err(error) => {
                    tracing::error!(error = %error, "gzip failed, sending uncompressed");
                }
            }
        }

        if let Some(control) = self.cluster.traffic_control() {
            let request_bytes = (request.body.len() + request.uri.len()) as u64;
            gate_traffic(
                &self.limiters,
                &self.cluster.config().id,
                &host,
                &control,
                request_bytes,
                &self.metrics,
            )
            .await;
        }

        ConsumerMetrics::incr(&self.metrics.replayed);
        let executed = self.upstream.execute(&request).await;

        // Restore the as-queued target before any logging below
        request.uri = original_uri;

        let mut response = match executed {
            Ok(response) => response,
            Err(UpstreamError::Unavailable(reason)) => {
                tracing::warn!(uri = %request.uri, reason, "upstream unreachable, re-queueing");
                return self.push_failure(payload).await;
            }
            Err(UpstreamError::InvalidRequest(reason)) => {
                tracing::error!(uri = %request.uri, reason, "unreplayable request, dead-lettering");
                return self.push_invalid(payload).await;
            }
        };

        // The caller never asked for gzip; hand decompression back
        if compressed
            && !accept_gzip
            && response
                .header("Content-Encoding")
                .map(|v| v.eq_ignore_ascii_case("gzip"))
                .unwrap_or(false)
        {
            match gunzip(&response.body) {
                Ok(body) => {
                    response.body = body;
                    response.remove_header("Content-Encoding");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "failed to decode gzip response body");
                }
            }
        }

        match response.status {
            200 | 201 => {
                if request.path().contains("_bulk") {
                    self.route_bulk_buckets(&request, &response.body, payload)
                        .await?;
                }
                ConsumerMetrics::incr(&self.metrics.succeeded);
                Ok(())
            }
            // The resource is gone; replaying cannot change that
            404 => {
                ConsumerMetrics::incr(&self.metrics.succeeded);
                Ok(())
            }
            status if status != 429 && (400..500).contains(&status) => {
                tracing::error!(
                    status,
                    uri = %request.uri,
                    queue = %self.invalid_queue,
                    "permanent upstream rejection, dead-lettering"
                );
                self.push_invalid(payload).await
            }
            status => {
                tracing::debug!(status, uri = %request.uri, "transient upstream failure");
                self.push_failure(payload).await
            }
        }
    }

    /// Partition a bulk response and persist the non-success buckets
    async fn route_bulk_buckets(
        &self,
        request: &GatewayRequest,
        response_body: &[u8],
        payload: &Bytes,
    ) -> Result<()> {
        let parse_config = BulkResponseParseConfig {
            doc_buffer_size: self.config.doc_buffer_size,
            ..BulkResponseParseConfig::default()
        };

        let mut success = self.buffers.acquire();
        let mut invalid = self.buffers.acquire();
        let mut retryable = self.buffers.acquire();

        let outcome = handle_bulk_response(
            &request.body_bytes(),
            response_body,
            &mut success,
            &mut invalid,
            &mut retryable,
            &parse_config,
            &self.retry_rules,
        );

        let result = match outcome {
            Err(error) => {
                tracing::error!(error = %error, "bulk correlation failed, dead-lettering");
                self.push_invalid(payload).await
            }
            Ok(outcome) if outcome.contains_error => {
                let mut push_result = Ok(());
                if invalid.message_count() > 0 {
                    invalid.safety_end_with_newline();
                    let replay = request.override_body_encode(invalid.message_bytes());
                    push_result = self.push_invalid(&replay).await;
                }
                if push_result.is_ok() && retryable.message_count() > 0 {
                    retryable.safety_end_with_newline();
                    let replay = request.override_body_encode(retryable.message_bytes());
                    push_result = self.push_failure(&replay).await;
                }
                if push_result.is_ok()
                    && success.message_count() > 0
                    && self.config.save_partial_success_requests
                {
                    success.safety_end_with_newline();
                    let replay = request.override_body_encode(success.message_bytes());
                    push_result = self
                        .queue
                        .push(&self.partial_success_queue, replay)
                        .await
                        .map_err(Into::into)
                        .map(|()| {
                            ConsumerMetrics::incr(&self.metrics.partial_success_enqueued);
                        });
                }
                push_result
            }
            Ok(_) => Ok(()),
        };

        self.buffers.release(success);
        self.buffers.release(invalid);
        self.buffers.release(retryable);
        result
    }

    async fn push_failure(&self, payload: &Bytes) -> Result<()> {
        self.queue.push(&self.failure_queue, payload.clone()).await?;
        ConsumerMetrics::incr(&self.metrics.failures_enqueued);
        Ok(())
    }

    async fn push_invalid(&self, payload: &Bytes) -> Result<()> {
        self.queue.push(&self.invalid_queue, payload.clone()).await?;
        ConsumerMetrics::incr(&self.metrics.invalid_enqueued);
        Ok(())
    }
}

fn gzip_best(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(body)?;
    encoder.finish()
}

fn gunzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(Vec::new());
    decoder.write_all(body)?;
    decoder.finish()
}

#[cfg(test)]
#[path = "consumer_test.rs"]
mod tests;
