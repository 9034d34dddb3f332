//! Bulk response partitioning filter
//!
//! Runs after the upstream response is on the context. For 200/201
//! responses to `_bulk` requests it correlates every response item with
//! its request item, partitions the request into success / retryable /
//! invalid buckets, attaches a [`BulkResult`] to the context, routes each
//! bucket to its configured queue, applies the configured tags, and
//! optionally runs a retry sub-flow inline before retryable items are
//! persisted. Non-2xx responses are enqueued whole when the retry policy
//! considers the status transient.

mod config;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use esgate_bulk::{handle_bulk_response, BulkBuffer, BulkOutcome, BULK_RESPONSE_STATUS_KEY};
use esgate_config::FilterConfig;
use esgate_queue::DurableQueue;
use esgate_rate::LimiterRegistry;

pub use config::BulkResponseConfig;

use crate::{Filter, FilterFactory, FilterFlow, FlowError, Registry, RequestContext, Result};

const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Filter partitioning bulk responses into durable queues
pub struct BulkResponseProcess {
    id: String,
    config: BulkResponseConfig,
    retry_flow: Option<Arc<FilterFlow>>,
    queue: Arc<dyn DurableQueue>,
    limiters: Arc<LimiterRegistry>,
    buffers: Arc<esgate_bulk::BulkBufferPool>,
}

#[async_trait]
impl Filter for BulkResponseProcess {
    fn name(&self) -> &'static str {
        "bulk_response_process"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Result<()> {
        if ctx.request.method != "POST" || !ctx.request.path().contains("_bulk") {
            return Ok(());
        }

        if matches!(ctx.response.status, 200 | 201) {
            let mut success = self.buffers.acquire();
            let mut invalid = self.buffers.acquire();
            let mut retryable = self.buffers.acquire();

            let result = self
                .process_2xx(ctx, &mut success, &mut invalid, &mut retryable)
                .await;

            self.buffers.release(success);
            self.buffers.release(invalid);
            self.buffers.release(retryable);
            result
        } else {
            self.process_none_2xx(ctx).await
        }
    }
}

impl BulkResponseProcess {
    async fn process_2xx(
        &self,
        ctx: &mut RequestContext,
        success: &mut BulkBuffer,
        invalid: &mut BulkBuffer,
        retryable: &mut BulkBuffer,
    ) -> Result<()> {
        let request_bytes = ctx.request.body_bytes();
        let outcome = handle_bulk_response(
            &request_bytes,
            &ctx.response.body,
            success,
            invalid,
            retryable,
            &self.config.parse,
            &self.config.retry_rules,
        )?;

        let BulkOutcome {
            contains_error,
            result,
        } = outcome;
        ctx.set(BULK_RESPONSE_STATUS_KEY, result);

        if self.config.stats_only {
            return Ok(());
        }

        if !contains_error {
            ctx.add_tags(&self.config.tags_on_all_success);
            if !self.config.success_queue.is_empty() {
                self.queue
                    .push(&self.config.success_queue, ctx.request.encode())
                    .await?;
            }
            if !self.config.continue_on_success {
                ctx.finish();
            }
            return Ok(());
        }

        self.log_bulk_error(ctx, invalid, retryable);
        ctx.add_tags(&self.config.tags_on_any_error);

        if invalid.message_count() > 0 {
            if !self.config.invalid_queue.is_empty() {
                invalid.safety_end_with_newline();
                let payload = ctx.request.override_body_encode(invalid.message_bytes());
                self.queue.push(&self.config.invalid_queue, payload).await?;
            }
            ctx.add_tags(&self.config.tags_on_partial_invalid);
            if success.message_count() == 0 && retryable.message_count() == 0 {
                ctx.add_tags(&self.config.tags_on_all_invalid);
            }
        }

        if retryable.message_count() > 0 {
            if !self.config.failure_queue.is_empty() {
                retryable.safety_end_with_newline();
                if retryable.message_size() == 0 {
                    tracing::error!(
                        messages = retryable.message_count(),
                        "retryable bucket has messages but no bytes"
                    );
                }
                let payload = ctx.request.override_body_encode(retryable.message_bytes());

                if self.config.partial_failure_retry {
                    self.run_retry_flow(ctx).await;
                }

                self.queue.push(&self.config.failure_queue, payload).await?;
            }
            ctx.add_tags(&self.config.tags_on_partial_failure);
            if success.message_count() == 0 && invalid.message_count() == 0 {
                ctx.add_tags(&self.config.tags_on_all_failure);
            }
        }

        if success.message_count() > 0 {
            if !self.config.success_queue.is_empty() {
                success.safety_end_with_newline();
                let payload = ctx.request.override_body_encode(success.message_bytes());
                self.queue.push(&self.config.success_queue, payload).await?;
            }
            ctx.add_tags(&self.config.tags_on_partial_success);
        }

        if !self.config.continue_on_any_error {
            ctx.finish();
        }
        Ok(())
    }

    async fn process_none_2xx(&self, ctx: &mut RequestContext) -> Result<()> {
        ctx.add_tags(&self.config.tags_on_none_2xx);

        if !self.config.failure_queue.is_empty()
            && self.config.retry_rules.retryable(ctx.response.status)
        {
            let payload = ctx.request.encode();
            self.queue.push(&self.config.failure_queue, payload).await?;
        }

        if !self.config.continue_on_all_error {
            ctx.finish();
        }
        Ok(())
    }

    async fn run_retry_flow(&self, ctx: &mut RequestContext) {
        let Some(retry_flow) = &self.retry_flow else {
            return;
        };

        if self.config.partial_failure_max_retry_times > 0 {
            let invoked = ctx
                .flow_trace()
                .iter()
                .filter(|entry| entry.starts_with("retry_flow:"))
                .count();
            if invoked >= self.config.partial_failure_max_retry_times {
                tracing::debug!(
                    filter = %self.id,
                    invoked,
                    "retry budget exhausted, skipping retry flow"
                );
                return;
            }
        }

        if self.config.partial_failure_retry_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(
                self.config.partial_failure_retry_latency_ms,
            ))
            .await;
        }

        ctx.add_flow_process(format!("retry_flow:{}", retry_flow.id()));
        retry_flow.process(ctx).await;
    }

    fn log_bulk_error(
        &self,
        ctx: &RequestContext,
        invalid: &BulkBuffer,
        retryable: &BulkBuffer,
    ) {
        let url = ctx.request.uri.as_str();
        let limiter = self
            .limiters
            .with_interval("bulk_error", url, "log", 1, ERROR_LOG_INTERVAL);
        if limiter.allow() {
            let body = String::from_utf8_lossy(&ctx.response.body);
            let excerpt = body
                .get(..self.config.message_truncate_size.min(body.len()))
                .unwrap_or(&body);
            tracing::error!(
                url,
                status = ctx.response.status,
                invalid = invalid.message_count(),
                failure = retryable.message_count(),
                response = excerpt,
                "error in bulk requests"
            );
        }
    }
}

/// Factory for [`BulkResponseProcess`]
pub struct BulkResponseFactory;

impl FilterFactory for BulkResponseFactory {
    fn name(&self) -> &'static str {
        "bulk_response_process"
    }

    fn create(&self, config: &FilterConfig, registry: &Registry) -> Result<Arc<dyn Filter>> {
        let filter_config: BulkResponseConfig =
            config.parameters_value().try_into().map_err(|e: toml::de::Error| {
                FlowError::filter_config("bulk_response_process", e.to_string())
            })?;

        let retry_flow = if filter_config.partial_failure_retry
            && !filter_config.retry_flow.is_empty()
        {
            Some(registry.must_get_flow(&filter_config.retry_flow)?)
        } else {
            None
        };

        let services = registry.services();
        Ok(Arc::new(BulkResponseProcess {
            id: config.id.clone(),
            config: filter_config,
            retry_flow,
            queue: Arc::clone(&services.queue),
            limiters: Arc::clone(&services.limiters),
            buffers: Arc::clone(&services.bulk_buffers),
        }))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
