//! Response correlation and bucket fill
//!
//! The n-th response item corresponds to the n-th request item. Parsing is
//! null-safe on every field: a response item with no status classifies as
//! retryable, metadata fields may be absent. A count mismatch between
//! request and response classifies the entire request as retryable.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;

use crate::codec::{split_request, RequestItem};
use crate::result::{BulkErrorDetail, BulkResult, BulkTotals};
use crate::{BulkBuffer, BulkError, ItemBucket, Result, RetryRules};

/// One correlated response item
#[derive(Debug, Clone)]
pub struct ResponseItem {
    /// Action key the item was reported under
    pub action: String,
    /// `_index`, when reported
    pub index: Option<String>,
    /// `_id`, when reported
    pub id: Option<String>,
    /// Per-item status; absent statuses classify as retryable
    pub status: Option<u16>,
    /// `error.type`, when the item failed
    pub error_type: Option<String>,
    /// `error.reason`, when the item failed
    pub error_reason: Option<String>,
    /// The raw item document, kept for error-detail excerpts
    pub raw: Value,
}

/// Knobs for result statistics and buffer sizing
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct BulkResponseParseConfig {
    /// Collect bulk statistics at all
    pub output_bulk_stats: bool,

    /// Count items per target index
    pub include_index_stats: bool,

    /// Count items per action verb
    pub include_action_stats: bool,

    /// Record per-item error details
    pub include_error_details: bool,

    /// Bound on recorded error details
    pub max_item_of_error_details_count: usize,

    /// Truncation bound for stored request excerpts
    pub bulk_result_message_max_request_body_length: usize,

    /// Truncation bound for stored response excerpts
    pub bulk_result_message_max_response_body_length: usize,

    /// Retryable items larger than this are dead-lettered instead of
    /// re-buffered; 0 disables the bound
    pub doc_buffer_size: usize,
}

impl Default for BulkResponseParseConfig {
    fn default() -> Self {
        Self {
            output_bulk_stats: true,
            include_index_stats: true,
            include_action_stats: true,
            include_error_details: true,
            max_item_of_error_details_count: 50,
            bulk_result_message_max_request_body_length: 10 * 1024,
            bulk_result_message_max_response_body_length: 10 * 1024,
            doc_buffer_size: 0,
        }
    }
}

/// Outcome of correlating one bulk response against its request
#[derive(Debug)]
pub struct BulkOutcome {
    /// Whether any item failed (or the response could not be correlated)
    pub contains_error: bool,
    /// Statistics for the context and logs
    pub result: BulkResult,
}

/// Parse a bulk response body into its per-item records
///
/// Returns the document-level `errors` flag and the items in response
/// order. Fails with `MalformedResponse` when the body is not a bulk
/// response document.
pub fn parse_response(body: &[u8]) -> Result<(bool, Vec<ResponseItem>)> {
    let doc: Value = serde_json::from_slice(body)
        .map_err(|e| BulkError::malformed_response(e.to_string()))?;

    let object = doc
        .as_object()
        .ok_or_else(|| BulkError::malformed_response("response is not an object"))?;

    let errors = object.get("errors").and_then(Value::as_bool).unwrap_or(false);

    let raw_items = object
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| BulkError::malformed_response("response has no items array"))?;

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        items.push(parse_response_item(raw));
    }
    Ok((errors, items))
}

fn parse_response_item(raw: &Value) -> ResponseItem {
    let (action, body) = raw
        .as_object()
        .and_then(|o| o.iter().next())
        .map(|(k, v)| (k.clone(), v))
        .unwrap_or_else(|| (String::new(), &Value::Null));

    let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
    let error = body.get("error");

    ResponseItem {
        action,
        index: field("_index"),
        id: field("_id"),
        status: body
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok()),
        error_type: error
            .and_then(|e| e.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string),
        error_reason: error
            .and_then(|e| e.get("reason"))
            .and_then(Value::as_str)
            .map(str::to_string),
        raw: raw.clone(),
    }
}

/// Correlate a bulk response with its request and fill the three buckets
///
/// Every request item lands in exactly one of `success` / `retryable` /
/// `invalid`, encoded from its exact original line bytes in request order.
pub fn handle_bulk_response(
    request_body: &Bytes,
    response_body: &[u8],
    success: &mut BulkBuffer,
    invalid: &mut BulkBuffer,
    retryable: &mut BulkBuffer,
    parse_config: &BulkResponseParseConfig,
    retry_rules: &RetryRules,
) -> Result<BulkOutcome> {
    let request_items = split_request(request_body)?;
    let (_errors_flag, response_items) = parse_response(response_body)?;

    let mut result = BulkResult::default();
    result.totals.items = request_items.len();

    if request_items.len() != response_items.len() {
        tracing::warn!(
            request_items = request_items.len(),
            response_items = response_items.len(),
            "bulk response length mismatch, treating the whole request as retryable"
        );
        for item in &request_items {
            retryable.append(&item.action_line, item.source_line.as_deref());
        }
        result.totals.retryable = request_items.len();
        result.response_length_mismatch = true;
        collect_stats(&mut result, &request_items, parse_config);
        return Ok(BulkOutcome {
            contains_error: true,
            result,
        });
    }

    for (request, response) in request_items.iter().zip(&response_items) {
        let mut bucket = retry_rules.classify(response.status);

        // An item too large for the replay buffer cannot be re-enqueued.
        if bucket == ItemBucket::Retryable
            && parse_config.doc_buffer_size > 0
            && request.encoded_len() > parse_config.doc_buffer_size
        {
            tracing::warn!(
                ordinal = request.ordinal,
                size = request.encoded_len(),
                limit = parse_config.doc_buffer_size,
                "bulk item exceeds doc buffer size, dead-lettering"
            );
            bucket = ItemBucket::Invalid;
        }

        match bucket {
            ItemBucket::Success => {
                result.totals.success += 1;
                success.append(&request.action_line, request.source_line.as_deref());
            }
            ItemBucket::Retryable => {
                result.totals.retryable += 1;
                retryable.append(&request.action_line, request.source_line.as_deref());
            }
            ItemBucket::Invalid => {
                result.totals.invalid += 1;
                invalid.append(&request.action_line, request.source_line.as_deref());
            }
        }

        if bucket != ItemBucket::Success
            && parse_config.output_bulk_stats
            && parse_config.include_error_details
            && result.error_details.len() < parse_config.max_item_of_error_details_count
        {
            result.error_details.push(error_detail(request, response, parse_config));
        }
    }

    collect_stats(&mut result, &request_items, parse_config);
    let contains_error = result.contains_error();
    Ok(BulkOutcome {
        contains_error,
        result,
    })
}

fn collect_stats(
    result: &mut BulkResult,
    request_items: &[RequestItem],
    parse_config: &BulkResponseParseConfig,
) {
    if !parse_config.output_bulk_stats {
        return;
    }
    if parse_config.include_index_stats {
        for item in request_items {
            let index = item.index.as_deref().unwrap_or("_unknown");
            *result.index_stats.entry(index.to_string()).or_default() += 1;
        }
    }
    if parse_config.include_action_stats {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for item in request_items {
            *counts.entry(item.action.as_str().to_string()).or_default() += 1;
        }
        result.action_stats = counts;
    }
}

fn error_detail(
    request: &RequestItem,
    response: &ResponseItem,
    parse_config: &BulkResponseParseConfig,
) -> BulkErrorDetail {
    let mut request_excerpt =
        String::from_utf8_lossy(&request.action_line).into_owned();
    if let Some(source) = &request.source_line {
        request_excerpt.push('\n');
        request_excerpt.push_str(&String::from_utf8_lossy(source));
    }

    BulkErrorDetail {
        index: request.index.clone(),
        action: request.action.as_str().to_string(),
        id: request.id.clone().or_else(|| response.id.clone()),
        error_type: response.error_type.clone(),
        reason: response.error_reason.clone(),
        status: response.status,
        request_excerpt: truncate(
            request_excerpt,
            parse_config.bulk_result_message_max_request_body_length,
        ),
        response_excerpt: truncate(
            response.raw.to_string(),
            parse_config.bulk_result_message_max_response_body_length,
        ),
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;
