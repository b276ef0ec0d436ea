//! Chunked delivery coordination.
//!
//! Splits outbound text with a [`Chunker`] and hands each chunk to a
//! caller-supplied sender, in order, stopping at the first failure. The
//! resulting [`DeliveryResult`] always reports exactly the chunks that were
//! delivered, so the runtime can decide whether to resend the remainder.
//! There is no internal retry.

use crate::chunking::{Chunker, default_chunker};
use crate::protocol::{DeliveryError, DeliveryResult};
use std::future::Future;
use tracing::{debug, warn};

/// Message used when the text yields no chunks.
const EMPTY_MESSAGE: &str = "empty message";

/// Sends `text` in chunks of at most `limit` bytes using the default
/// fence-aware chunker.
///
/// `send_one` receives each chunk and returns the platform message id.
///
/// # Examples
///
/// ```
/// use nexus_adapter::delivery::send_chunked;
///
/// let mut sent = Vec::new();
/// let result = send_chunked("hello world", 2000, |chunk| {
///     sent.push(chunk.to_string());
///     Ok(format!("msg-{}", sent.len()))
/// });
/// assert!(result.success);
/// assert_eq!(result.message_ids, vec!["msg-1"]);
/// ```
pub fn send_chunked<F>(text: &str, limit: usize, send_one: F) -> DeliveryResult
where
    F: FnMut(&str) -> anyhow::Result<String>,
{
    send_chunked_with(&default_chunker(), text, limit, send_one)
}

/// Like [`send_chunked`], with an explicit chunking strategy.
pub fn send_chunked_with<C, F>(chunker: &C, text: &str, limit: usize, mut send_one: F) -> DeliveryResult
where
    C: Chunker + ?Sized,
    F: FnMut(&str) -> anyhow::Result<String>,
{
    let total = text.len();
    let chunks = match plan(chunker, text, limit) {
        Ok(chunks) => chunks,
        Err(rejected) => return rejected,
    };

    let mut ids = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        match send_one(chunk) {
            Ok(id) => ids.push(id),
            Err(err) => return abort(ids, index, chunks.len(), &err, total),
        }
    }
    complete(ids, total)
}

/// Async variant of [`send_chunked`] for senders that perform I/O.
///
/// Each chunk is passed by value so the returned future may own it.
pub async fn send_chunked_async<F, Fut>(text: &str, limit: usize, mut send_one: F) -> DeliveryResult
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
{
    let total = text.len();
    let chunks = match plan(&default_chunker(), text, limit) {
        Ok(chunks) => chunks,
        Err(rejected) => return rejected,
    };
    let count = chunks.len();

    let mut ids = Vec::with_capacity(count);
    for (index, chunk) in chunks.into_iter().enumerate() {
        match send_one(chunk).await {
            Ok(id) => ids.push(id),
            Err(err) => return abort(ids, index, count, &err, total),
        }
    }
    complete(ids, total)
}

/// Chunks the text, or produces the rejection result for empty input.
fn plan<C>(chunker: &C, text: &str, limit: usize) -> Result<Vec<String>, DeliveryResult>
where
    C: Chunker + ?Sized,
{
    let chunks = chunker.chunk(text, limit);
    if chunks.is_empty() {
        warn!("refusing to deliver empty message");
        return Err(
            DeliveryResult::failed(Vec::new(), DeliveryError::content_rejected(EMPTY_MESSAGE))
                .with_total_chars(text.len()),
        );
    }
    debug!(
        chunks = chunks.len(),
        limit,
        strategy = chunker.name(),
        "message chunked"
    );
    Ok(chunks)
}

fn abort(
    ids: Vec<String>,
    index: usize,
    count: usize,
    err: &anyhow::Error,
    total: usize,
) -> DeliveryResult {
    warn!(chunk = index + 1, chunks = count, error = %err, "chunk delivery failed");
    DeliveryResult::failed(ids, DeliveryError::network(format!("{err:#}"))).with_total_chars(total)
}

fn complete(ids: Vec<String>, total: usize) -> DeliveryResult {
    debug!(chunks = ids.len(), "delivery complete");
    DeliveryResult::delivered(ids).with_total_chars(total)
}
