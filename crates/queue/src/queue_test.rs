//! Tests for the in-memory queue backend

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::*;

#[tokio::test]
async fn test_push_pop_fifo() {
    let queue = MemoryQueue::new();

    queue.push("q", Bytes::from_static(b"one")).await.unwrap();
    queue.push("q", Bytes::from_static(b"two")).await.unwrap();

    let first = queue
        .pop_timeout("q", Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(first, Popped::Payload(Bytes::from_static(b"one")));

    let second = queue
        .pop_timeout("q", Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(second, Popped::Payload(Bytes::from_static(b"two")));
}

#[tokio::test]
async fn test_pop_empty_times_out() {
    let queue = MemoryQueue::new();

    let popped = queue
        .pop_timeout("empty", Duration::from_millis(20))
        .await
        .unwrap();
    assert!(popped.timed_out());
    assert!(popped.into_payload().is_none());
}

#[tokio::test]
async fn test_pop_wakes_on_push() {
    let queue = Arc::new(MemoryQueue::new());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.pop_timeout("q", Duration::from_secs(5)).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.push("q", Bytes::from_static(b"late")).await.unwrap();

    let popped = consumer.await.unwrap().unwrap();
    assert_eq!(popped, Popped::Payload(Bytes::from_static(b"late")));
}

#[tokio::test]
async fn test_depth() {
    let queue = MemoryQueue::new();

    assert_eq!(queue.depth("q").await.unwrap(), 0);
    queue.push("q", Bytes::from_static(b"a")).await.unwrap();
    queue.push("q", Bytes::from_static(b"b")).await.unwrap();
    assert_eq!(queue.depth("q").await.unwrap(), 2);

    queue
        .pop_timeout("q", Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(queue.depth("q").await.unwrap(), 1);
}

#[tokio::test]
async fn test_queues_are_independent() {
    let queue = MemoryQueue::new();

    queue.push("a", Bytes::from_static(b"a1")).await.unwrap();
    queue.ensure_queue("b").await.unwrap();

    assert_eq!(queue.depth("a").await.unwrap(), 1);
    assert_eq!(queue.depth("b").await.unwrap(), 0);

    let popped = queue
        .pop_timeout("b", Duration::from_millis(10))
        .await
        .unwrap();
    assert!(popped.timed_out());
}

#[tokio::test]
async fn test_multi_consumer_each_item_once() {
    let queue = Arc::new(MemoryQueue::new());
    for i in 0..20u8 {
        queue.push("q", Bytes::from(vec![i])).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                match queue
                    .pop_timeout("q", Duration::from_millis(50))
                    .await
                    .unwrap()
                {
                    Popped::Payload(b) => seen.push(b[0]),
                    Popped::TimedOut => break,
                }
            }
            seen
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    all.sort_unstable();
    assert_eq!(all, (0..20u8).collect::<Vec<_>>());
}
