//! Core retry behavior through the Tower service.
//!
//! - Success on first attempt (no retries)
//! - Success after N retries
//! - Exhaust the strategy's bound
//! - Stop on a permanent error
//! - Each attempt receives an unmodified clone of the request

use shardio_retry::{DefaultRetryStrategy, RetryLayer};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tower::{Layer, Service, ServiceExt};

fn failing_until(
    succeed_on: u32,
    kind: io::ErrorKind,
) -> (
    Arc<AtomicU32>,
    impl Service<String, Response = String, Error = io::Error, Future: Send + 'static> + Clone + Send + 'static,
) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let service = tower::service_fn(move |req: String| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if attempt < succeed_on {
                Err(io::Error::new(kind, format!("attempt {attempt} failed")))
            } else {
                Ok(format!("{req} on attempt {attempt}"))
            }
        }
    });
    (calls, service)
}

#[tokio::test]
async fn success_on_first_attempt_no_retry() {
    let (calls, service) = failing_until(1, io::ErrorKind::ConnectionReset);
    let mut service = RetryLayer::<io::Error>::builder().build().layer(service);

    let response = service
        .ready()
        .await
        .unwrap()
        .call("get".to_string())
        .await
        .unwrap();

    assert_eq!(response, "get on attempt 1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn success_after_retries() {
    let (calls, service) = failing_until(4, io::ErrorKind::ConnectionRefused);
    let mut service = RetryLayer::<io::Error>::builder().build().layer(service);

    let response = service
        .ready()
        .await
        .unwrap()
        .call("get".to_string())
        .await
        .unwrap();

    assert_eq!(response, "get on attempt 4");
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn default_bound_allows_five_retries() {
    let (calls, service) = failing_until(u32::MAX, io::ErrorKind::TimedOut);
    let mut service = RetryLayer::<io::Error>::builder().build().layer(service);

    let error = service
        .ready()
        .await
        .unwrap()
        .call("get".to_string())
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(error.kind(), io::ErrorKind::TimedOut);
    assert_eq!(error.to_string(), "attempt 6 failed");
}

#[tokio::test]
async fn permanent_error_stops_immediately() {
    let (calls, service) = failing_until(u32::MAX, io::ErrorKind::PermissionDenied);
    let mut service = RetryLayer::<io::Error>::builder()
        .strategy(DefaultRetryStrategy::new(10))
        .build()
        .layer(service);

    let error = service
        .ready()
        .await
        .unwrap()
        .call("get".to_string())
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(error.to_string(), "attempt 1 failed");
}

#[tokio::test]
async fn requests_are_cloned_per_attempt() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    let service = tower::service_fn(move |req: Vec<u8>| {
        let log = Arc::clone(&log);
        async move {
            let mut log = log.lock().unwrap();
            log.push(req);
            if log.len() < 3 {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            } else {
                Ok(log.len())
            }
        }
    });

    let mut service = RetryLayer::<io::Error>::builder().build().layer(service);
    let attempts = service
        .ready()
        .await
        .unwrap()
        .call(b"payload".to_vec())
        .await
        .unwrap();

    assert_eq!(attempts, 3);
    let seen = seen.lock().unwrap();
    assert!(seen.iter().all(|req| req == b"payload"));
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let (calls, service) = failing_until(u32::MAX, io::ErrorKind::ConnectionReset);
    let service = RetryLayer::<io::Error>::builder()
        .strategy(DefaultRetryStrategy::new(2))
        .build()
        .layer(service);

    let mut handles = Vec::new();
    for i in 0..8 {
        let mut service = service.clone();
        handles.push(tokio::spawn(async move {
            service.ready().await.unwrap().call(format!("req-{i}")).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 8 * 3);
}
