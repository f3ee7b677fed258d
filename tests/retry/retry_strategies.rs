//! Custom strategy tests: suspending decisions, cancellation and panics.

use futures::future::BoxFuture;
use shardio_retry::{RetryLayer, RetryStrategy, retry_with};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

/// Waits `delay` before every positive answer and records what it was asked.
struct Delayed {
    delay: Duration,
    max_retries: u32,
    asked: Mutex<Vec<u32>>,
}

impl RetryStrategy<io::Error> for Delayed {
    fn should_retry<'a>(
        &'a self,
        _error: &'a io::Error,
        attempted_retries: u32,
    ) -> BoxFuture<'a, bool> {
        self.asked.lock().unwrap().push(attempted_retries);
        Box::pin(async move {
            if attempted_retries >= self.max_retries {
                return false;
            }
            tokio::time::sleep(self.delay).await;
            true
        })
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Sets a flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Never answers.
struct Undecided {
    dropped: Arc<AtomicBool>,
}

impl RetryStrategy<io::Error> for Undecided {
    fn should_retry<'a>(&'a self, _: &'a io::Error, _: u32) -> BoxFuture<'a, bool> {
        let flag = DropFlag(Arc::clone(&self.dropped));
        Box::pin(async move {
            let _flag = flag;
            std::future::pending::<bool>().await
        })
    }

    fn max_retries(&self) -> u32 {
        u32::MAX
    }
}

struct Panicking;

impl RetryStrategy<io::Error> for Panicking {
    fn should_retry<'a>(&'a self, _: &'a io::Error, _: u32) -> BoxFuture<'a, bool> {
        Box::pin(async { panic!("strategy bug") })
    }

    fn max_retries(&self) -> u32 {
        3
    }
}

#[tokio::test(start_paused = true)]
async fn suspending_strategy_is_awaited() {
    let strategy = Delayed {
        delay: Duration::from_secs(2),
        max_retries: 3,
        asked: Mutex::new(Vec::new()),
    };
    let started = tokio::time::Instant::now();
    let mut calls = 0u32;

    let result: Result<(), io::Error> = retry_with(&strategy, || {
        calls += 1;
        async { Err(io::Error::from(io::ErrorKind::ConnectionReset)) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls, 4);
    assert_eq!(*strategy.asked.lock().unwrap(), [0, 1, 2, 3]);
    assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_pending_decision_stops_retrying() {
    let dropped = Arc::new(AtomicBool::new(false));
    let strategy = Undecided {
        dropped: Arc::clone(&dropped),
    };
    let mut calls = 0u32;

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        retry_with(&strategy, || {
            calls += 1;
            async { Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut)) }
        }),
    )
    .await;

    assert!(outcome.is_err(), "decision never completes");
    assert_eq!(calls, 1);
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn panicking_strategy_returns_original_error() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let calls = Arc::new(AtomicU32::new(0));
    let not_retried = Arc::new(AtomicU32::new(0));
    let (c, n) = (Arc::clone(&calls), Arc::clone(&not_retried));

    let layer = RetryLayer::with_strategy(Panicking)
        .on_not_retried(move |attempts| {
            n.store(attempts, Ordering::SeqCst);
        })
        .build();
    let mut service = layer.layer(tower::service_fn(move |_: ()| {
        c.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionReset, "original")) }
    }));

    let error = service.ready().await.unwrap().call(()).await.unwrap_err();

    assert_eq!(error.to_string(), "original");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(not_retried.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn service_waits_for_strategy_between_attempts() {
    let layer = RetryLayer::with_strategy(Delayed {
        delay: Duration::from_millis(500),
        max_retries: 2,
        asked: Mutex::new(Vec::new()),
    })
    .build();

    let mut service = layer.layer(tower::service_fn(|_: ()| async {
        Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused))
    }));

    let started = tokio::time::Instant::now();
    assert!(service.ready().await.unwrap().call(()).await.is_err());
    assert!(started.elapsed() >= Duration::from_secs(1));
}
