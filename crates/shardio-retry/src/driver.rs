//! Retry loop shared by [`retry_with`] and the [`Retry`](crate::Retry) service.

use crate::strategy::RetryStrategy;
use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// Runs `operation` until it succeeds or `strategy` declines to retry.
///
/// The first failure is offered to the strategy with `attempted_retries == 0`,
/// the next with `1`, and so on. When the strategy answers `false` the error
/// from the last attempt is returned unchanged. A strategy that panics is
/// treated as having answered `false`.
///
/// Dropping the returned future at any point, including while the strategy
/// is still deciding, stops the loop without starting another attempt.
///
/// # Examples
///
/// ```
/// use shardio_retry::{retry_with, DefaultRetryStrategy};
/// use std::io;
///
/// # futures::executor::block_on(async {
/// let strategy = DefaultRetryStrategy::<io::Error>::new(2);
/// let mut calls = 0;
///
/// let result: Result<(), io::Error> = retry_with(&strategy, || {
///     calls += 1;
///     async { Err(io::Error::from(io::ErrorKind::ConnectionReset)) }
/// })
/// .await;
///
/// assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionReset);
/// assert_eq!(calls, 3);
/// # });
/// ```
pub async fn retry_with<S, E, T, F, Fut>(strategy: &S, mut operation: F) -> Result<T, E>
where
    S: RetryStrategy<E> + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempted_retries = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !decide(strategy, &error, attempted_retries).await {
                    return Err(error);
                }
                attempted_retries = attempted_retries.saturating_add(1);
            }
        }
    }
}

/// Asks `strategy` about `error`, mapping a panic on either side of the
/// returned future to `false`.
pub(crate) async fn decide<S, E>(strategy: &S, error: &E, attempted_retries: u32) -> bool
where
    S: RetryStrategy<E> + ?Sized,
{
    let pending = match panic::catch_unwind(AssertUnwindSafe(|| {
        strategy.should_retry(error, attempted_retries)
    })) {
        Ok(pending) => pending,
        Err(_) => {
            strategy_panicked(attempted_retries);
            return false;
        }
    };

    match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(retry) => retry,
        Err(_) => {
            strategy_panicked(attempted_retries);
            false
        }
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn strategy_panicked(attempted_retries: u32) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        attempted_retries,
        "retry strategy panicked; returning the original error"
    );
}
