//! Pluggable retry decisions for failed network operations.
//!
//! A [`RetryStrategy`] is asked, after every failure, whether the operation
//! should be attempted again. The answer is a future so a strategy may take
//! its time; dropping that future cancels the decision and no retry happens.
//!
//! Two strategies ship with the crate:
//! - [`DefaultRetryStrategy`]: retries [`Retryable`] errors up to a bound
//!   ([`DEFAULT_MAX_RETRIES`] unless configured)
//! - [`NoRetryStrategy`]: never retries
//!
//! Strategies are driven either directly with [`retry_with`] or through the
//! Tower middleware [`RetryLayer`]. Either way, when retrying stops the
//! caller receives the error of the last attempt unchanged.
//!
//! # Examples
//!
//! ```
//! use shardio_retry::RetryLayer;
//! use std::io;
//! use tower::{Layer, Service, ServiceExt};
//!
//! # async fn example() -> Result<(), io::Error> {
//! let layer = RetryLayer::<io::Error>::builder()
//!     .name("upstream")
//!     .on_retry(|attempt| println!("retry #{attempt}"))
//!     .build();
//!
//! let mut service = layer.layer(tower::service_fn(|req: String| async move {
//!     Ok::<_, io::Error>(format!("Response: {req}"))
//! }));
//!
//! let response = service.ready().await?.call("ping".to_string()).await?;
//! assert_eq!(response, "Response: ping");
//! # Ok(())
//! # }
//! ```

mod classify;
mod config;
mod driver;
mod events;
mod layer;
mod strategy;

pub use classify::Retryable;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use driver::retry_with;
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use strategy::{
    Classifier, DefaultRetryStrategy, NoRetryStrategy, RetryStrategy, DEFAULT_MAX_RETRIES,
};

#[cfg(feature = "metrics")]
use metrics::counter;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

/// A Tower [`Service`] that retries failed requests.
///
/// Each attempt receives a clone of the original request. The first
/// attempt uses the instance that was driven to readiness by
/// [`poll_ready`](Service::poll_ready); every retry waits for readiness
/// again before calling.
pub struct Retry<S, E> {
    inner: S,
    config: Arc<RetryConfig<E>>,
}

impl<S, E> Retry<S, E> {
    /// Creates a new `Retry` service wrapping the given service.
    pub fn new(inner: S, config: Arc<RetryConfig<E>>) -> Self {
        Self { inner, config }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, E> Clone for Retry<S, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, E> Service<Req> for Retry<S, E>
where
    S: Service<Req, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    Req: Clone + Send + 'static,
    E: Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = E;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // Keep the instance that was polled ready for the first attempt.
        let clone = self.inner.clone();
        let mut service = std::mem::replace(&mut self.inner, clone);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let mut result = service.call(req.clone()).await;
            let mut attempted_retries = 0u32;

            loop {
                let error = match result {
                    Ok(response) => {
                        config.event_listeners.emit(&RetryEvent::Success {
                            retry_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempted_retries + 1,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "success")
                            .increment(1);

                        return Ok(response);
                    }
                    Err(error) => error,
                };

                if !driver::decide(config.strategy(), &error, attempted_retries).await {
                    let attempts = attempted_retries + 1;
                    let exhausted = attempted_retries >= config.strategy().max_retries();
                    let event = if exhausted {
                        RetryEvent::Exhausted {
                            retry_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts,
                        }
                    } else {
                        RetryEvent::NotRetried {
                            retry_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts,
                        }
                    };
                    config.event_listeners.emit(&event);

                    #[cfg(feature = "metrics")]
                    {
                        let outcome = if exhausted { "exhausted" } else { "not_retried" };
                        counter!("retry_calls_total", "retry" => config.name.clone(), "result" => outcome)
                            .increment(1);
                    }

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        retry = %config.name,
                        attempts,
                        exhausted,
                        "returning last error"
                    );

                    return Err(error);
                }

                attempted_retries = attempted_retries.saturating_add(1);

                config.event_listeners.emit(&RetryEvent::Retry {
                    retry_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt: attempted_retries,
                });

                #[cfg(feature = "metrics")]
                counter!("retry_attempts_total", "retry" => config.name.clone()).increment(1);

                result = match ServiceExt::<Req>::ready(&mut service).await {
                    Ok(ready) => ready.call(req.clone()).await,
                    Err(error) => Err(error),
                };
            }
        })
    }
}
