use crate::classify::Retryable;
use crate::strategy::RetryStrategy;
use crate::{Retry, RetryConfig, RetryConfigBuilder};
use std::sync::Arc;
use tower::Layer;

#[cfg(feature = "metrics")]
use metrics::describe_counter;
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

fn describe_metrics() {
    #[cfg(feature = "metrics")]
    {
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "retry_calls_total",
                "Total number of requests through the retry service, by result"
            );
            describe_counter!(
                "retry_attempts_total",
                "Total number of retries granted by the retry strategy"
            );
        });
    }
}

/// A Tower [`Layer`] that retries failed requests as directed by a
/// [`RetryStrategy`].
///
/// # Examples
///
/// ```
/// use shardio_retry::{DefaultRetryStrategy, RetryLayer};
/// use tower::ServiceBuilder;
/// use std::io;
///
/// # async fn example() {
/// let retry_layer = RetryLayer::<io::Error>::builder()
///     .name("segment-fetch")
///     .strategy(DefaultRetryStrategy::new(3))
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(retry_layer)
///     .service(tower::service_fn(|req: String| async move { Ok::<_, io::Error>(req) }));
/// # }
/// ```
pub struct RetryLayer<E> {
    config: Arc<RetryConfig<E>>,
}

impl<E> RetryLayer<E> {
    /// Creates a new `RetryLayer` with the given configuration.
    pub fn new(config: RetryConfig<E>) -> Self {
        describe_metrics();
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a builder for an error type without a [`Retryable`]
    /// classification, starting from an explicit strategy.
    ///
    /// ```
    /// use shardio_retry::{DefaultRetryStrategy, RetryLayer};
    ///
    /// #[derive(Debug)]
    /// struct Status(u16);
    ///
    /// let layer = RetryLayer::with_strategy(DefaultRetryStrategy::with_classifier(
    ///     2,
    ///     |status: &Status| status.0 >= 500,
    /// ))
    /// .build();
    /// ```
    pub fn with_strategy<S>(strategy: S) -> RetryConfigBuilder<E>
    where
        S: RetryStrategy<E> + 'static,
    {
        describe_metrics();
        RetryConfigBuilder::with_strategy(strategy)
    }
}

impl<E> RetryLayer<E>
where
    E: Retryable + 'static,
{
    /// Creates a new builder using the default strategy.
    pub fn builder() -> RetryConfigBuilder<E> {
        describe_metrics();
        RetryConfigBuilder::new()
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, E> Layer<S> for RetryLayer<E> {
    type Service = Retry<S, E>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
