use crate::classify::Retryable;
use crate::events::RetryEvent;
use crate::strategy::{DefaultRetryStrategy, RetryStrategy};
use shardio_core::EventListeners;
use std::sync::Arc;

/// Configuration for the [`Retry`](crate::Retry) service.
pub struct RetryConfig<E> {
    pub(crate) strategy: Arc<dyn RetryStrategy<E>>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<E> RetryConfig<E> {
    /// Name used in events, logs and metric labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The strategy deciding each retry.
    pub fn strategy(&self) -> &dyn RetryStrategy<E> {
        &*self.strategy
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<E> {
    strategy: Arc<dyn RetryStrategy<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<E> RetryConfigBuilder<E>
where
    E: Retryable + 'static,
{
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - strategy: [`DefaultRetryStrategy`] with
    ///   [`DEFAULT_MAX_RETRIES`](crate::DEFAULT_MAX_RETRIES) retries
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self::with_strategy(DefaultRetryStrategy::<E>::default())
    }
}

impl<E> Default for RetryConfigBuilder<E>
where
    E: Retryable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Creates a builder around an explicit strategy. Works for error types
    /// without a [`Retryable`] classification.
    pub fn with_strategy<S>(strategy: S) -> Self
    where
        S: RetryStrategy<E> + 'static,
    {
        Self {
            strategy: Arc::new(strategy),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Replaces the strategy.
    pub fn strategy<S>(mut self, strategy: S) -> Self
    where
        S: RetryStrategy<E> + 'static,
    {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Sets the name for this retry instance (used in events and metrics).
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a retry has been granted, before
    /// the next attempt starts.
    ///
    /// # Callback Signature
    /// `Fn(u32)`: the retry number, starting at 1 for the first retry.
    ///
    /// # Example
    /// ```rust
    /// use shardio_retry::RetryLayer;
    ///
    /// let layer = RetryLayer::<std::io::Error>::builder()
    ///     .on_retry(|attempt| {
    ///         if attempt >= 3 {
    ///             eprintln!("upstream flapping, retry #{attempt}");
    ///         }
    ///     })
    ///     .build();
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &RetryEvent| {
            if let RetryEvent::Retry { attempt, .. } = event {
                f(*attempt);
            }
        });
        self
    }

    /// Registers a callback invoked when a request succeeds.
    ///
    /// # Callback Signature
    /// `Fn(u32)`: total calls made to the inner service, so `1` means
    /// success without a retry.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &RetryEvent| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        });
        self
    }

    /// Registers a callback invoked when the strategy's retry bound is
    /// reached and the last error is handed back to the caller.
    ///
    /// # Callback Signature
    /// `Fn(u32)`: total calls made to the inner service.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &RetryEvent| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        });
        self
    }

    /// Registers a callback invoked when the strategy declines to retry
    /// before its bound is reached, typically for a permanent error.
    ///
    /// # Callback Signature
    /// `Fn(u32)`: total calls made to the inner service.
    ///
    /// # Example
    /// ```rust
    /// use shardio_retry::RetryLayer;
    ///
    /// let layer = RetryLayer::<std::io::Error>::builder()
    ///     .name("object-store")
    ///     .on_not_retried(|attempts| {
    ///         eprintln!("permanent failure after {attempts} call(s)");
    ///     })
    ///     .build();
    /// ```
    pub fn on_not_retried<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event: &RetryEvent| {
            if let RetryEvent::NotRetried { attempts, .. } = event {
                f(*attempts);
            }
        });
        self
    }

    /// Builds the configuration without wrapping it in a layer.
    pub fn build_config(self) -> RetryConfig<E> {
        RetryConfig {
            strategy: self.strategy,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the retry layer.
    pub fn build(self) -> crate::RetryLayer<E> {
        crate::RetryLayer::new(self.build_config())
    }
}
