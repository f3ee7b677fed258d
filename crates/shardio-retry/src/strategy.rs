use crate::classify::Retryable;
use futures::future::{self, BoxFuture};
use std::fmt;
use std::sync::Arc;

/// Number of retries [`DefaultRetryStrategy::default`] allows.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Determines whether an error is worth retrying.
pub type Classifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Decides whether a failed operation should be attempted again.
///
/// `attempted_retries` counts the retries already made for the current
/// request, so the first failure is asked about with `0`. The answer is
/// asynchronous so a strategy may wait out a delay or inspect the error
/// further before replying. Dropping the returned future abandons the
/// decision without retrying.
///
/// When the answer is `false` the caller propagates the original error
/// unchanged.
pub trait RetryStrategy<E>: Send + Sync {
    /// Returns `true` if the operation that failed with `error` should be
    /// attempted again.
    fn should_retry<'a>(&'a self, error: &'a E, attempted_retries: u32) -> BoxFuture<'a, bool>;

    /// Upper bound on retries this strategy will ever grant.
    fn max_retries(&self) -> u32;
}

impl<E, S> RetryStrategy<E> for &S
where
    S: RetryStrategy<E> + ?Sized,
{
    fn should_retry<'a>(&'a self, error: &'a E, attempted_retries: u32) -> BoxFuture<'a, bool> {
        (**self).should_retry(error, attempted_retries)
    }

    fn max_retries(&self) -> u32 {
        (**self).max_retries()
    }
}

impl<E, S> RetryStrategy<E> for Arc<S>
where
    S: RetryStrategy<E> + ?Sized,
{
    fn should_retry<'a>(&'a self, error: &'a E, attempted_retries: u32) -> BoxFuture<'a, bool> {
        (**self).should_retry(error, attempted_retries)
    }

    fn max_retries(&self) -> u32 {
        (**self).max_retries()
    }
}

impl<E, S> RetryStrategy<E> for Box<S>
where
    S: RetryStrategy<E> + ?Sized,
{
    fn should_retry<'a>(&'a self, error: &'a E, attempted_retries: u32) -> BoxFuture<'a, bool> {
        (**self).should_retry(error, attempted_retries)
    }

    fn max_retries(&self) -> u32 {
        (**self).max_retries()
    }
}

/// Bounded retry of retryable errors.
///
/// Retries while `attempted_retries < max_retries` and the classifier
/// accepts the error. With `max_retries == 0` it never retries, exactly
/// like [`NoRetryStrategy`].
///
/// # Examples
///
/// ```
/// use shardio_retry::{DefaultRetryStrategy, RetryStrategy};
/// use std::io;
///
/// # futures::executor::block_on(async {
/// let strategy = DefaultRetryStrategy::<io::Error>::new(3);
/// let reset = io::Error::from(io::ErrorKind::ConnectionReset);
///
/// assert!(strategy.should_retry(&reset, 2).await);
/// assert!(!strategy.should_retry(&reset, 3).await);
/// # });
/// ```
pub struct DefaultRetryStrategy<E> {
    max_retries: u32,
    classifier: Classifier<E>,
}

impl<E: Retryable> DefaultRetryStrategy<E> {
    /// Creates a strategy using the error's [`Retryable`] classification.
    pub fn new(max_retries: u32) -> Self {
        Self::with_classifier(max_retries, |error: &E| error.is_retryable())
    }
}

impl<E> DefaultRetryStrategy<E> {
    /// Creates a strategy with a custom classifier.
    pub fn with_classifier<F>(max_retries: u32, classifier: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            max_retries,
            classifier: Arc::new(classifier),
        }
    }

    /// The configured retry bound.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn decide(&self, error: &E, attempted_retries: u32) -> bool {
        if attempted_retries >= self.max_retries {
            #[cfg(feature = "tracing")]
            {
                if self.max_retries > 0 {
                    tracing::warn!(
                        attempted_retries,
                        max_retries = self.max_retries,
                        "retries exhausted"
                    );
                }
            }
            return false;
        }

        let retryable = (self.classifier)(error);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempted_retries,
            max_retries = self.max_retries,
            retryable,
            "retry decision"
        );

        retryable
    }
}

impl<E: Retryable> Default for DefaultRetryStrategy<E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl<E> Clone for DefaultRetryStrategy<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<E> fmt::Debug for DefaultRetryStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRetryStrategy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<E> RetryStrategy<E> for DefaultRetryStrategy<E> {
    fn should_retry<'a>(&'a self, error: &'a E, attempted_retries: u32) -> BoxFuture<'a, bool> {
        Box::pin(future::ready(self.decide(error, attempted_retries)))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Never retries: the original error is returned immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetryStrategy;

impl<E> RetryStrategy<E> for NoRetryStrategy {
    fn should_retry<'a>(&'a self, _error: &'a E, _attempted_retries: u32) -> BoxFuture<'a, bool> {
        Box::pin(future::ready(false))
    }

    fn max_retries(&self) -> u32 {
        0
    }
}
