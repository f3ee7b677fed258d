//! Retryability classification used by [`DefaultRetryStrategy`](crate::DefaultRetryStrategy).
//!
//! The default classification is deliberately narrow: only failures that
//! say nothing about the request itself (the connection went away, the
//! peer was briefly unreachable, the operation timed out) are retryable.
//! Everything else is treated as permanent.

use std::error::Error;
use std::io;

/// Errors that know whether retrying the failed operation can help.
pub trait Retryable {
    /// Returns `true` if the same operation may succeed when attempted again.
    fn is_retryable(&self) -> bool;
}

/// Transient I/O error kinds.
///
/// | kind | why |
/// |------|-----|
/// | `ConnectionReset`, `ConnectionAborted`, `BrokenPipe`, `NotConnected` | connection dropped mid-flight |
/// | `ConnectionRefused` | peer not accepting yet (restart, failover) |
/// | `TimedOut`, `WouldBlock`, `Interrupted` | operation did not complete |
/// | `UnexpectedEof` | stream closed before a full response |
impl Retryable for io::ErrorKind {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::TimedOut
                | io::ErrorKind::WouldBlock
                | io::ErrorKind::Interrupted
                | io::ErrorKind::UnexpectedEof
        )
    }
}

impl Retryable for io::Error {
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl Retryable for tokio::time::error::Elapsed {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Classifies a type-erased error by the first recognised error in its
/// source chain. Unrecognised chains are permanent.
impl Retryable for Box<dyn Error + Send + Sync> {
    fn is_retryable(&self) -> bool {
        classify_chain(&**self)
    }
}

fn classify_chain(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return io_err.is_retryable();
        }
        if err.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        current = err.source();
    }
    false
}
