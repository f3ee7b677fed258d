use shardio_core::Event;
use std::time::Instant;

/// Events emitted by the [`Retry`](crate::Retry) service.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// The strategy granted a retry; attempt number `attempt` (1 = first
    /// retry) is about to start.
    Retry {
        retry_name: String,
        timestamp: Instant,
        attempt: u32,
    },
    /// The request succeeded after `attempts` calls to the inner service.
    Success {
        retry_name: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The strategy's retry bound was reached; the last error is returned.
    Exhausted {
        retry_name: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The strategy declined to retry before its bound was reached.
    NotRetried {
        retry_name: String,
        timestamp: Instant,
        attempts: u32,
    },
}

impl Event for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::NotRetried { .. } => "not_retried",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::NotRetried { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            RetryEvent::Retry { retry_name, .. }
            | RetryEvent::Success { retry_name, .. }
            | RetryEvent::Exhausted { retry_name, .. }
            | RetryEvent::NotRetried { retry_name, .. } => retry_name,
        }
    }
}
