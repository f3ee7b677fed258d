//! Shard-local I/O stream accounting and pluggable retry strategies.
//!
//! `shardio` bundles the pieces an async I/O runtime needs around its byte
//! streams:
//!
//! - **Stream wrappers** ([`core`]): [`DataSource`] and [`DataSink`] own one
//!   implementation each and keep a per-shard count of live instances,
//!   broken down by implementation kind.
//! - **Retry** (`retry` feature, on by default): a [`RetryStrategy`]
//!   decides, asynchronously, whether a failed network operation runs again.
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! shardio = { version = "0.1", features = ["metrics", "tracing"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use shardio::{ShardStats, SourceImpl, SourceKind};
//! use std::pin::Pin;
//! use std::task::{Context, Poll};
//! use tokio::io::{AsyncRead, ReadBuf};
//!
//! struct Empty;
//!
//! impl AsyncRead for Empty {
//!     fn poll_read(
//!         self: Pin<&mut Self>,
//!         _: &mut Context<'_>,
//!         _: &mut ReadBuf<'_>,
//!     ) -> Poll<std::io::Result<()>> {
//!         Poll::Ready(Ok(()))
//!     }
//! }
//!
//! impl SourceImpl for Empty {
//!     fn kind(&self) -> SourceKind {
//!         SourceKind::PosixDataSource
//!     }
//! }
//!
//! let stats = ShardStats::new(0);
//! let source = stats.source(Empty);
//! assert_eq!(stats.io().source_count(&SourceKind::PosixDataSource), Some(1));
//! drop(source);
//! assert_eq!(stats.io().data_sources(), 0);
//! ```

// Re-export core (always available)
pub use shardio_core as core;
pub use shardio_core::{
    CustomKind, DataSink, DataSource, IoStatsSnapshot, KindError, ShardStats, SinkImpl, SinkKind,
    SourceImpl, SourceKind,
};

#[cfg(feature = "retry")]
pub use shardio_retry as retry;
#[cfg(feature = "retry")]
pub use shardio_retry::{
    retry_with, DefaultRetryStrategy, NoRetryStrategy, RetryLayer, RetryStrategy, Retryable,
};
