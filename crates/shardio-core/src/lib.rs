//! Core infrastructure for shardio.
//!
//! This crate provides the shard-local pieces that sit under an async I/O
//! runtime:
//! - [`DataSource`] / [`DataSink`]: single-owner wrappers over byte streams
//! - [`SourceKind`] / [`SinkKind`]: explicit implementation tags
//! - [`ShardStats`]: per-shard live-instance counters and registry
//! - [`IoStatsSnapshot`]: mergeable, exportable copies of those counters
//! - An event system used by the other shardio crates

pub mod error;
pub mod events;
pub mod kind;
pub mod snapshot;
pub mod stats;
pub mod stream;

pub use error::KindError;
pub use events::{Event, EventListener, EventListeners};
pub use kind::{CustomKind, SinkKind, SourceKind};
pub use snapshot::IoStatsSnapshot;
pub use stats::{ImplRegistry, IoStats, ShardStats};
pub use stream::{DataSink, DataSource, SinkImpl, SourceImpl};
