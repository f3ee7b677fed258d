//! Shard-local live-instance statistics.
//!
//! Each shard owns one [`ShardStats`] handle, created when the shard starts
//! and passed explicitly to every [`DataSource`] and [`DataSink`] built on
//! that shard. The handle bundles two tiers of accounting:
//!
//! - [`IoStats`]: generic source/sink counts plus one dedicated counter per
//!   allow-listed [`SourceKind`] / [`SinkKind`].
//! - [`ImplRegistry`]: a map from kind identifier to live count covering
//!   every kind ever seen, including custom ones.
//!
//! The handle is `!Send`: counters are plain [`Cell`]s mutated only by the
//! shard that owns them. Cross-shard aggregation goes through
//! [`IoStatsSnapshot::merge`].

use crate::kind::{SinkKind, SourceKind};
use crate::snapshot::IoStatsSnapshot;
use crate::stream::{DataSink, DataSource, SinkImpl, SourceImpl};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

fn increment(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

fn decrement(counter: &Cell<u64>) {
    let current = counter.get();
    debug_assert!(current > 0, "counter decremented below zero");
    counter.set(current.saturating_sub(1));
}

/// Generic and per-kind live counters for one shard.
#[derive(Debug, Default)]
pub struct IoStats {
    data_sources: Cell<u64>,
    data_sinks: Cell<u64>,
    sources: [Cell<u64>; SourceKind::TRACKED_COUNT],
    sinks: [Cell<u64>; SinkKind::TRACKED_COUNT],
}

impl IoStats {
    pub(crate) fn increment_source(&self, kind: &SourceKind) {
        increment(&self.data_sources);
        if let Some(index) = kind.counter_index() {
            increment(&self.sources[index]);
        }
    }

    pub(crate) fn decrement_source(&self, kind: &SourceKind) {
        decrement(&self.data_sources);
        if let Some(index) = kind.counter_index() {
            decrement(&self.sources[index]);
        }
    }

    pub(crate) fn increment_sink(&self, kind: &SinkKind) {
        increment(&self.data_sinks);
        if let Some(index) = kind.counter_index() {
            increment(&self.sinks[index]);
        }
    }

    pub(crate) fn decrement_sink(&self, kind: &SinkKind) {
        decrement(&self.data_sinks);
        if let Some(index) = kind.counter_index() {
            decrement(&self.sinks[index]);
        }
    }

    /// Number of live sources of any kind.
    pub fn data_sources(&self) -> u64 {
        self.data_sources.get()
    }

    /// Number of live sinks of any kind.
    pub fn data_sinks(&self) -> u64 {
        self.data_sinks.get()
    }

    /// Live count of an allow-listed source kind, `None` for custom kinds.
    pub fn source_count(&self, kind: &SourceKind) -> Option<u64> {
        kind.counter_index().map(|index| self.sources[index].get())
    }

    /// Live count of an allow-listed sink kind, `None` for custom kinds.
    pub fn sink_count(&self, kind: &SinkKind) -> Option<u64> {
        kind.counter_index().map(|index| self.sinks[index].get())
    }

    pub(crate) fn tracked_sources(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        SourceKind::TRACKED_NAMES
            .iter()
            .zip(self.sources.iter())
            .map(|(name, count)| (*name, count.get()))
    }

    pub(crate) fn tracked_sinks(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        SinkKind::TRACKED_NAMES
            .iter()
            .zip(self.sinks.iter())
            .map(|(name, count)| (*name, count.get()))
    }
}

/// Live instance counts keyed by implementation identifier.
///
/// Entries are never removed: a kind that drops back to zero stays visible
/// so ad-hoc inspection can tell "never seen" from "none alive".
#[derive(Debug, Default)]
pub struct ImplRegistry {
    sources: RefCell<HashMap<String, u64>>,
    sinks: RefCell<HashMap<String, u64>>,
}

impl ImplRegistry {
    fn bump(map: &RefCell<HashMap<String, u64>>, name: &str) {
        let mut map = map.borrow_mut();
        match map.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                map.insert(name.to_owned(), 1);
            }
        }
    }

    fn drop_one(map: &RefCell<HashMap<String, u64>>, name: &str) {
        let mut map = map.borrow_mut();
        let count = map.get_mut(name);
        debug_assert!(
            count.as_ref().is_some_and(|c| **c > 0),
            "registry entry '{name}' decremented below zero"
        );
        if let Some(count) = count {
            *count = count.saturating_sub(1);
        }
    }

    pub(crate) fn increment_source(&self, kind: &SourceKind) {
        Self::bump(&self.sources, kind.as_str());
    }

    pub(crate) fn decrement_source(&self, kind: &SourceKind) {
        Self::drop_one(&self.sources, kind.as_str());
    }

    pub(crate) fn increment_sink(&self, kind: &SinkKind) {
        Self::bump(&self.sinks, kind.as_str());
    }

    pub(crate) fn decrement_sink(&self, kind: &SinkKind) {
        Self::drop_one(&self.sinks, kind.as_str());
    }

    /// Live count of sources registered under `name`, `None` if never seen.
    pub fn source(&self, name: &str) -> Option<u64> {
        self.sources.borrow().get(name).copied()
    }

    /// Live count of sinks registered under `name`, `None` if never seen.
    pub fn sink(&self, name: &str) -> Option<u64> {
        self.sinks.borrow().get(name).copied()
    }

    pub(crate) fn source_entries(&self) -> Vec<(String, u64)> {
        self.sources
            .borrow()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }

    pub(crate) fn sink_entries(&self) -> Vec<(String, u64)> {
        self.sinks
            .borrow()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }
}

struct Shared {
    shard: usize,
    io: IoStats,
    registry: ImplRegistry,
}

/// Handle to the statistics of one shard.
///
/// Cloning the handle is cheap and every clone refers to the same counters.
/// Wrappers keep a clone so they can deregister on drop.
///
/// # Examples
///
/// ```
/// use shardio_core::{ShardStats, SinkKind, SinkImpl};
/// use std::io;
/// use std::pin::Pin;
/// use std::task::{Context, Poll};
/// use tokio::io::AsyncWrite;
///
/// struct Discard;
///
/// impl AsyncWrite for Discard {
///     fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
///         Poll::Ready(Ok(buf.len()))
///     }
///     fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
///         Poll::Ready(Ok(()))
///     }
///     fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
///         Poll::Ready(Ok(()))
///     }
/// }
///
/// impl SinkImpl for Discard {
///     fn kind(&self) -> SinkKind {
///         SinkKind::SizingDataSink
///     }
/// }
///
/// let stats = ShardStats::new(0);
/// let sink = stats.sink(Discard);
/// assert_eq!(stats.io().sink_count(&SinkKind::SizingDataSink), Some(1));
/// drop(sink);
/// assert_eq!(stats.io().data_sinks(), 0);
/// ```
#[derive(Clone)]
pub struct ShardStats {
    shared: Rc<Shared>,
}

impl ShardStats {
    /// Creates empty statistics for the shard with the given id.
    pub fn new(shard: usize) -> Self {
        Self {
            shared: Rc::new(Shared {
                shard,
                io: IoStats::default(),
                registry: ImplRegistry::default(),
            }),
        }
    }

    /// Returns the shard id.
    pub fn shard(&self) -> usize {
        self.shared.shard
    }

    /// Returns the generic and dedicated counters.
    pub fn io(&self) -> &IoStats {
        &self.shared.io
    }

    /// Returns the open-set registry.
    pub fn registry(&self) -> &ImplRegistry {
        &self.shared.registry
    }

    /// Wraps a source implementation and registers it on this shard.
    pub fn source<I: SourceImpl>(&self, imp: I) -> DataSource {
        DataSource::new(imp, self)
    }

    /// Wraps a sink implementation and registers it on this shard.
    pub fn sink<I: SinkImpl>(&self, imp: I) -> DataSink {
        DataSink::new(imp, self)
    }

    /// Takes a consistent copy of every counter on this shard.
    ///
    /// Registration never suspends, so no wrapper can be half-registered
    /// while the snapshot is taken.
    pub fn snapshot(&self) -> IoStatsSnapshot {
        let io = &self.shared.io;
        let registry = &self.shared.registry;
        IoStatsSnapshot {
            shard: Some(self.shared.shard),
            data_sources: io.data_sources(),
            data_sinks: io.data_sinks(),
            sources: io.tracked_sources().collect(),
            sinks: io.tracked_sinks().collect(),
            source_registry: registry.source_entries().into_iter().collect(),
            sink_registry: registry.sink_entries().into_iter().collect(),
            merged: false,
        }
    }

    pub(crate) fn register_source(&self, kind: &SourceKind) {
        self.shared.io.increment_source(kind);
        self.shared.registry.increment_source(kind);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            shard = self.shared.shard,
            kind = %kind,
            live = self.shared.io.data_sources(),
            "data source registered"
        );
    }

    pub(crate) fn deregister_source(&self, kind: &SourceKind) {
        self.shared.io.decrement_source(kind);
        self.shared.registry.decrement_source(kind);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            shard = self.shared.shard,
            kind = %kind,
            live = self.shared.io.data_sources(),
            "data source deregistered"
        );
    }

    pub(crate) fn register_sink(&self, kind: &SinkKind) {
        self.shared.io.increment_sink(kind);
        self.shared.registry.increment_sink(kind);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            shard = self.shared.shard,
            kind = %kind,
            live = self.shared.io.data_sinks(),
            "data sink registered"
        );
    }

    pub(crate) fn deregister_sink(&self, kind: &SinkKind) {
        self.shared.io.decrement_sink(kind);
        self.shared.registry.decrement_sink(kind);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            shard = self.shared.shard,
            kind = %kind,
            live = self.shared.io.data_sinks(),
            "data sink deregistered"
        );
    }
}

impl fmt::Debug for ShardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardStats")
            .field("shard", &self.shared.shard)
            .field("data_sources", &self.shared.io.data_sources())
            .field("data_sinks", &self.shared.io.data_sinks())
            .finish()
    }
}
