//! Point-in-time copies of shard statistics.

use crate::kind::{SinkKind, SourceKind};
use std::collections::BTreeMap;

#[cfg(feature = "metrics")]
use metrics::{describe_gauge, gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Plain-data copy of one shard's counters (or the sum of several).
///
/// Unlike [`ShardStats`](crate::ShardStats), a snapshot is `Send` and can be
/// handed to a collector running elsewhere. Summing the snapshots of every
/// shard with [`merge`](Self::merge) yields the process-wide live counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IoStatsSnapshot {
    /// Shard the counters were taken from; `None` once snapshots of
    /// different shards have been merged.
    pub shard: Option<usize>,
    /// Live sources of any kind.
    pub data_sources: u64,
    /// Live sinks of any kind.
    pub data_sinks: u64,
    /// Dedicated counters of the allow-listed source kinds.
    pub sources: BTreeMap<&'static str, u64>,
    /// Dedicated counters of the allow-listed sink kinds.
    pub sinks: BTreeMap<&'static str, u64>,
    /// Every source kind ever registered.
    pub source_registry: BTreeMap<String, u64>,
    /// Every sink kind ever registered.
    pub sink_registry: BTreeMap<String, u64>,
    /// Set by the first `merge`. A default snapshot is an empty accumulator.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) merged: bool,
}

impl IoStatsSnapshot {
    /// Dedicated count for a source kind, `None` for custom kinds.
    pub fn source_count(&self, kind: &SourceKind) -> Option<u64> {
        kind.counter_index()
            .map(|_| self.sources.get(kind.as_str()).copied().unwrap_or(0))
    }

    /// Dedicated count for a sink kind, `None` for custom kinds.
    pub fn sink_count(&self, kind: &SinkKind) -> Option<u64> {
        kind.counter_index()
            .map(|_| self.sinks.get(kind.as_str()).copied().unwrap_or(0))
    }

    /// Registry count for a source identifier, `None` if never registered.
    pub fn registered_source(&self, name: &str) -> Option<u64> {
        self.source_registry.get(name).copied()
    }

    /// Registry count for a sink identifier, `None` if never registered.
    pub fn registered_sink(&self, name: &str) -> Option<u64> {
        self.sink_registry.get(name).copied()
    }

    /// Adds another snapshot's counters into this one.
    ///
    /// Merging into a [`Default`] snapshot adopts the other snapshot's
    /// shard. Once two different shards have been combined the shard is
    /// `None` for good, even when every counter is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use shardio_core::{IoStatsSnapshot, ShardStats};
    ///
    /// let mut total = IoStatsSnapshot::default();
    /// total.merge(&ShardStats::new(3).snapshot());
    /// assert_eq!(total.shard, Some(3));
    ///
    /// total.merge(&ShardStats::new(4).snapshot());
    /// total.merge(&ShardStats::new(5).snapshot());
    /// assert_eq!(total.shard, None);
    /// assert_eq!(total.data_sources, 0);
    /// ```
    pub fn merge(&mut self, other: &IoStatsSnapshot) {
        self.shard = match (self.merged, self.shard, other.shard) {
            (false, None, shard) => shard,
            (_, Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        };
        self.merged = true;

        self.data_sources += other.data_sources;
        self.data_sinks += other.data_sinks;
        for (name, count) in &other.sources {
            *self.sources.entry(*name).or_insert(0) += count;
        }
        for (name, count) in &other.sinks {
            *self.sinks.entry(*name).or_insert(0) += count;
        }
        for (name, count) in &other.source_registry {
            *self.source_registry.entry(name.clone()).or_insert(0) += count;
        }
        for (name, count) in &other.sink_registry {
            *self.sink_registry.entry(name.clone()).or_insert(0) += count;
        }
    }

    /// Publishes the snapshot as gauges through the `metrics` facade.
    ///
    /// Emitted gauges, all labelled with `shard` (`"all"` for merged
    /// snapshots):
    /// - `io_data_sources`, `io_data_sinks`
    /// - `io_source_impl{kind}`, `io_sink_impl{kind}` for allow-listed kinds
    /// - `io_source_impl_registered{kind}`, `io_sink_impl_registered{kind}`
    ///   for every registry entry
    #[cfg(feature = "metrics")]
    pub fn record_metrics(&self) {
        METRICS_INIT.call_once(|| {
            describe_gauge!("io_data_sources", "Live data sources on the shard");
            describe_gauge!("io_data_sinks", "Live data sinks on the shard");
            describe_gauge!(
                "io_source_impl",
                "Live data sources per allow-listed implementation kind"
            );
            describe_gauge!(
                "io_sink_impl",
                "Live data sinks per allow-listed implementation kind"
            );
            describe_gauge!(
                "io_source_impl_registered",
                "Live data sources per registered implementation identifier"
            );
            describe_gauge!(
                "io_sink_impl_registered",
                "Live data sinks per registered implementation identifier"
            );
        });

        let shard = self
            .shard
            .map_or_else(|| "all".to_string(), |shard| shard.to_string());

        gauge!("io_data_sources", "shard" => shard.clone()).set(self.data_sources as f64);
        gauge!("io_data_sinks", "shard" => shard.clone()).set(self.data_sinks as f64);

        for (kind, count) in &self.sources {
            gauge!("io_source_impl", "shard" => shard.clone(), "kind" => *kind)
                .set(*count as f64);
        }
        for (kind, count) in &self.sinks {
            gauge!("io_sink_impl", "shard" => shard.clone(), "kind" => *kind).set(*count as f64);
        }
        for (kind, count) in &self.source_registry {
            gauge!("io_source_impl_registered", "shard" => shard.clone(), "kind" => kind.clone())
                .set(*count as f64);
        }
        for (kind, count) in &self.sink_registry {
            gauge!("io_sink_impl_registered", "shard" => shard.clone(), "kind" => kind.clone())
                .set(*count as f64);
        }
    }
}
