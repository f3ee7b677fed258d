//! Shard snapshot gauge regression tests

use super::helpers::*;
use serial_test::serial;
use shardio_core::{IoStatsSnapshot, ShardStats, SinkImpl, SinkKind, SourceImpl, SourceKind};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

struct Ranged;

impl AsyncRead for Ranged {
    fn poll_read(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        _: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl SourceImpl for Ranged {
    fn kind(&self) -> SourceKind {
        SourceKind::RangedDataSource
    }
}

struct Spill;

impl AsyncWrite for Spill {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl SinkImpl for Spill {
    fn kind(&self) -> SinkKind {
        SinkKind::custom("spill_file_sink").unwrap()
    }
}

#[test]
#[serial]
fn shard_gauges_exist() {
    init_recorder();

    let stats = ShardStats::new(7);
    let _sources = [stats.source(Ranged), stats.source(Ranged)];
    let _sink = stats.sink(Spill);
    stats.snapshot().record_metrics();
    let recorded = get_metrics_snapshot();

    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "7")]), Some(2.0));
    assert_eq!(gauge_value(&recorded, "io_data_sinks", &[("shard", "7")]), Some(1.0));
    assert_eq!(
        gauge_value(
            &recorded,
            "io_source_impl",
            &[("shard", "7"), ("kind", "ranged_data_source")]
        ),
        Some(2.0)
    );

    assert_gauge_exists("io_data_sources");
    assert_gauge_exists("io_data_sinks");
    assert_gauge_exists("io_source_impl");
    assert_gauge_exists("io_sink_impl");
    assert_gauge_exists("io_source_impl_registered");
    assert_gauge_exists("io_sink_impl_registered");

    assert_metric_has_label("io_data_sources", "shard", "7");
    assert_metric_has_label("io_source_impl", "kind", "ranged_data_source");
    assert_metric_has_label("io_sink_impl_registered", "kind", "spill_file_sink");
}

#[test]
#[serial]
fn custom_kinds_have_no_dedicated_gauge() {
    init_recorder();

    let stats = ShardStats::new(8);
    let _sink = stats.sink(Spill);
    stats.snapshot().record_metrics();
    let recorded = get_metrics_snapshot();

    assert_eq!(
        gauge_value(
            &recorded,
            "io_sink_impl",
            &[("shard", "8"), ("kind", "spill_file_sink")]
        ),
        None
    );
    assert_eq!(
        gauge_value(
            &recorded,
            "io_sink_impl_registered",
            &[("shard", "8"), ("kind", "spill_file_sink")]
        ),
        Some(1.0)
    );
}

#[test]
#[serial]
fn gauges_follow_drops() {
    init_recorder();

    let stats = ShardStats::new(9);
    let source = stats.source(Ranged);
    stats.snapshot().record_metrics();
    let recorded = get_metrics_snapshot();
    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "9")]), Some(1.0));
    assert_eq!(
        gauge_value(
            &recorded,
            "io_source_impl_registered",
            &[("shard", "9"), ("kind", "ranged_data_source")]
        ),
        Some(1.0)
    );

    drop(source);
    stats.snapshot().record_metrics();
    let recorded = get_metrics_snapshot();
    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "9")]), Some(0.0));
    assert_eq!(
        gauge_value(
            &recorded,
            "io_source_impl_registered",
            &[("shard", "9"), ("kind", "ranged_data_source")]
        ),
        Some(0.0)
    );
}

#[test]
#[serial]
fn merged_snapshots_are_labelled_all() {
    init_recorder();

    let left = ShardStats::new(10);
    let right = ShardStats::new(11);
    let _a = left.source(Ranged);
    let _b = right.source(Ranged);

    let mut merged = left.snapshot();
    merged.merge(&right.snapshot());
    merged.record_metrics();
    let recorded = get_metrics_snapshot();

    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "all")]), Some(2.0));
}

#[test]
#[serial]
fn merged_idle_shards_are_labelled_all() {
    init_recorder();

    let mut merged = IoStatsSnapshot::default();
    for shard in 13..16 {
        merged.merge(&ShardStats::new(shard).snapshot());
    }
    merged.record_metrics();
    let recorded = get_metrics_snapshot();

    assert_eq!(merged.shard, None);
    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "all")]), Some(0.0));
    assert_eq!(gauge_value(&recorded, "io_data_sources", &[("shard", "15")]), None);
}
