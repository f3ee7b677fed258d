//! Type-erased, single-owner stream wrappers.
//!
//! [`DataSource`] and [`DataSink`] own exactly one implementation each and
//! forward all I/O to it. Construction classifies the implementation by the
//! kind it reports and registers it with the shard's [`ShardStats`]; drop
//! deregisters it. Both steps are synchronous and infallible, and drop runs
//! on every exit path including panic unwinding.

use crate::kind::{SinkKind, SourceKind};
use crate::stats::ShardStats;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A byte producer that can be wrapped in a [`DataSource`].
pub trait SourceImpl: AsyncRead + Unpin + 'static {
    /// The kind this implementation is accounted under.
    ///
    /// Queried once, when the wrapper is constructed.
    fn kind(&self) -> SourceKind;
}

/// A byte consumer that can be wrapped in a [`DataSink`].
pub trait SinkImpl: AsyncWrite + Unpin + 'static {
    /// The kind this implementation is accounted under.
    ///
    /// Queried once, when the wrapper is constructed.
    fn kind(&self) -> SinkKind;
}

/// Exclusive owner of a [`SourceImpl`].
///
/// Reads are delegated to the implementation through [`AsyncRead`].
pub struct DataSource {
    inner: Box<dyn SourceImpl>,
    kind: SourceKind,
    stats: ShardStats,
}

impl DataSource {
    /// Takes ownership of `imp` and registers it with `stats`.
    pub fn new<I: SourceImpl>(imp: I, stats: &ShardStats) -> Self {
        Self::from_boxed(Box::new(imp), stats)
    }

    /// Like [`new`](Self::new), for an implementation that is already boxed.
    pub fn from_boxed(imp: Box<dyn SourceImpl>, stats: &ShardStats) -> Self {
        let kind = imp.kind();
        stats.register_source(&kind);
        Self {
            inner: imp,
            kind,
            stats: stats.clone(),
        }
    }

    /// The kind resolved at construction.
    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// The shard this source is registered on.
    pub fn shard(&self) -> usize {
        self.stats.shard()
    }

    /// Borrows the wrapped implementation.
    pub fn get_ref(&self) -> &dyn SourceImpl {
        self.inner.as_ref()
    }

    /// Mutably borrows the wrapped implementation.
    pub fn get_mut(&mut self) -> &mut dyn SourceImpl {
        self.inner.as_mut()
    }
}

impl Drop for DataSource {
    fn drop(&mut self) {
        self.stats.deregister_source(&self.kind);
    }
}

impl AsyncRead for DataSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("kind", &self.kind)
            .field("shard", &self.stats.shard())
            .finish_non_exhaustive()
    }
}

/// Exclusive owner of a [`SinkImpl`].
///
/// Writes, flushes and shutdown are delegated through [`AsyncWrite`].
pub struct DataSink {
    inner: Box<dyn SinkImpl>,
    kind: SinkKind,
    stats: ShardStats,
}

impl DataSink {
    /// Takes ownership of `imp` and registers it with `stats`.
    pub fn new<I: SinkImpl>(imp: I, stats: &ShardStats) -> Self {
        Self::from_boxed(Box::new(imp), stats)
    }

    /// Like [`new`](Self::new), for an implementation that is already boxed.
    pub fn from_boxed(imp: Box<dyn SinkImpl>, stats: &ShardStats) -> Self {
        let kind = imp.kind();
        stats.register_sink(&kind);
        Self {
            inner: imp,
            kind,
            stats: stats.clone(),
        }
    }

    /// The kind resolved at construction.
    pub fn kind(&self) -> &SinkKind {
        &self.kind
    }

    /// The shard this sink is registered on.
    pub fn shard(&self) -> usize {
        self.stats.shard()
    }

    /// Borrows the wrapped implementation.
    pub fn get_ref(&self) -> &dyn SinkImpl {
        self.inner.as_ref()
    }

    /// Mutably borrows the wrapped implementation.
    pub fn get_mut(&mut self) -> &mut dyn SinkImpl {
        self.inner.as_mut()
    }
}

impl Drop for DataSink {
    fn drop(&mut self) {
        self.stats.deregister_sink(&self.kind);
    }
}

impl AsyncWrite for DataSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}

impl fmt::Debug for DataSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSink")
            .field("kind", &self.kind)
            .field("shard", &self.stats.shard())
            .finish_non_exhaustive()
    }
}
