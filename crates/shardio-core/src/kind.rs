//! Implementation kinds for wrapped sources and sinks.
//!
//! Every stream implementation tags itself with a [`SourceKind`] or
//! [`SinkKind`]. Operationally significant kinds are enumerated variants and
//! receive a dedicated counter in [`IoStats`](crate::IoStats); everything
//! else is a [`CustomKind`] and is only accounted for in the
//! [`ImplRegistry`](crate::ImplRegistry).

use crate::error::{KindError, Result};
use std::borrow::Cow;
use std::fmt;

/// Identifier of an implementation kind outside the allow-list.
///
/// Custom identifiers are validated on construction: they are never empty
/// and never collide with an allow-listed identifier of the same family, so
/// a registry entry always maps to at most one dedicated counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomKind(Cow<'static, str>);

impl CustomKind {
    fn validate(name: Cow<'static, str>, reserved: &[&str]) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(KindError::Empty);
        }
        if reserved.contains(&name.as_ref()) {
            return Err(KindError::Reserved {
                name: name.into_owned(),
            });
        }
        Ok(Self(name))
    }

    /// Returns the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The concrete backing kind of a [`DataSource`](crate::DataSource).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Source decrypting an at-rest encrypted file.
    EncryptedDataSource,
    /// Source that discards an HTTP body.
    SkipBodySource,
    /// Source decoding an HTTP chunked transfer encoding.
    ChunkedSource,
    /// Read half of a TLS connected socket.
    TlsConnectedSocketSource,
    /// Source bounded by an HTTP `Content-Length`.
    ContentLengthSource,
    /// Object-storage download fetched in ranged chunks.
    ChunkedDownloadSource,
    /// Compressed, checksummed file reader.
    CompressedFileDataSource,
    /// Checksummed (uncompressed) file reader.
    ChecksummedFileDataSource,
    /// Source counting bytes for a server connection.
    CountedDataSource,
    /// Read half of a plain POSIX socket.
    PosixDataSource,
    /// Source restricted to a byte range of another source.
    RangedDataSource,
    /// Plain file reader.
    FileDataSource,
    /// Any kind without a dedicated counter.
    Custom(CustomKind),
}

impl SourceKind {
    /// Number of allow-listed source kinds.
    pub const TRACKED_COUNT: usize = 12;

    /// Identifiers of the allow-listed source kinds, in counter order.
    pub const TRACKED_NAMES: [&'static str; Self::TRACKED_COUNT] = [
        "encrypted_data_source",
        "skip_body_source",
        "chunked_source",
        "tls_connected_socket_source",
        "content_length_source",
        "chunked_download_source",
        "compressed_file_data_source",
        "checksummed_file_data_source",
        "counted_data_source",
        "posix_data_source",
        "ranged_data_source",
        "file_data_source",
    ];

    /// Creates a custom source kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use shardio_core::SourceKind;
    ///
    /// let kind = SourceKind::custom("custom_test_source").unwrap();
    /// assert!(!kind.is_tracked());
    /// assert!(SourceKind::custom("posix_data_source").is_err());
    /// ```
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Result<Self> {
        CustomKind::validate(name.into(), &Self::TRACKED_NAMES).map(Self::Custom)
    }

    /// Index of the dedicated counter, or `None` for custom kinds.
    pub fn counter_index(&self) -> Option<usize> {
        let index = match self {
            SourceKind::EncryptedDataSource => 0,
            SourceKind::SkipBodySource => 1,
            SourceKind::ChunkedSource => 2,
            SourceKind::TlsConnectedSocketSource => 3,
            SourceKind::ContentLengthSource => 4,
            SourceKind::ChunkedDownloadSource => 5,
            SourceKind::CompressedFileDataSource => 6,
            SourceKind::ChecksummedFileDataSource => 7,
            SourceKind::CountedDataSource => 8,
            SourceKind::PosixDataSource => 9,
            SourceKind::RangedDataSource => 10,
            SourceKind::FileDataSource => 11,
            SourceKind::Custom(_) => return None,
        };
        Some(index)
    }

    /// Returns `true` if this kind has a dedicated counter.
    pub fn is_tracked(&self) -> bool {
        self.counter_index().is_some()
    }

    /// Returns the stable identifier used in snapshots and the registry.
    pub fn as_str(&self) -> &str {
        if let SourceKind::Custom(custom) = self {
            return custom.as_str();
        }
        self.counter_index()
            .map_or_else(|| "", |index| Self::TRACKED_NAMES[index])
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concrete backing kind of a [`DataSink`](crate::DataSink).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// Sink bounded by an HTTP `Content-Length`.
    HttpContentLengthDataSink,
    /// Write half of a TLS connected socket.
    TlsConnectedSocketSink,
    /// Sink that only measures the bytes written to it.
    SizingDataSink,
    /// Compressed, checksummed file writer.
    CompressedFileDataSink,
    /// Sink counting bytes for a server connection.
    CountedDataSink,
    /// Write half of a plain POSIX socket.
    PosixDataSink,
    /// Checksummed (uncompressed) file writer.
    ChecksummedFileDataSink,
    /// Plain file writer.
    FileDataSink,
    /// Any kind without a dedicated counter.
    Custom(CustomKind),
}

impl SinkKind {
    /// Number of allow-listed sink kinds.
    pub const TRACKED_COUNT: usize = 8;

    /// Identifiers of the allow-listed sink kinds, in counter order.
    pub const TRACKED_NAMES: [&'static str; Self::TRACKED_COUNT] = [
        "http_content_length_data_sink",
        "tls_connected_socket_sink",
        "sizing_data_sink",
        "compressed_file_data_sink",
        "counted_data_sink",
        "posix_data_sink",
        "checksummed_file_data_sink",
        "file_data_sink",
    ];

    /// Creates a custom sink kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Result<Self> {
        CustomKind::validate(name.into(), &Self::TRACKED_NAMES).map(Self::Custom)
    }

    /// Index of the dedicated counter, or `None` for custom kinds.
    pub fn counter_index(&self) -> Option<usize> {
        let index = match self {
            SinkKind::HttpContentLengthDataSink => 0,
            SinkKind::TlsConnectedSocketSink => 1,
            SinkKind::SizingDataSink => 2,
            SinkKind::CompressedFileDataSink => 3,
            SinkKind::CountedDataSink => 4,
            SinkKind::PosixDataSink => 5,
            SinkKind::ChecksummedFileDataSink => 6,
            SinkKind::FileDataSink => 7,
            SinkKind::Custom(_) => return None,
        };
        Some(index)
    }

    /// Returns `true` if this kind has a dedicated counter.
    pub fn is_tracked(&self) -> bool {
        self.counter_index().is_some()
    }

    /// Returns the stable identifier used in snapshots and the registry.
    pub fn as_str(&self) -> &str {
        if let SinkKind::Custom(custom) = self {
            return custom.as_str();
        }
        self.counter_index()
            .map_or_else(|| "", |index| Self::TRACKED_NAMES[index])
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
