//! ZIP archive parsing and streaming extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: wire-level ZIP structures (local/central headers,
//!   end record), decoded field by field in little-endian order
//! - [`extractor`]: the 3-phase state machine that drives the stream and
//!   the per-call context owning the bounded chunk buffers
//! - `entry`: materialization of one entry (directories, files,
//!   stored/deflate content, CRC-32 verification)
//! - [`error`]: the extraction error taxonomy
//!
//! ## Streaming model
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the stream strictly front to back: each
//! entry is extracted as its local header arrives, the central directory
//! is consumed skip-only, and the end record must be the last bytes of
//! the stream. Nothing is buffered beyond two fixed 16 KiB chunks, so a
//! live network transfer of any size can be extracted as it downloads.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - Dry-run validation and overwrite control
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No ZIP64 extensions
//! - No BZIP2, LZMA, or other compression methods

mod entry;
mod error;
mod extractor;
mod structures;

pub use error::{Result, ZipError};
pub use extractor::{ExtractOptions, ExtractSummary, extract_archive};
pub use structures::{
    ArchiveEntry, CentralDirectoryHeader, CompressionMethod, EndOfCentralDirectory,
    LocalFileHeader,
};
