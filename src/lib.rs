//! # streamzip
//!
//! Download and extract ZIP archives from a forward-only byte stream.
//!
//! This library extracts ZIP archives while the bytes arrive: the source
//! is a pull-only sequential reader of unknown total length (a local
//! file, an in-memory buffer, or a live HTTP transfer), and entries are
//! materialized to the filesystem one at a time as their headers pass
//! by. Nothing is ever buffered beyond two fixed-size chunk buffers, so
//! the archive - and any single entry in it - may be arbitrarily large.
//!
//! Every entry's CRC-32 is verified, the archive's trailing structures
//! are validated, and the first violation of any kind aborts the whole
//! extraction.
//!
//! ## Features
//!
//! - Extract ZIP archives from local files, memory, or HTTP/HTTPS URLs
//! - Single-pass streaming: no seeking, no whole-archive buffering
//! - STORED (uncompressed) and DEFLATE compression methods
//! - Dry-run validation, overwrite control, SHA-256 transfer digest
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use streamzip::{ExtractOptions, FileSource, extract_archive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut source = FileSource::open(Path::new("archive.zip")).await?;
//!     let summary = extract_archive(&mut source, &ExtractOptions::default()).await?;
//!     println!("{} entries extracted", summary.entries);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::{ByteSource, FileSource, HttpSource, MemorySource, TeeSource};
pub use zip::{ExtractOptions, ExtractSummary, ZipError, extract_archive};
