//! Streaming archive extraction.
//!
//! The extractor consumes the archive front to back as one 3-phase state
//! machine over the sequence of structures in the stream:
//!
//! 1. `LocalEntries` - local file headers and their content, one entry at
//!    a time, each handed to the entry materializer as soon as its header
//!    is parsed.
//! 2. `CentralDirectory` - exactly one central directory header per local
//!    entry seen, consumed only to skip its variable-length tail.
//! 3. `EndRecord` - the end-of-central-directory record and its comment,
//!    which must be the last bytes of the stream.
//!
//! The signature that terminates one phase is carried into the next; the
//! stream is never re-read or rewound. Any structural violation aborts
//! the whole extraction with a single diagnostic.
//!
//! Memory use is bounded: one extraction call owns two 16 KiB chunk
//! buffers and one name buffer, reused across every entry and every
//! chunk, no matter how large the archive or any single entry is.

use std::path::PathBuf;

use super::error::{Result, ZipError};
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::io::{ByteSource, read_full};

/// Chunk size for both reusable content buffers (16 KiB).
pub(super) const CHUNK_SIZE: usize = 0x4000;

/// Longest accepted entry name, in bytes.
pub(super) const MAX_NAME_LEN: usize = 260;

/// Extraction configuration
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Replace existing destination files instead of failing
    pub overwrite: bool,
    /// Parse, decompress, and validate without touching the filesystem
    pub dry_run: bool,
    /// Extract into this directory instead of the current one
    pub dest: Option<PathBuf>,
}

/// Totals reported after a successful extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractSummary {
    /// Local entries processed, files and directories together
    pub entries: u64,
    pub files: u64,
    pub directories: u64,
    /// Total content bytes produced (or validated, in dry-run mode)
    pub uncompressed_bytes: u64,
}

/// Outcome of one phase iteration: keep iterating the current phase, or
/// move to the next one. Errors travel separately, through `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LocalEntries,
    CentralDirectory,
    EndRecord,
    Done,
}

impl Phase {
    fn next(self) -> Phase {
        match self {
            Phase::LocalEntries => Phase::CentralDirectory,
            Phase::CentralDirectory => Phase::EndRecord,
            Phase::EndRecord => Phase::Done,
            Phase::Done => Phase::Done,
        }
    }
}

/// Per-call extraction state: the source, the options, and the reusable
/// buffers. Nothing here is shared between extractions, so independent
/// archives may be extracted concurrently with one context each.
pub(super) struct ExtractContext<'a, S: ByteSource> {
    pub(super) source: &'a mut S,
    pub(super) options: &'a ExtractOptions,
    pub(super) in_buf: Vec<u8>,
    pub(super) out_buf: Vec<u8>,
    pub(super) name_buf: Vec<u8>,
    pub(super) summary: ExtractSummary,
    /// Signature read by one phase and consumed by the next.
    held_signature: u32,
    central_seen: u64,
}

impl<'a, S: ByteSource> ExtractContext<'a, S> {
    fn new(source: &'a mut S, options: &'a ExtractOptions) -> Self {
        Self {
            source,
            options,
            in_buf: vec![0u8; CHUNK_SIZE],
            out_buf: vec![0u8; CHUNK_SIZE],
            name_buf: vec![0u8; MAX_NAME_LEN],
            summary: ExtractSummary::default(),
            held_signature: 0,
            central_seen: 0,
        }
    }

    async fn run(&mut self) -> Result<ExtractSummary> {
        let mut phase = Phase::LocalEntries;
        while phase != Phase::Done {
            let step = match phase {
                Phase::LocalEntries => self.local_entries_step().await?,
                Phase::CentralDirectory => self.central_directory_step().await?,
                Phase::EndRecord => self.end_record_step().await?,
                Phase::Done => break,
            };
            if step == Step::Advance {
                phase = phase.next();
            }
        }
        Ok(self.summary)
    }

    /// One local-entry iteration: read a signature, and either parse and
    /// materialize the entry behind it or carry the signature into the
    /// central-directory phase.
    async fn local_entries_step(&mut self) -> Result<Step> {
        let signature = self.read_signature("reading entry signature").await?;
        if signature != LocalFileHeader::SIGNATURE {
            self.held_signature = signature;
            return Ok(Step::Advance);
        }

        let mut fixed = [0u8; LocalFileHeader::FIXED_SIZE];
        read_full(&mut *self.source, &mut fixed)
            .await
            .map_err(|e| ZipError::io("reading local file header", e))?;
        let header = LocalFileHeader::from_bytes(&fixed)?;

        self.materialize_entry(&header).await?;
        self.summary.entries += 1;
        Ok(Step::Continue)
    }

    /// One central-directory iteration. The local-entry count is the
    /// source of truth for how many headers to expect here; the end
    /// record's own count fields are never consulted.
    async fn central_directory_step(&mut self) -> Result<Step> {
        if self.central_seen == self.summary.entries {
            return Ok(Step::Advance);
        }

        if self.held_signature != CentralDirectoryHeader::SIGNATURE {
            return Err(ZipError::Format(format!(
                "expected central directory header, found signature {:#010x}",
                self.held_signature
            )));
        }

        let mut fixed = [0u8; CentralDirectoryHeader::FIXED_SIZE];
        read_full(&mut *self.source, &mut fixed)
            .await
            .map_err(|e| ZipError::io("reading central directory header", e))?;
        let header = CentralDirectoryHeader::from_bytes(&fixed)?;

        let tail =
            header.name_len as usize + header.extra_len as usize + header.comment_len as usize;
        self.skip(tail, "skipping central directory entry").await?;

        self.held_signature = self
            .read_signature("reading signature after central directory entry")
            .await?;
        self.central_seen += 1;
        Ok(Step::Continue)
    }

    /// Parse the end record, skip its comment, and require a clean end of
    /// stream right behind it.
    async fn end_record_step(&mut self) -> Result<Step> {
        if self.held_signature != EndOfCentralDirectory::SIGNATURE {
            return Err(ZipError::Format(format!(
                "expected end of central directory record, found signature {:#010x}",
                self.held_signature
            )));
        }

        let mut fixed = [0u8; EndOfCentralDirectory::FIXED_SIZE];
        read_full(&mut *self.source, &mut fixed)
            .await
            .map_err(|e| ZipError::io("reading end of central directory record", e))?;
        let record = EndOfCentralDirectory::from_bytes(&fixed)?;

        self.skip(record.comment_len as usize, "skipping archive comment")
            .await?;

        let mut probe = [0u8; 1];
        let n = self
            .source
            .read(&mut probe)
            .await
            .map_err(|e| ZipError::io("probing for end of stream", e))?;
        if n != 0 {
            return Err(ZipError::Format(
                "trailing data after end of central directory record".to_string(),
            ));
        }
        Ok(Step::Advance)
    }

    async fn read_signature(&mut self, context: &'static str) -> Result<u32> {
        let mut bytes = [0u8; 4];
        read_full(&mut *self.source, &mut bytes)
            .await
            .map_err(|e| ZipError::io(context, e))?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read exactly `len` bytes into the front of the input buffer.
    pub(super) async fn fill_input(&mut self, len: usize, context: &'static str) -> Result<()> {
        debug_assert!(len <= CHUNK_SIZE);
        read_full(&mut *self.source, &mut self.in_buf[..len])
            .await
            .map_err(|e| ZipError::io(context, e))
    }

    /// Discard exactly `n` bytes, reusing the input buffer as scratch.
    pub(super) async fn skip(&mut self, mut n: usize, context: &'static str) -> Result<()> {
        while n > 0 {
            let take = n.min(CHUNK_SIZE);
            self.fill_input(take, context).await?;
            n -= take;
        }
        Ok(())
    }
}

/// Extract one complete archive from `source`, materializing its entries
/// per `options`.
///
/// The source is consumed front to back exactly once; on success it has
/// been read up to and including the archive's terminal record and its
/// comment, and nothing further. Any violation aborts immediately with
/// the first error encountered.
pub async fn extract_archive<S: ByteSource>(
    source: &mut S,
    options: &ExtractOptions,
) -> Result<ExtractSummary> {
    ExtractContext::new(source, options).run().await
}
