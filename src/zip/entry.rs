//! Entry materialization: one parsed local header in, filesystem effects
//! out, with CRC-32 verified over everything the entry produced.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use flate2::{Decompress, FlushDecompress, Status};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::{Result, ZipError};
use super::extractor::{CHUNK_SIZE, ExtractContext, MAX_NAME_LEN};
use super::structures::{ArchiveEntry, CompressionMethod, LocalFileHeader};
use crate::io::{ByteSource, read_full};

impl<'a, S: ByteSource> ExtractContext<'a, S> {
    /// Consume one entry: name, extra field, and content, positioned
    /// right after the header's fixed fields.
    pub(super) async fn materialize_entry(&mut self, header: &LocalFileHeader) -> Result<()> {
        let name_len = header.name_len as usize;
        if name_len == 0 {
            return Err(ZipError::Format(
                "empty entry name in local file header".to_string(),
            ));
        }
        if name_len > MAX_NAME_LEN {
            return Err(ZipError::Format(format!(
                "entry name length {name_len} exceeds {MAX_NAME_LEN}"
            )));
        }

        read_full(&mut *self.source, &mut self.name_buf[..name_len])
            .await
            .map_err(|e| ZipError::io("reading entry name", e))?;
        let name = String::from_utf8_lossy(&self.name_buf[..name_len]).into_owned();
        self.skip(header.extra_len as usize, "skipping entry extra field")
            .await?;

        let last = self.name_buf[name_len - 1];
        let entry = ArchiveEntry {
            name,
            is_directory: last == b'/' || last == b'\\',
            method: header.method,
            crc32: header.crc32,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
        };

        if entry.is_directory {
            self.create_directory_entry(&entry).await
        } else {
            self.write_file_entry(&entry).await
        }
    }

    async fn create_directory_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        if entry.compressed_size != 0 || entry.uncompressed_size != 0 {
            return Err(ZipError::Format(format!(
                "directory entry {} has nonzero size",
                entry.name
            )));
        }

        self.summary.directories += 1;
        if self.options.dry_run {
            return Ok(());
        }

        let path = self.dest_path(&entry.name);
        match fs::create_dir(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(ZipError::io(
                format!("error creating directory {}", path.display()),
                e,
            )),
        }
    }

    async fn write_file_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        if entry.compressed_size == 0 && entry.uncompressed_size != 0 {
            return Err(ZipError::Format(format!(
                "entry {} declares {} output bytes but carries no data",
                entry.name, entry.uncompressed_size
            )));
        }

        let mut dst = if self.options.dry_run {
            None
        } else {
            Some(self.open_destination(&entry.name).await?)
        };

        let mut crc = Hasher::new();
        if entry.compressed_size > 0 {
            match entry.method {
                CompressionMethod::Stored => {
                    self.copy_stored(entry, dst.as_mut(), &mut crc).await?
                }
                CompressionMethod::Deflate => self.inflate(entry, dst.as_mut(), &mut crc).await?,
                CompressionMethod::Unknown(method) => {
                    return Err(ZipError::UnsupportedMethod {
                        name: entry.name.clone(),
                        method,
                    });
                }
            }
        }

        let actual = crc.finalize();
        if actual != entry.crc32 {
            return Err(ZipError::CrcMismatch {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        self.summary.files += 1;
        self.summary.uncompressed_bytes += entry.uncompressed_size as u64;
        Ok(())
    }

    fn dest_path(&self, name: &str) -> PathBuf {
        match &self.options.dest {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Open the destination file, honoring the overwrite policy. A
    /// missing parent triggers one ancestor-creation walk and one retry;
    /// every other failure is fatal.
    async fn open_destination(&mut self, name: &str) -> Result<fs::File> {
        let path = self.dest_path(name);
        match self.try_create(&path).await {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ZipError::io(
                    format!("error creating file {}", path.display()),
                    e,
                ));
            }
        }

        self.create_ancestors(name).await?;
        self.try_create(&path)
            .await
            .map_err(|e| ZipError::io(format!("error creating file {}", path.display()), e))
    }

    async fn try_create(&self, path: &Path) -> std::io::Result<fs::File> {
        let mut options = fs::OpenOptions::new();
        options.write(true);
        if self.options.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        options.open(path).await
    }

    /// Create every missing ancestor directory of `name`, walking its
    /// path separators left to right and tolerating ones that already
    /// exist. Both `/` and `\` count as separators, as in entry names.
    async fn create_ancestors(&self, name: &str) -> Result<()> {
        for (i, ch) in name.char_indices() {
            if (ch == '/' || ch == '\\') && i > 0 {
                let path = self.dest_path(&name[..i]);
                match fs::create_dir(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                    Err(e) => {
                        return Err(ZipError::io(
                            format!("error creating directory {}", path.display()),
                            e,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Stored entries: verbatim bounded-chunk copy from source to
    /// destination, CRC accumulated per chunk as it is read.
    async fn copy_stored(
        &mut self,
        entry: &ArchiveEntry,
        mut dst: Option<&mut fs::File>,
        crc: &mut Hasher,
    ) -> Result<()> {
        if entry.compressed_size != entry.uncompressed_size {
            return Err(ZipError::Format(format!(
                "stored entry {} has compressed size {} but uncompressed size {}",
                entry.name, entry.compressed_size, entry.uncompressed_size
            )));
        }

        let mut remaining = entry.compressed_size as usize;
        while remaining > 0 {
            let take = remaining.min(CHUNK_SIZE);
            self.fill_input(take, "reading stored entry data").await?;
            crc.update(&self.in_buf[..take]);
            if let Some(file) = dst.as_mut() {
                file.write_all(&self.in_buf[..take])
                    .await
                    .map_err(|e| ZipError::io(format!("error writing file {}", entry.name), e))?;
            }
            remaining -= take;
        }
        Ok(())
    }

    /// Deflated entries: incremental raw-DEFLATE decompression, bounded
    /// input and output chunks, CRC accumulated over every produced
    /// chunk.
    ///
    /// Success requires the decompressor's end-of-stream signal with all
    /// `compressed_size` input bytes consumed; a stream that ends early
    /// or never signals its end is corrupt.
    async fn inflate(
        &mut self,
        entry: &ArchiveEntry,
        mut dst: Option<&mut fs::File>,
        crc: &mut Hasher,
    ) -> Result<()> {
        let mut inflater = Decompress::new(false);
        let mut remaining = entry.compressed_size as usize;
        let mut stream_end = false;
        let mut unconsumed = 0usize;

        while !stream_end && remaining > 0 {
            let take = remaining.min(CHUNK_SIZE);
            self.fill_input(take, "reading compressed entry data").await?;
            remaining -= take;

            // Run the decompressor over this input chunk until it stops
            // filling the output buffer.
            let mut fed = 0;
            loop {
                let before_in = inflater.total_in();
                let before_out = inflater.total_out();
                let status = inflater
                    .decompress(
                        &self.in_buf[fed..take],
                        &mut self.out_buf,
                        FlushDecompress::None,
                    )
                    .map_err(|e| ZipError::Inflate {
                        name: entry.name.clone(),
                        detail: e.to_string(),
                    })?;
                fed += (inflater.total_in() - before_in) as usize;
                let produced = (inflater.total_out() - before_out) as usize;

                if produced > 0 {
                    crc.update(&self.out_buf[..produced]);
                    if let Some(file) = dst.as_mut() {
                        file.write_all(&self.out_buf[..produced]).await.map_err(|e| {
                            ZipError::io(format!("error writing file {}", entry.name), e)
                        })?;
                    }
                }

                if matches!(status, Status::StreamEnd) {
                    stream_end = true;
                    break;
                }
                if produced < self.out_buf.len() {
                    break;
                }
            }
            unconsumed = take - fed;
        }

        if !stream_end {
            return Err(ZipError::Inflate {
                name: entry.name.clone(),
                detail: "deflate stream ended without end-of-stream marker".to_string(),
            });
        }
        let leftover = unconsumed + remaining;
        if leftover > 0 {
            return Err(ZipError::Inflate {
                name: entry.name.clone(),
                detail: format!("{leftover} compressed bytes left after end of deflate stream"),
            });
        }
        Ok(())
    }
}
