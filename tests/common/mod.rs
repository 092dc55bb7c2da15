//! Helpers for building raw ZIP archives byte by byte.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const CDFH_SIGNATURE: u32 = 0x02014b50;
pub const EOCD_SIGNATURE: u32 = 0x06054b50;

pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Compress `data` as a raw DEFLATE stream (no zlib wrapper).
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn local_header(name: &str, method: u16, crc: u32, compressed: u32, uncompressed: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&LFH_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&method.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // mod time
    out.extend_from_slice(&0u16.to_le_bytes()); // mod date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&compressed.to_le_bytes());
    out.extend_from_slice(&uncompressed.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra len
    out.extend_from_slice(name.as_bytes());
    out
}

pub fn central_header(
    name: &str,
    method: u16,
    crc: u32,
    compressed: u32,
    uncompressed: u32,
    offset: u32,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&CDFH_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&20u16.to_le_bytes()); // version made by
    out.extend_from_slice(&20u16.to_le_bytes()); // version needed
    out.extend_from_slice(&0u16.to_le_bytes()); // flags
    out.extend_from_slice(&method.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // mod time
    out.extend_from_slice(&0u16.to_le_bytes()); // mod date
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&compressed.to_le_bytes());
    out.extend_from_slice(&uncompressed.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra len
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number start
    out.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
    out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out
}

pub fn end_record(entries: u16, cd_size: u32, cd_offset: u32, comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // disk with cd
    out.extend_from_slice(&entries.to_le_bytes());
    out.extend_from_slice(&entries.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

struct BuiltEntry {
    name: String,
    method: u16,
    crc: u32,
    payload: Vec<u8>,
    uncompressed: u32,
}

/// Assembles well-formed archives; the malformed cases use the header
/// functions above directly.
pub struct ArchiveBuilder {
    entries: Vec<BuiltEntry>,
    comment: Vec<u8>,
    eocd_entries: Option<u16>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            comment: Vec::new(),
            eocd_entries: None,
        }
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            method: 0,
            crc: crc32(data),
            payload: data.to_vec(),
            uncompressed: data.len() as u32,
        });
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            method: 8,
            crc: crc32(data),
            payload: deflate(data),
            uncompressed: data.len() as u32,
        });
        self
    }

    pub fn directory(self, name: &str) -> Self {
        self.stored(name, &[])
    }

    /// Add an entry with caller-chosen header fields, for crafted cases.
    pub fn raw(mut self, name: &str, method: u16, crc: u32, payload: Vec<u8>, uncompressed: u32) -> Self {
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            method,
            crc,
            payload,
            uncompressed,
        });
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Override the entry-count fields written into the end record.
    pub fn eocd_entries(mut self, count: u16) -> Self {
        self.eocd_entries = Some(count);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&local_header(
                &entry.name,
                entry.method,
                entry.crc,
                entry.payload.len() as u32,
                entry.uncompressed,
            ));
            out.extend_from_slice(&entry.payload);
        }

        let cd_offset = out.len() as u32;
        for (entry, offset) in self.entries.iter().zip(&offsets) {
            out.extend_from_slice(&central_header(
                &entry.name,
                entry.method,
                entry.crc,
                entry.payload.len() as u32,
                entry.uncompressed,
                *offset,
            ));
        }
        let cd_size = out.len() as u32 - cd_offset;

        let count = self
            .eocd_entries
            .unwrap_or(self.entries.len() as u16);
        out.extend_from_slice(&end_record(count, cd_size, cd_offset, &self.comment));
        out
    }
}
