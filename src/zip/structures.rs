use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use super::error::{Result, ZipError};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Local File Header (LFH) - signature + 26 fixed bytes
///
/// The variable-length name and extra field follow in the stream; they
/// are consumed separately and never stored here.
#[derive(Debug)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x04034b50;
    pub const FIXED_SIZE: usize = 26;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::FIXED_SIZE {
            return Err(ZipError::Format("local file header too short".to_string()));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name_len: cursor.read_u16::<LittleEndian>()?,
            extra_len: cursor.read_u16::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - signature + 42 fixed bytes
///
/// Consumed only so its variable-length name, extra field, and comment
/// can be skipped; extraction takes nothing else from it.
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
    pub comment_len: u16,
    pub disk_number_start: u16,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = 0x02014b50;
    pub const FIXED_SIZE: usize = 42;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::FIXED_SIZE {
            return Err(ZipError::Format(
                "central directory header too short".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            method: cursor.read_u16::<LittleEndian>()?,
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name_len: cursor.read_u16::<LittleEndian>()?,
            extra_len: cursor.read_u16::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
            disk_number_start: cursor.read_u16::<LittleEndian>()?,
            internal_attributes: cursor.read_u16::<LittleEndian>()?,
            external_attributes: cursor.read_u32::<LittleEndian>()?,
            local_header_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// End of Central Directory record (EOCD) - signature + 18 fixed bytes
///
/// Terminal structure of the archive; its variable-length comment must
/// be the last bytes of the stream.
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const FIXED_SIZE: usize = 18;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::FIXED_SIZE {
            return Err(ZipError::Format(
                "end of central directory record too short".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }
}

/// One entry derived from a local file header, alive only while that
/// entry is being materialized.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_directory: bool,
    pub method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lfh_tail() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        data.extend_from_slice(&0u16.to_le_bytes()); // flags
        data.extend_from_slice(&8u16.to_le_bytes()); // method
        data.extend_from_slice(&0x6000u16.to_le_bytes()); // time
        data.extend_from_slice(&0x5a21u16.to_le_bytes()); // date
        data.extend_from_slice(&0xdeadbeefu32.to_le_bytes()); // crc32
        data.extend_from_slice(&42u32.to_le_bytes()); // compressed
        data.extend_from_slice(&100u32.to_le_bytes()); // uncompressed
        data.extend_from_slice(&5u16.to_le_bytes()); // name len
        data.extend_from_slice(&0u16.to_le_bytes()); // extra len
        data
    }

    #[test]
    fn parse_local_file_header() {
        let header = LocalFileHeader::from_bytes(&sample_lfh_tail()).unwrap();
        assert_eq!(header.version_needed, 20);
        assert_eq!(header.method, CompressionMethod::Deflate);
        assert_eq!(header.crc32, 0xdeadbeef);
        assert_eq!(header.compressed_size, 42);
        assert_eq!(header.uncompressed_size, 100);
        assert_eq!(header.name_len, 5);
        assert_eq!(header.extra_len, 0);
    }

    #[test]
    fn short_header_is_a_format_error() {
        let err = LocalFileHeader::from_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, ZipError::Format(_)));
    }

    #[test]
    fn compression_method_mapping() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(
            CompressionMethod::from_u16(99),
            CompressionMethod::Unknown(99)
        );
        assert_eq!(CompressionMethod::Unknown(99).as_u16(), 99);
    }

    #[test]
    fn parse_end_of_central_directory() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes()); // disk number
        data.extend_from_slice(&0u16.to_le_bytes()); // disk with cd
        data.extend_from_slice(&3u16.to_le_bytes()); // disk entries
        data.extend_from_slice(&3u16.to_le_bytes()); // total entries
        data.extend_from_slice(&146u32.to_le_bytes()); // cd size
        data.extend_from_slice(&1024u32.to_le_bytes()); // cd offset
        data.extend_from_slice(&7u16.to_le_bytes()); // comment len

        let record = EndOfCentralDirectory::from_bytes(&data).unwrap();
        assert_eq!(record.total_entries, 3);
        assert_eq!(record.cd_offset, 1024);
        assert_eq!(record.comment_len, 7);
    }
}
