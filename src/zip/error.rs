use thiserror::Error;

/// Errors surfaced while extracting an archive.
///
/// Every variant aborts the extraction immediately: no entry is skipped,
/// recovered, or retried. Variants carry the failing entry's name where
/// one is known.
#[derive(Debug, Error)]
pub enum ZipError {
    /// Bad or mismatched signature, inconsistent size fields, oversized
    /// name, or any other structural violation.
    #[error("invalid zip structure: {0}")]
    Format(String),

    /// Compression method outside stored (0) and deflated (8).
    #[error("compression method {method} of {name} is not supported")]
    UnsupportedMethod { name: String, method: u16 },

    /// Short or failed read, write failure, or a directory/file creation
    /// failure other than "already exists".
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Declared CRC-32 does not match the extracted content.
    #[error("crc32 does not match for {name}: expected {expected:#010x}, actual {actual:#010x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Corrupt or malformed DEFLATE stream.
    #[error("error inflating {name}: {detail}")]
    Inflate { name: String, detail: String },
}

impl ZipError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ZipError::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<std::io::Error> for ZipError {
    fn from(source: std::io::Error) -> Self {
        ZipError::io("archive read failed", source)
    }
}

pub type Result<T> = std::result::Result<T, ZipError>;
