use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "streamzip")]
#[command(version)]
#[command(about = "Download and extract ZIP archives as they stream", long_about = None)]
#[command(after_help = "Examples:\n  \
  streamzip archive.zip                  extract a local archive here\n  \
  streamzip -o -d out https://example.com/archive.zip\n                                         download and extract into out/\n  \
  streamzip --dryrun --sha256 HEX https://example.com/archive.zip\n                                         validate the transfer, write nothing")]
pub struct Cli {
    /// ZIP file path or HTTP(S) URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// POST to this path on the archive's host before downloading;
    /// received cookies are sent with the download request
    #[arg(long, value_name = "PATH")]
    pub login: Option<String>,

    /// x-www-form-urlencoded data for the login POST
    #[arg(long = "login-data", value_name = "DATA", requires = "login")]
    pub login_data: Option<String>,

    /// Expected SHA-256 digest of the whole archive, 64 hex digits
    #[arg(long, value_name = "HEX", value_parser = parse_sha256)]
    pub sha256: Option<[u8; 32]>,

    /// Also save the downloaded archive to disk
    #[arg(long)]
    pub save: bool,

    /// Overwrite existing files WITHOUT prompting
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// Operate as usual but write nothing to disk
    #[arg(long)]
    pub dryrun: bool,

    /// Extract files into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Print a summary and transfer statistics when done
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Parse a 64-digit hex string into a 32-byte digest.
fn parse_sha256(s: &str) -> Result<[u8; 32], String> {
    if !s.is_ascii() || s.len() != 64 {
        return Err(format!("expected 64 hex digits, got {}", s.len()));
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let pair = &s[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex digits: {pair}"))?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sha256_accepts_valid_digest() {
        let hex = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let bytes = parse_sha256(hex).unwrap();
        assert_eq!(bytes[0], 0xe3);
        assert_eq!(bytes[31], 0x55);
    }

    #[test]
    fn parse_sha256_rejects_bad_input() {
        assert!(parse_sha256("abcd").is_err());
        let bad = "zz".repeat(32);
        assert!(parse_sha256(&bad).is_err());
    }
}
