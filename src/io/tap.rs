use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::ByteSource;

/// Pass-through source that observes every byte it delivers.
///
/// Bytes read through the tee are fed to an optional SHA-256 accumulator
/// and appended to an optional save file, so the whole transfer can be
/// verified and/or persisted while the extractor consumes it. Both taps
/// disabled makes this a plain forwarder.
pub struct TeeSource<S> {
    inner: S,
    digest: Option<Sha256>,
    save: Option<File>,
}

impl<S: ByteSource> TeeSource<S> {
    pub fn new(inner: S, digest: bool, save: Option<File>) -> Self {
        Self {
            inner,
            digest: digest.then(Sha256::new),
            save,
        }
    }

    /// Consume the rest of the stream through the tee.
    ///
    /// The extractor stops right after the end-of-central-directory
    /// record; the digest and the saved file must cover any bytes the
    /// server sends beyond it. Returns the number of bytes drained.
    pub async fn drain(&mut self) -> io::Result<u64> {
        let mut scratch = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        loop {
            let n = self.read(&mut scratch).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
        }
        if let Some(file) = self.save.as_mut() {
            file.flush().await?;
        }
        Ok(total)
    }

    /// Finalize and return the SHA-256 digest of everything read so far.
    /// Returns `None` if the tee was created without a digest.
    pub fn finish_digest(&mut self) -> Option<[u8; 32]> {
        self.digest.take().map(|d| d.finalize().into())
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ByteSource> ByteSource for TeeSource<S> {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf).await?;
        if n > 0 {
            if let Some(digest) = self.digest.as_mut() {
                digest.update(&buf[..n]);
            }
            if let Some(file) = self.save.as_mut() {
                file.write_all(&buf[..n]).await?;
            }
        }
        Ok(n)
    }
}
