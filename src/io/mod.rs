mod http;
mod local;
mod memory;
mod tap;

pub use http::{HttpSource, login};
pub use local::FileSource;
pub use memory::MemorySource;
pub use tap::TeeSource;

use async_trait::async_trait;
use std::io;

/// Trait for pull-only sequential reading from a byte stream.
///
/// The stream has no known total length and cannot seek or rewind;
/// bytes are delivered exactly once, in order.
#[async_trait]
pub trait ByteSource: Send {
    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns the number of bytes read; 0 means the source is exhausted.
    /// Never returns more than requested and never re-delivers bytes
    /// already consumed.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Read exactly `buf.len()` bytes from `source`.
///
/// Loops over short reads; a source that runs dry before the buffer is
/// filled yields an `UnexpectedEof` error.
pub async fn read_full<S: ByteSource + ?Sized>(source: &mut S, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of stream",
            ));
        }
        filled += n;
    }
    Ok(())
}
