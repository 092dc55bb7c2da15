use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use std::io;

use super::ByteSource;
use anyhow::{Result, anyhow, bail};

/// Streaming HTTP reader for remote ZIP files.
///
/// Issues a single GET request and consumes the response body front to
/// back as the bytes arrive. The transfer is one-shot: nothing is ever
/// re-requested, so the adapter works against servers without Range
/// support and never buffers more than one body chunk.
pub struct HttpSource {
    response: reqwest::Response,
    url: String,
    file_name_hint: Option<String>,
    pending: Vec<u8>,
    pos: usize,
    transferred_bytes: u64,
}

impl HttpSource {
    /// Start downloading `url` and return a reader over the response body.
    ///
    /// Fails if the server answers with a non-success status. Redirects
    /// are followed by the client.
    pub async fn open(client: &Client, url: &str) -> Result<Self> {
        let response = client.get(url).send().await?;

        if !response.status().is_success() {
            bail!("HTTP request failed with status: {}", response.status());
        }

        // Remember the Content-Disposition file name before the body is
        // consumed; used when saving the archive to disk.
        let file_name_hint = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition);

        Ok(Self {
            response,
            url: url.to_string(),
            file_name_hint,
            pending: Vec::new(),
            pos: 0,
            transferred_bytes: 0,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// File name to store the archive under when `--save` is active:
    /// the Content-Disposition name if the server sent one, otherwise
    /// the last path segment of the URL.
    pub fn file_name(&self) -> Option<String> {
        self.file_name_hint
            .clone()
            .or_else(|| file_name_from_url(&self.url))
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Refill from the body when the previous chunk is used up.
        while self.pos == self.pending.len() {
            match self.response.chunk().await.map_err(io::Error::other)? {
                Some(chunk) => {
                    self.pending.clear();
                    self.pending.extend_from_slice(&chunk);
                    self.pos = 0;
                    self.transferred_bytes += chunk.len() as u64;
                }
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Perform the pre-download login request.
///
/// Sends `form_data` as an x-www-form-urlencoded POST to `login_path` on
/// the archive URL's host. Cookies set by the response stay in the
/// client's cookie store and ride along with the archive GET.
pub async fn login(
    client: &Client,
    archive_url: &str,
    login_path: &str,
    form_data: Option<&str>,
) -> Result<()> {
    let url = login_url(archive_url, login_path)
        .ok_or_else(|| anyhow!("cannot derive login URL from {archive_url}"))?;

    let mut request = client.post(&url);
    if let Some(data) = form_data {
        request = request
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(data.to_string());
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        bail!("login request failed with status: {}", response.status());
    }
    Ok(())
}

/// Build the login URL from the archive URL's scheme + host and the
/// login path.
fn login_url(archive_url: &str, login_path: &str) -> Option<String> {
    let (scheme, rest) = archive_url.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    let sep = if login_path.starts_with('/') { "" } else { "/" };
    Some(format!("{scheme}://{host}{sep}{login_path}"))
}

/// Extract the `filename=` parameter from a Content-Disposition header.
fn file_name_from_disposition(header: &str) -> Option<String> {
    let lower = header.to_ascii_lowercase();
    let at = lower.find("filename=")?;
    let value = header[at + "filename=".len()..]
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Last non-empty path segment of the URL, query string stripped.
fn file_name_from_url(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let path = rest.split(['?', '#']).next().unwrap_or(rest);
    let mut segments = path.split('/');
    let _host = segments.next();
    segments
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_joins_host_and_path() {
        assert_eq!(
            login_url("https://example.com/files/a.zip", "/api/login"),
            Some("https://example.com/api/login".to_string())
        );
        assert_eq!(
            login_url("http://example.com", "login"),
            Some("http://example.com/login".to_string())
        );
        assert_eq!(login_url("example.com/a.zip", "/login"), None);
    }

    #[test]
    fn file_name_from_disposition_variants() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=data.zip"),
            Some("data.zip".to_string())
        );
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"data.zip\"; size=3"),
            Some("data.zip".to_string())
        );
        assert_eq!(file_name_from_disposition("attachment"), None);
    }

    #[test]
    fn file_name_from_url_takes_last_segment() {
        assert_eq!(
            file_name_from_url("https://example.com/a/b/data.zip?token=x"),
            Some("data.zip".to_string())
        );
        assert_eq!(
            file_name_from_url("https://example.com/data.zip/"),
            Some("data.zip".to_string())
        );
        assert_eq!(file_name_from_url("https://example.com/"), None);
        assert_eq!(file_name_from_url("https://example.com"), None);
    }
}
