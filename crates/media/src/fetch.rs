//! Size-guarded download of remote payloads.

use {futures::StreamExt, reqwest::Client};

use crate::{Error, Result};

/// Download the full body of `url`, failing with [`Error::TooLarge`] once
/// the payload exceeds `max_bytes`.
///
/// A `Content-Length` pre-check fails fast, but the streamed byte count is
/// what gets enforced; the header is advisory and can lie.
pub async fn download(client: &Client, url: &str, max_bytes: u64) -> Result<Vec<u8>> {
    let resp = client.get(url).send().await?.error_for_status()?;

    if let Some(len) = resp.content_length()
        && len > max_bytes
    {
        return Err(Error::TooLarge { limit: max_bytes });
    }

    let mut body: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(Error::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
