use camino::Utf8Path;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared HTTP client defaults. No overall request timeout: export bodies
/// for large archives can take minutes to stream.
pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Stream a response body to `target`, landing through a `.part` sidecar so
/// a failed or killed transfer never leaves a truncated file at the final
/// path. Returns the number of bytes written.
pub async fn save_body_to_file(resp: Response, target: &Utf8Path) -> Result<u64, NetError> {
    let tmp = target.with_extension("part");

    let written = match write_stream(resp, &tmp).await {
        Ok(n) => n,
        Err(e) => {
            let _ = tokio::fs::remove_file(tmp.as_std_path()).await;
            return Err(e);
        }
    };

    if let Err(e) = robust_rename(tmp.as_std_path(), target.as_std_path()).await {
        let _ = tokio::fs::remove_file(tmp.as_std_path()).await;
        return Err(e.into());
    }

    Ok(written)
}

async fn write_stream(resp: Response, tmp: &Utf8Path) -> Result<u64, NetError> {
    let mut file = File::create(tmp.as_std_path()).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

/// Rename with retries. Antivirus and indexer scans can hold a fresh file
/// open briefly on some platforms.
async fn robust_rename(from: &std::path::Path, to: &std::path::Path) -> std::io::Result<()> {
    let mut attempt = 0u32;
    let max_attempts = 8u32;
    let mut backoff = Duration::from_millis(50);

    loop {
        match tokio::fs::rename(from, to).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                tracing::debug!(?from, ?to, attempt, "rename busy, retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_millis(2000));
            }
        }
    }
}
