pub mod retry;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use self::retry::{with_retry, FetchAttemptError};
use crate::config::FetchConfig;
use crate::error::{CabinetError, Result};

/// Whether `origin` names a remote resource this crate can download.
pub fn is_url(origin: &str) -> bool {
    let lower = origin.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn build_agent(config: &FetchConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(config.connect_timeout())
        .timeout(config.timeout())
        .user_agent(concat!("cabinet/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Download `url` into `dest`, truncating it on every attempt.
///
/// Returns the number of bytes written. Bodies larger than
/// `config.max_bytes` are rejected without retry.
pub fn download(url: &str, dest: &Path, config: &FetchConfig) -> Result<u64> {
    let agent = build_agent(config);
    let max_bytes = config.max_bytes;
    debug!(%url, dest = %dest.display(), "starting download");

    let written = with_retry(&config.retry, url, || {
        let resp = agent.get(url).call().map_err(FetchAttemptError::http)?;

        if let Some(declared) = resp
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            if declared > max_bytes {
                return Err(FetchAttemptError::Permanent(format!(
                    "response of {declared} bytes exceeds the {max_bytes}-byte limit"
                )));
            }
        }

        let mut file = File::create(dest)
            .map_err(|e| FetchAttemptError::Permanent(format!("cannot create staging file: {e}")))?;
        let mut body = resp.into_reader().take(max_bytes.saturating_add(1));
        let n = copy_body(&mut body, &mut file)?;
        if n > max_bytes {
            return Err(FetchAttemptError::Permanent(format!(
                "response exceeds the {max_bytes}-byte limit"
            )));
        }
        file.sync_all()
            .map_err(|e| FetchAttemptError::Permanent(format!("cannot flush staging file: {e}")))?;
        Ok(n)
    })
    .map_err(|e| CabinetError::retrieval(url, e.to_string()))?;

    info!(%url, bytes = written, "downloaded");
    Ok(written)
}

/// Like `io::copy`, but keeps body-read failures apart from local write failures.
fn copy_body(body: &mut impl Read, out: &mut impl Write) -> std::result::Result<u64, FetchAttemptError> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FetchAttemptError::BodyIo(e)),
        };
        out.write_all(&buf[..n])
            .map_err(|e| FetchAttemptError::Permanent(format!("cannot write staging file: {e}")))?;
        total += n as u64;
    }
}
