use std::fmt;
use std::time::Duration;

use crate::config::RetryConfig;

/// Error from one download attempt: request, body transfer, or a
/// condition that retrying cannot fix.
#[derive(Debug)]
pub enum FetchAttemptError {
    /// HTTP-level error (retryable when transport, 429, 5xx).
    Http(Box<ureq::Error>),
    /// Body transfer I/O error (retryable on resets, EOF, timeouts).
    BodyIo(std::io::Error),
    /// Never retried.
    Permanent(String),
}

impl FetchAttemptError {
    pub fn http(e: ureq::Error) -> Self {
        FetchAttemptError::Http(Box::new(e))
    }
}

impl fmt::Display for FetchAttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchAttemptError::Http(e) => match e.as_ref() {
                ureq::Error::Status(code, _) => write!(f, "server responded with HTTP {code}"),
                ureq::Error::Transport(t) => write!(f, "{t}"),
            },
            FetchAttemptError::BodyIo(e) => write!(f, "body read error: {e}"),
            FetchAttemptError::Permanent(msg) => write!(f, "{msg}"),
        }
    }
}

/// Whether an HTTP error is transient and worth retrying.
pub fn is_retryable_http(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Transport(_) => true,
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
    }
}

/// Whether an I/O error is transient and worth retrying.
pub fn is_retryable_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
    )
}

fn is_retryable(err: &FetchAttemptError) -> bool {
    match err {
        FetchAttemptError::Http(e) => is_retryable_http(e.as_ref()),
        FetchAttemptError::BodyIo(e) => is_retryable_io(e),
        FetchAttemptError::Permanent(_) => false,
    }
}

/// Run `f` until it succeeds, fails permanently, or retries are exhausted.
///
/// Delays grow exponentially from `retry_delay_ms` up to `retry_max_delay_ms`,
/// with up to one delay's worth of random jitter added.
pub fn with_retry<T>(
    config: &RetryConfig,
    label: &str,
    mut f: impl FnMut() -> Result<T, FetchAttemptError>,
) -> Result<T, FetchAttemptError> {
    let mut delay_ms = config.retry_delay_ms;
    let mut attempt = 0;

    loop {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) if is_retryable(&e) && attempt < config.max_retries => {
                tracing::warn!(
                    "{label}: transient error (attempt {}/{}), retrying: {e}",
                    attempt + 1,
                    config.max_retries,
                );
            }
            Err(e) => return Err(e),
        }

        let jitter = rand::random::<u64>() % delay_ms.max(1);
        std::thread::sleep(Duration::from_millis(delay_ms + jitter));
        delay_ms = (delay_ms * 2).min(config.retry_max_delay_ms);
        attempt += 1;
    }
}
