use crate::error::PlayHqError;
use log::warn;
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;

/// Classifies a response's status into the §4.1 error taxonomy: success
/// passes the body through, 5xx/429 is transient (retried by the caller),
/// any other 4xx is permanent.
pub(crate) async fn classify_status(response: reqwest::Response) -> Result<serde_json::Value, PlayHqError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.text().await.map_err(PlayHqError::ReadBody)?;
        return serde_json::from_str(&bytes).map_err(PlayHqError::Deserialize);
    }

    if status.as_u16() == 429 || status.is_server_error() {
        return Err(PlayHqError::Transient { status: status.as_u16() });
    }

    let body = response.text().await.unwrap_or_default();
    Err(PlayHqError::Permanent {
        status: status.as_u16(),
        body,
    })
}

/// Retries a transient-failing request three times with jittered
/// exponential backoff (§4.1). Permanent failures return immediately.
pub(crate) async fn with_backoff<F, Fut, T>(mut attempt: F) -> Result<T, PlayHqError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlayHqError>>,
{
    let mut last_err = None;
    for attempt_number in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err @ PlayHqError::Transient { .. }) if attempt_number < MAX_ATTEMPTS => {
                let base_ms = 200u64 * 2u64.pow(attempt_number - 1);
                let jitter_ms = base_ms / 4;
                let sleep_ms = base_ms + fastrand_jitter(jitter_ms);
                warn!("transient error on attempt {attempt_number}/{MAX_ATTEMPTS}, retrying in {sleep_ms}ms: {err}");
                tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.expect("loop always sets last_err before exhausting attempts"))
}

/// Deterministic-enough jitter without pulling in a dedicated RNG crate for
/// one call site: the low bits of the monotonic clock are as unpredictable
/// as we need for spreading out retries.
fn fastrand_jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as u64) % (max_ms + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PlayHqError> = with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PlayHqError::Transient { status: 503 }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PlayHqError> = with_backoff(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(PlayHqError::Permanent {
                    status: 404,
                    body: String::new(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
