//! HTTP retry helper for transient errors.
//!
//! Feed fetches go through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! automatic retry with exponential backoff on timeouts, connection resets,
//! rate limiting, and server errors. The periodic scheduler is the outer
//! retry loop, so the inner budget stays small.

use std::time::Duration;

use crate::FeedError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s) the total wait before giving up is
/// 6 seconds, well inside one poll period.
const MAX_RETRIES: u32 = 2;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Retries connection errors, timeouts, HTTP 429, and HTTP 5xx up to
/// [`MAX_RETRIES`] times. Does **not** retry other 4xx; these are
/// permanent.
///
/// # Errors
///
/// Returns [`FeedError`] if the request fails after all retries, the server
/// returns a non-retryable status, or the body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, FeedError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request).await?;
    let url = response.url().to_string();
    let status = response.status();

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        log::error!(
            "Feed body is not valid JSON (url: {url}, status: {status}, {} bytes): {e}",
            text.len()
        );
        FeedError::Json(e)
    })
}

/// Core retry loop: sends the request built by `build_request`, retrying
/// transient failures with exponential backoff, and returns the successful
/// response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F) -> Result<reqwest::Response, FeedError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt); // 2s, 4s
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    continue;
                }
                return Err(FeedError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                // 429 and 5xx are worth another attempt; other 4xx are not.
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status}");
                        continue;
                    }
                    return Err(FeedError::Malformed {
                        message: format!("HTTP {status} after {MAX_RETRIES} retries"),
                    });
                }
                if status.is_client_error() {
                    return Err(FeedError::Malformed {
                        message: format!("HTTP {status}"),
                    });
                }

                return Ok(response);
            }
        }
    }

    unreachable!("retry loop exited without returning")
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
