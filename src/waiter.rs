use std::future::Future;

use anyhow::{anyhow, Result};
use tokio::time::{sleep, Duration, Instant};

/// Poll `probe` until it yields a value or `timeout` elapses.
///
/// The deadline is checked before each attempt, so a probe that starts
/// inside the window and comes back truthy wins even if it finishes past
/// the deadline. Probe errors are remembered and retried; only the
/// timeout turns them into a failure, carrying the last error text so a
/// stuck harness run says what was failing, not just that time ran out.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    mut probe: F,
    timeout: Duration,
    interval: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let mut last_err: Option<anyhow::Error> = None;
    let mut attempts = 0u32;
    loop {
        if started.elapsed() >= timeout {
            let base = anyhow!(
                "timed out after {}ms waiting for {what} ({attempts} attempts)",
                timeout.as_millis()
            );
            return Err(match last_err {
                Some(e) => base.context(format!("last probe error: {e:#}")),
                None => base,
            });
        }
        attempts += 1;
        match probe().await {
            Ok(Some(value)) => {
                log::debug!("{what}: satisfied after {attempts} attempts");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => {
                log::debug!("{what}: probe error on attempt {attempts}: {e:#}");
                last_err = Some(e);
            }
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn always_false_probe_fails_inside_the_expected_window() {
        let started = Instant::now();
        let result: Result<()> = wait_until(
            "never",
            || async { Ok(None) },
            Duration::from_millis(100),
            Duration::from_millis(10),
        )
        .await;
        assert!(result.is_err());
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(100), "failed early: {waited:?}");
        assert!(waited <= Duration::from_millis(110), "failed late: {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn truthy_probe_returns_early() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let started = Instant::now();
        let value = wait_until(
            "third time lucky",
            move || {
                let calls = probe_calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                        Ok(Some(42u32))
                    } else {
                        Ok(None)
                    }
                }
            },
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_are_retried_not_fatal() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let value = wait_until(
            "flaky",
            move || {
                let calls = probe_calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(anyhow!("connection refused"))
                    } else {
                        Ok(Some("up"))
                    }
                }
            },
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert_eq!(value, "up");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_failure_surfaces_the_last_probe_error() {
        let result: Result<()> = wait_until(
            "doomed",
            || async { Err(anyhow!("boom-7")) },
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;
        let text = format!("{:#}", result.unwrap_err());
        assert!(text.contains("timed out"), "{text}");
        assert!(text.contains("boom-7"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_fails_without_probing() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let result: Result<()> = wait_until(
            "instant deadline",
            move || {
                let calls = probe_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
            Duration::ZERO,
            Duration::from_millis(10),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
