//! "Try enhanced, else baseline" for every capability call site.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::llm_client::{Capability, LlmError};

/// Runs `call` against the capability if it is available and finishes within
/// `timeout`. Returns `None` on unavailability, error or timeout so the caller
/// falls back to its deterministic result.
pub async fn enhanced_or<T, F, Fut>(
    capability: &dyn Capability,
    timeout: Duration,
    operation: &str,
    call: F,
) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    if !capability.available() {
        debug!(
            "{operation}: capability '{}' unavailable, using baseline",
            capability.name()
        );
        return None;
    }

    match tokio::time::timeout(timeout, call()).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(
                "{operation}: capability '{}' failed, using baseline: {e}",
                capability.name()
            );
            None
        }
        Err(_) => {
            warn!(
                "{operation}: capability '{}' timed out after {}ms, using baseline",
                capability.name(),
                timeout.as_millis()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::llm_client::DisabledCapability;

    #[tokio::test]
    async fn test_returns_value_on_success() {
        let cap = ScriptedCapability::replying("hello");
        let out = enhanced_or(&cap, Duration::from_secs(1), "test", || {
            cap.complete("p", "s")
        })
        .await;
        assert_eq!(out.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_unavailable_skips_the_call() {
        let cap = DisabledCapability;
        let mut called = false;
        let out: Option<()> = enhanced_or(&cap, Duration::from_secs(1), "test", || {
            called = true;
            async { Ok::<(), LlmError>(()) }
        })
        .await;
        assert!(out.is_none());
        assert!(!called);
    }

    #[tokio::test]
    async fn test_error_becomes_none() {
        let cap = ScriptedCapability::failing("boom");
        let out = enhanced_or(&cap, Duration::from_secs(1), "test", || {
            cap.complete("p", "s")
        })
        .await;
        assert!(out.is_none());
        assert_eq!(cap.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_none() {
        let cap = ScriptedCapability::replying("late").with_delay(Duration::from_secs(30));
        let out = enhanced_or(&cap, Duration::from_secs(1), "test", || {
            cap.complete("p", "s")
        })
        .await;
        assert!(out.is_none());
    }
}
