//! C9 — External LLM Bridge.
//!
//! Pure contract: given `(month, recent events, market context)`, return a
//! short narrative string within a bounded time. The pipeline must
//! proceed on timeout or error using a deterministic fallback (§4.9) —
//! this is the only place the core speaks to external AI, and it is
//! never on a critical correctness path.
//!
//! The teacher carries no equivalent (`aerugo-SimCash` never calls out to
//! an external service); grounded instead in `brbtavares-tucano`'s
//! `reqwest`-based external API clients, generalized to a typed trait
//! behind which a `NullBridge` (default, no credentials configured) and
//! an `HttpBridge` (timeout-wrapped `reqwest` POST) both live.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRequest {
    pub month: u64,
    pub recent_events: Vec<String>,
    pub market_summary: String,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("narrative bridge request timed out")]
    Timeout,
    #[error("narrative bridge transport error: {0}")]
    Transport(String),
    #[error("narrative bridge is not configured")]
    NotConfigured,
}

/// Behind this trait: the only place the core ever speaks to external AI
/// (§4.9). Implementations must never panic and must return promptly —
/// callers are expected to wrap the call in a hard timeout regardless of
/// what the implementation does internally.
#[async_trait]
pub trait NarrativeBridge: Send + Sync {
    async fn summarize(&self, request: NarrativeRequest) -> Result<String, BridgeError>;
}

/// Default bridge when no API key is configured. Always reports
/// `NotConfigured`, which callers fold into the deterministic fallback
/// narrative — ticks are fully functional without it (§9).
pub struct NullBridge;

#[async_trait]
impl NarrativeBridge for NullBridge {
    async fn summarize(&self, _request: NarrativeRequest) -> Result<String, BridgeError> {
        Err(BridgeError::NotConfigured)
    }
}

/// Thin, generically-shaped POST-JSON-get-string client. Deliberately
/// does not encode any particular vendor's wire format or prompt
/// construction — the chat/LLM façade itself is an external collaborator
/// (§1); this type only exists so the pipeline has somewhere to send the
/// request when an endpoint and key are configured.
pub struct HttpBridge {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpBridge {
    pub fn new(endpoint: String, api_key: String, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl NarrativeBridge for HttpBridge {
    async fn summarize(&self, request: NarrativeRequest) -> Result<String, BridgeError> {
        let send = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| BridgeError::Timeout)?
            .map_err(|err| BridgeError::Transport(err.to_string()))?;

        let body: serde_json::Value = tokio::time::timeout(self.timeout, response.json())
            .await
            .map_err(|_| BridgeError::Timeout)?
            .map_err(|err| BridgeError::Transport(err.to_string()))?;

        body.get("summary")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| BridgeError::Transport("response missing 'summary' field".to_string()))
    }
}

/// Run the bridge with a hard outer timeout and fold any failure into
/// `fallback` (§4.7 step 7, §4.9). The tick pipeline never observes a
/// `BridgeError` — narrative generation cannot fail a tick.
pub async fn summarize_with_fallback(
    bridge: &dyn NarrativeBridge,
    request: NarrativeRequest,
    fallback: String,
    hard_timeout: Duration,
) -> String {
    match tokio::time::timeout(hard_timeout, bridge.summarize(request)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(_)) | Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_bridge_falls_back() {
        let bridge = NullBridge;
        let summary = summarize_with_fallback(
            &bridge,
            NarrativeRequest {
                month: 3,
                recent_events: vec![],
                market_summary: "stable".to_string(),
            },
            "Month 3 saw 0 notable events in the network.".to_string(),
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(summary, "Month 3 saw 0 notable events in the network.");
    }
}
