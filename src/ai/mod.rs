// src/ai/mod.rs - Client for the external AI classification service
use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::models::{Classification, ClassificationResult, ProcessingTier};

const BASE_TIMEOUT_SECS: u64 = 30;
const EXTENDED_TIMEOUT_SECS: u64 = 60;

/// Confidence assigned to padded fallback entries when the service returns
/// fewer results than names sent.
const PAD_CONFIDENCE: u8 = 51;

#[derive(Debug, Serialize)]
struct AiRequest<'a> {
    names: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AiResponse {
    results: Vec<AiResponseItem>,
}

#[derive(Debug, Deserialize)]
struct AiResponseItem {
    #[allow(dead_code)]
    name: String,
    classification: String,
    confidence: f64,
    reasoning: String,
}

/// Connection settings for the AI collaborator, environment-driven. An
/// unset endpoint means the service is unavailable and tier 5 behaves as
/// offline.
#[derive(Debug, Clone, Default)]
pub struct AiServiceConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl AiServiceConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("PAYEE_AI_ENDPOINT").ok().filter(|s| !s.is_empty()),
            api_key: env::var("PAYEE_AI_API_KEY").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Batched client for the AI classification contract: an ordered name list
/// goes out, a parallel result list comes back. Timeouts lengthen after
/// failures or rate limiting; authentication failures are never retried.
pub struct AiClassificationClient {
    http: reqwest::Client,
    config: AiServiceConfig,
    consecutive_failures: AtomicU32,
}

impl AiClassificationClient {
    pub fn new(config: AiServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn current_timeout(&self) -> Duration {
        if self.consecutive_failures.load(Ordering::Relaxed) > 0 {
            Duration::from_secs(EXTENDED_TIMEOUT_SECS)
        } else {
            Duration::from_secs(BASE_TIMEOUT_SECS)
        }
    }

    /// Classify a batch of names. Returns one result per input name, padding
    /// with low-confidence fallbacks if the service answers short. Errors
    /// are returned to the caller (the escalation policy), which absorbs
    /// them into degraded lower-tier results.
    pub async fn classify_batch(&self, names: &[String]) -> Result<Vec<ClassificationResult>> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("AI service endpoint not configured"))?;

        match self.send(endpoint, names, self.current_timeout()).await {
            Ok(results) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                Ok(results)
            }
            Err(error) if is_auth_failure(&error) => {
                // Retrying a bad credential only burns rate limit.
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                Err(error.context("AI authentication failed; not retrying"))
            }
            Err(error) => {
                warn!("AI call failed ({}); retrying with extended timeout", error);
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                let retry = self
                    .send(endpoint, names, Duration::from_secs(EXTENDED_TIMEOUT_SECS))
                    .await;
                match retry {
                    Ok(results) => {
                        self.consecutive_failures.store(0, Ordering::Relaxed);
                        Ok(results)
                    }
                    Err(retry_error) => {
                        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                        Err(retry_error.context("AI call failed after retry"))
                    }
                }
            }
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        names: &[String],
        timeout: Duration,
    ) -> Result<Vec<ClassificationResult>> {
        let mut request = self
            .http
            .post(endpoint)
            .timeout(timeout)
            .json(&AiRequest { names });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("AI request failed")?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(anyhow!("auth failure: HTTP {}", status));
        }
        if !status.is_success() {
            return Err(anyhow!("AI service returned HTTP {}", status));
        }

        let body: AiResponse = response
            .json()
            .await
            .context("malformed AI response body")?;
        info!(
            "AI service classified {}/{} names",
            body.results.len(),
            names.len()
        );
        Ok(decode_response(names, body.results))
    }
}

/// Map the wire response onto one result per requested name, padding short
/// responses with low-confidence fallbacks. Pure so the contract is
/// testable without HTTP.
fn decode_response(names: &[String], items: Vec<AiResponseItem>) -> Vec<ClassificationResult> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| match items.get(i) {
            Some(item) => ClassificationResult {
                classification: parse_classification(&item.classification),
                confidence: item.confidence.clamp(0.0, 100.0).round() as u8,
                reasoning: item.reasoning.clone(),
                tier: ProcessingTier::AiAssisted,
                matching_rules: vec!["ai_classification".to_string()],
            },
            None => {
                warn!("AI response short; padding fallback for '{}'", name);
                ClassificationResult {
                    classification: Classification::Individual,
                    confidence: PAD_CONFIDENCE,
                    reasoning: "AI response incomplete; low-confidence fallback".to_string(),
                    tier: ProcessingTier::AiAssisted,
                    matching_rules: vec!["ai_response_padded".to_string()],
                }
            }
        })
        .collect()
}

fn parse_classification(value: &str) -> Classification {
    if value.trim().eq_ignore_ascii_case("business") {
        Classification::Business
    } else {
        Classification::Individual
    }
}

fn is_auth_failure(error: &anyhow::Error) -> bool {
    error.to_string().contains("auth failure")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(classification: &str, confidence: f64) -> AiResponseItem {
        AiResponseItem {
            name: "x".to_string(),
            classification: classification.to_string(),
            confidence,
            reasoning: "model says so".to_string(),
        }
    }

    #[test]
    fn test_decode_parallel_response() {
        let names = vec!["Acme Inc".to_string(), "Jane Doe".to_string()];
        let decoded = decode_response(
            &names,
            vec![item("Business", 92.0), item("individual", 88.0)],
        );
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].classification, Classification::Business);
        assert_eq!(decoded[1].classification, Classification::Individual);
        assert_eq!(decoded[0].confidence, 92);
        assert_eq!(decoded[0].tier, ProcessingTier::AiAssisted);
    }

    #[test]
    fn test_short_response_is_padded() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let decoded = decode_response(&names, vec![item("Business", 90.0)]);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[1].confidence, PAD_CONFIDENCE);
        assert!(decoded[2]
            .matching_rules
            .contains(&"ai_response_padded".to_string()));
    }

    #[test]
    fn test_confidence_clamped() {
        let names = vec!["A".to_string()];
        let decoded = decode_response(&names, vec![item("Business", 250.0)]);
        assert_eq!(decoded[0].confidence, 100);
    }

    #[test]
    fn test_unknown_label_defaults_individual() {
        let names = vec!["A".to_string()];
        let decoded = decode_response(&names, vec![item("corporation?", 70.0)]);
        assert_eq!(decoded[0].classification, Classification::Individual);
    }

    #[test]
    fn test_unconfigured_client() {
        let client = AiClassificationClient::new(AiServiceConfig::default());
        assert!(!client.is_configured());
    }

    #[test]
    fn test_auth_failure_detection() {
        let error = anyhow!("auth failure: HTTP 401");
        assert!(is_auth_failure(&error));
        assert!(!is_auth_failure(&anyhow!("HTTP 500")));
    }
}
