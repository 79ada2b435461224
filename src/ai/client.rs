use std::time::{Duration, Instant};

use serde_json::json;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    /// Provider returned 503 / reported itself overloaded.
    ServiceUnavailable,
    /// Provider returned 429 / quota exhausted for this key.
    QuotaExceeded,
    Timeout,
    Other(String),
}

impl AiError {
    pub fn is_quota(&self) -> bool {
        matches!(self, AiError::QuotaExceeded)
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::ServiceUnavailable => write!(f, "AI_SERVICE_UNAVAILABLE"),
            AiError::QuotaExceeded => write!(f, "QUOTA_EXCEEDED"),
            AiError::Timeout => write!(f, "AI_REQUEST_TIMEOUT"),
            AiError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiResponse {
    pub text: String,
    pub response_time_ms: u64,
}

/// Thin client for the generative-text REST API. One instance is shared;
/// the credential is supplied per call so the pool can rotate keys.
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl AiClient {
    pub fn new(model: &str) -> Self {
        Self::with_base_url(model, "https://generativelanguage.googleapis.com/v1beta")
    }

    pub fn with_base_url(model: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(GENERATE_TIMEOUT)
                .build()
                .expect("Failed to build AI client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// One generateContent call with retry and exponential backoff.
    /// Quota errors are returned immediately so the caller can rotate keys.
    pub async fn generate(&self, prompt: &str, api_key: &str) -> Result<AiResponse, AiError> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.generate_once(prompt, api_key).await {
                Ok(text) => {
                    return Ok(AiResponse {
                        text,
                        response_time_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        "AI request failed (attempt {attempt}/{MAX_ATTEMPTS}): {err}"
                    );
                    if err.is_quota() || attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(2u64.pow(attempt));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn generate_once(&self, prompt: &str, api_key: &str) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "maxOutputTokens": 8192,
                "temperature": 0.7,
                "topP": 0.9,
                "topK": 40,
            }
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Other(format!("AI request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AiError::QuotaExceeded);
        }
        if status.as_u16() == 503 {
            return Err(AiError::ServiceUnavailable);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            if detail.contains("quota") {
                return Err(AiError::QuotaExceeded);
            }
            if detail.contains("overloaded") || detail.contains("Service Unavailable") {
                return Err(AiError::ServiceUnavailable);
            }
            return Err(AiError::Other(format!(
                "AI request failed with status {status}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::Other(format!("Invalid AI response: {e}")))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AiError::Other("AI response contained no text".to_string()))
    }
}
