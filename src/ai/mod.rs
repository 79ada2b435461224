pub mod cache;
pub mod client;
pub mod content;
pub mod keypool;
pub mod queue;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use cache::ResponseCache;
use client::{AiClient, AiError};
use keypool::KeyPool;
use queue::{AdmissionError, AdmissionQueue};

const CACHE_TTL: Duration = Duration::from_secs(10 * 60);
const CACHE_MAX_ENTRIES: usize = 1000;
const MAX_CONCURRENT_TASKS: usize = 64;
const MAX_QUEUED_TASKS: usize = 1024;
const TASK_TIMEOUT: Duration = Duration::from_secs(120);

/// The business brief driving a generation request. Its fields are also
/// the cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub company_name: String,
    pub industry: String,
    pub description: String,
    /// "english" or "vietnamese".
    #[serde(default = "default_language")]
    pub language: String,
    pub target_audience: Option<String>,
    pub services: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_language() -> String {
    "vietnamese".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

/// Progress of one generation request, streamed to the client over SSE.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started,
    CacheHit,
    Queued { queue_stats: queue::QueueStats },
    Processing { task_id: String, priority: u32 },
    Generating,
    AiCompleted { processing_time_ms: u64 },
    /// Terminal frame carrying the merged result; sent by the routes.
    Completed { data: GenerationOutcome, total_time_ms: u64 },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub theme_params: serde_json::Value,
    pub generated_data: serde_json::Value,
    pub response_time_ms: u64,
    pub cached: bool,
}

/// Single-process generation front end: TTL cache over a priority
/// admission queue over a rotating credential pool.
pub struct GenerationService {
    cache: ResponseCache,
    queue: AdmissionQueue,
    keys: KeyPool,
    client: AiClient,
}

impl GenerationService {
    pub fn new(api_keys: Vec<String>, model: &str) -> Self {
        Self {
            cache: ResponseCache::new(CACHE_TTL, CACHE_MAX_ENTRIES),
            queue: AdmissionQueue::new(MAX_CONCURRENT_TASKS, MAX_QUEUED_TASKS, TASK_TIMEOUT),
            keys: KeyPool::new(api_keys),
            client: AiClient::new(model),
        }
    }

    pub fn queue_stats(&self) -> queue::QueueStats {
        self.queue.stats()
    }

    pub fn cache_stats(&self) -> cache::CacheStats {
        self.cache.stats()
    }

    /// Maintenance sweep hook.
    pub fn cleanup(&self) {
        self.cache.cleanup();
        self.keys.reset_expired_parks();
    }

    /// Run one generation request. Emits progress on `events` when given;
    /// both the blocking JSON route and the SSE route share this path.
    pub async fn generate(
        &self,
        info: &BusinessInfo,
        current_theme: &serde_json::Value,
        events: Option<&mpsc::Sender<ProgressEvent>>,
    ) -> Result<GenerationOutcome, String> {
        let emit = |event: ProgressEvent| {
            if let Some(tx) = events {
                let _ = tx.try_send(event);
            }
        };

        emit(ProgressEvent::Started);

        let key = cache_key(info);
        if let Some(cached) = self.cache.get(&key) {
            emit(ProgressEvent::CacheHit);
            let theme_params = content::prepare_theme_params(&cached, current_theme);
            return Ok(GenerationOutcome {
                theme_params,
                generated_data: cached,
                response_time_ms: 0,
                cached: true,
            });
        }

        emit(ProgressEvent::Queued {
            queue_stats: self.queue.stats(),
        });

        let priority = calculate_priority(info);
        emit(ProgressEvent::Processing {
            task_id: key.clone(),
            priority,
        });

        let result = self
            .queue
            .run(&key, priority, async {
                emit(ProgressEvent::Generating);
                self.call_with_key_rotation(info).await
            })
            .await;

        let (generated, response_time_ms) = match result {
            Ok(ok) => ok,
            Err(AdmissionError::Timeout) => {
                let message = "Generation timed out".to_string();
                emit(ProgressEvent::Error {
                    message: message.clone(),
                });
                return Err(message);
            }
            Err(err) => {
                let message = err.to_string();
                emit(ProgressEvent::Error {
                    message: message.clone(),
                });
                return Err(message);
            }
        };

        self.cache.set(key, generated.clone());
        emit(ProgressEvent::AiCompleted {
            processing_time_ms: response_time_ms,
        });

        let theme_params = content::prepare_theme_params(&generated, current_theme);
        Ok(GenerationOutcome {
            theme_params,
            generated_data: generated,
            response_time_ms,
            cached: false,
        })
    }

    /// Call the provider with the best key, falling through the remaining
    /// credentials on failure. Quota errors park the key in the pool.
    async fn call_with_key_rotation(
        &self,
        info: &BusinessInfo,
    ) -> Result<(serde_json::Value, u64), String> {
        let prompt = content::build_prompt(info);

        let first = self.keys.select_best().map_err(|e| e.to_string())?;
        let mut candidates = vec![first.clone()];
        candidates.extend(self.keys.fallback_keys(&first));

        let mut last_error = String::new();
        for api_key in candidates {
            match self.client.generate(&prompt, &api_key).await {
                Ok(response) => {
                    self.keys.record_success(&api_key, response.response_time_ms);
                    let generated = content::parse_generated(&response.text, info);
                    return Ok((generated, response.response_time_ms));
                }
                Err(err) => {
                    self.keys.record_failure(&api_key, err.is_quota());
                    tracing::warn!("Generation failed on one credential: {err}");
                    last_error = err.to_string();
                    if matches!(err, AiError::Timeout) {
                        // The task deadline is close; do not burn it on
                        // another full-length attempt.
                        break;
                    }
                }
            }
        }

        Err(if last_error.is_empty() {
            "No generation credentials available".to_string()
        } else {
            last_error
        })
    }
}

/// Deterministic sha-256 cache key over the brief's fields.
pub fn cache_key(info: &BusinessInfo) -> String {
    let canonical = serde_json::json!({
        "companyName": info.company_name,
        "industry": info.industry,
        "description": info.description,
        "language": info.language,
        "services": info.services,
        "targetAudience": info.target_audience,
        "tone": info.tone,
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())[..32].to_string()
}

/// Admission priority in [0, 1000]; deterministic for a given brief.
pub fn calculate_priority(info: &BusinessInfo) -> u32 {
    let mut priority: u32 = 500;

    if info.industry.to_lowercase().contains("urgent") {
        priority += 300;
    }
    if info.language == "english" {
        priority += 100;
    }
    if info.company_name.len() > 20 {
        priority += 100;
    }

    priority.min(1000)
}
