use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{OracleRequest, RankingOracle};
use super::RecommendationError;
use crate::config::RankingConfig;

/// Upstream error bodies are truncated to this many characters in errors and logs.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Connect timeout; the overall request timeout comes from `RankingConfig`.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ranking oracle backed by an OpenAI-compatible chat completions gateway.
///
/// Holds configuration only; a blocking HTTP client is built per call,
/// so `rank` must run off the async runtime (e.g. in `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct GatewayRankingClient {
    config: RankingConfig,
}

impl GatewayRankingClient {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, RecommendationError> {
        reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| RecommendationError::Internal(format!("HTTP client setup failed: {e}")))
    }
}

/// Request body for `POST /v1/chat/completions`
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from `POST /v1/chat/completions`
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl RankingOracle for GatewayRankingClient {
    fn rank(&self, request: &OracleRequest) -> Result<String, RecommendationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(unconfigured)?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .http_client()?
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    format!("request timed out after {}s", self.config.timeout.as_secs())
                } else if e.is_connect() {
                    format!("cannot reach ranking service at {}", self.config.api_url)
                } else {
                    e.to_string()
                };
                RecommendationError::Upstream {
                    status: None,
                    detail,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            tracing::error!(status = status.as_u16(), body = %detail, "Ranking service returned error");
            return Err(RecommendationError::Upstream {
                status: Some(status.as_u16()),
                detail,
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().map_err(|e| RecommendationError::Upstream {
                status: Some(status.as_u16()),
                detail: format!("undecodable response body: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| RecommendationError::Upstream {
                status: Some(status.as_u16()),
                detail: "response missing choices[0].message.content".into(),
            })
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

fn unconfigured() -> RecommendationError {
    RecommendationError::Configuration("RANKING_API_KEY is not configured".into())
}

/// Scripted reply for `MockRankingOracle`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Upstream { status: Option<u16>, detail: String },
    Unconfigured,
}

/// Mock ranking oracle for testing. Returns a configurable reply,
/// optionally delayed when the prompt contains a marker.
pub struct MockRankingOracle {
    reply: MockReply,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<OracleRequest>>,
}

impl MockRankingOracle {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn text(response: &str) -> Self {
        Self::new(MockReply::Text(response.to_string()))
    }

    /// Sleep for `delay` whenever the prompt contains `marker`.
    pub fn with_delay_for(mut self, marker: &str, delay: Duration) -> Self {
        self.delays.insert(marker.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<OracleRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl RankingOracle for MockRankingOracle {
    fn rank(&self, request: &OracleRequest) -> Result<String, RecommendationError> {
        if !self.is_configured() {
            return Err(unconfigured());
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let delay = self
            .delays
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Upstream { status, detail } => Err(RecommendationError::Upstream {
                status: *status,
                detail: detail.clone(),
            }),
            MockReply::Unconfigured => Err(unconfigured()),
        }
    }

    fn is_configured(&self) -> bool {
        !matches!(self.reply, MockReply::Unconfigured)
    }
}
