use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure of a single provider call. Expected at runtime; the orchestrator
/// converts these into degraded fields, never into a panic or an abort of
/// sibling work.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("http transport failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned status {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("connection failure: {0}")]
    Connection(String),
    #[error("handshake did not complete within {0:?}")]
    HandshakeTimeout(std::time::Duration),
    #[error("response payload malformed: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True when the failure means the service could not be reached at all,
    /// as opposed to reaching it and disliking the answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Http(_)
                | ProviderError::Connection(_)
                | ProviderError::HandshakeTimeout(_)
        )
    }
}

const DEFAULT_MAX_TOKENS: u32 = 2048;

/// One generative-text call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
}

impl AnalysisRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub text: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub data: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeOptions {
    pub formats: Vec<String>,
    pub only_main_content: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: vec!["markdown".to_string()],
            only_main_content: true,
        }
    }
}

impl ScrapeOptions {
    /// Variant used on the near-empty retry: whole page, no filtering.
    pub fn full_page() -> Self {
        Self {
            only_main_content: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub content: String,
}

/// Raw hits from the semantic store; shape is provider-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeResults {
    pub results: Vec<serde_json::Value>,
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults, ProviderError>;
}

#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn scrape(&self, url: &str, options: ScrapeOptions)
        -> Result<ScrapedPage, ProviderError>;
}

#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    async fn query(&self, text: &str) -> Result<KnowledgeResults, ProviderError>;
}

/// Outcome of one research source. Unavailability is a value here, not an
/// error: the partial-failure policy is enforced by this type rather than by
/// scattered catch blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Ok(T),
    Degraded { reason: String },
}

impl<T> Sourced<T> {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Sourced::Degraded {
            reason: reason.into(),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Sourced::Ok(value) => Some(value),
            Sourced::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Sourced::Degraded { .. })
    }
}
