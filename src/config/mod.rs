use std::env;
use std::fmt;
use std::time::Duration;

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub research: ResearchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("PROSPECT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let research = ResearchConfig {
            analysis: AnalysisConfig {
                base_url: env_or("PROSPECT_ANALYSIS_URL", "http://127.0.0.1:8601"),
                api_key: env::var("PROSPECT_ANALYSIS_KEY").ok(),
                model: env_or("PROSPECT_ANALYSIS_MODEL", "research-large"),
                max_output_tokens: parse_var("PROSPECT_ANALYSIS_MAX_TOKENS", 2048)?,
            },
            search: EndpointConfig {
                base_url: env_or("PROSPECT_SEARCH_URL", "http://127.0.0.1:8602"),
                api_key: env::var("PROSPECT_SEARCH_KEY").ok(),
            },
            scrape: EndpointConfig {
                base_url: env_or("PROSPECT_SCRAPE_URL", "http://127.0.0.1:8603"),
                api_key: env::var("PROSPECT_SCRAPE_KEY").ok(),
            },
            knowledge: KnowledgeConfig {
                command: env::var("PROSPECT_KNOWLEDGE_CMD").ok(),
                args: env::var("PROSPECT_KNOWLEDGE_ARGS")
                    .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                fallback_url: env_or("PROSPECT_KNOWLEDGE_URL", "http://127.0.0.1:8604/query"),
                handshake_timeout: Duration::from_secs(parse_var(
                    "PROSPECT_KNOWLEDGE_HANDSHAKE_SECS",
                    30,
                )?),
            },
            request_timeout: Duration::from_secs(parse_var("PROSPECT_REQUEST_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            telemetry: TelemetryConfig { log_level },
            research,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Endpoints, credentials, and timeouts for the research providers.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub analysis: AnalysisConfig,
    pub search: EndpointConfig,
    pub scrape: EndpointConfig,
    pub knowledge: KnowledgeConfig,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Settings for the two-tier semantic-store gateway: an optional long-lived
/// child process plus the stateless HTTP fallback.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub fallback_url: String,
    pub handshake_timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative number, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
