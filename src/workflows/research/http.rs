use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ResearchConfig;

use super::prompts::truncate;
use super::providers::{
    AnalysisOutcome, AnalysisProvider, AnalysisRequest, KnowledgeProvider, KnowledgeResults,
    ProviderError, ScrapeOptions, ScrapeProvider, ScrapedPage, SearchHit, SearchProvider,
    SearchResults, TokenUsage,
};

const USER_AGENT: &str = concat!("prospect-ai/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ProviderError::from)
}

/// Maps non-success statuses to a typed error with a trimmed body preview.
async fn check_response(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        service,
        status: status.as_u16(),
        message: truncate(&message, 300),
    })
}

/// Generative-text gateway. The endpoint shape is vendor-neutral: prompt in,
/// text plus token usage out.
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_output_tokens: u32,
}

impl HttpAnalysisClient {
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            base_url: config.analysis.base_url.trim_end_matches('/').to_string(),
            api_key: config.analysis.api_key.clone(),
            model: config.analysis.model.clone(),
            max_output_tokens: config.analysis.max_output_tokens,
        })
    }
}

#[derive(Serialize)]
struct AnalyzeBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct AnalyzeWire {
    text: String,
    #[serde(default)]
    usage: UsageWire,
}

#[derive(Deserialize, Default)]
struct UsageWire {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        let body = AnalyzeBody {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            max_tokens: request.max_tokens.min(self.max_output_tokens),
        };

        let mut call = self.http.post(format!("{}/analyze", self.base_url)).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = check_response("analysis", call.send().await?).await?;
        let wire: AnalyzeWire = response.json().await?;
        Ok(AnalysisOutcome {
            text: wire.text,
            usage: TokenUsage {
                input_tokens: wire.usage.input_tokens,
                output_tokens: wire.usage.output_tokens,
            },
        })
    }
}

/// Web-search gateway: `GET {base}/search?q=…&limit=…`.
pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            base_url: config.search.base_url.trim_end_matches('/').to_string(),
            api_key: config.search.api_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct SearchWire {
    #[serde(default)]
    data: Vec<SearchHitWire>,
}

#[derive(Deserialize)]
struct SearchHitWire {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for HttpSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults, ProviderError> {
        let url = format!(
            "{}/search?q={}&limit={limit}",
            self.base_url,
            urlencoding::encode(query)
        );

        let mut call = self.http.get(url);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = check_response("search", call.send().await?).await?;
        let wire: SearchWire = response.json().await?;
        Ok(SearchResults {
            data: wire
                .data
                .into_iter()
                .map(|hit| SearchHit {
                    url: hit.url,
                    title: hit.title,
                    description: hit.description,
                })
                .collect(),
        })
    }
}

/// Web-scrape gateway: `POST {base}/scrape`.
pub struct HttpScrapeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpScrapeClient {
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            base_url: config.scrape.base_url.trim_end_matches('/').to_string(),
            api_key: config.scrape.api_key.clone(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [String],
    only_main_content: bool,
}

#[derive(Deserialize)]
struct ScrapeWire {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    data: Option<ScrapeDataWire>,
}

#[derive(Deserialize)]
struct ScrapeDataWire {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl ScrapeWire {
    /// Providers differ on nesting; prefer top-level content, then the
    /// nested markdown/content fields. Missing everything is an empty page,
    /// which the caller treats as near-empty.
    fn flatten(self) -> String {
        if let Some(content) = self.content {
            return content;
        }
        if let Some(data) = self.data {
            if let Some(markdown) = data.markdown {
                return markdown;
            }
            if let Some(content) = data.content {
                return content;
            }
        }
        String::new()
    }
}

#[async_trait]
impl ScrapeProvider for HttpScrapeClient {
    async fn scrape(
        &self,
        url: &str,
        options: ScrapeOptions,
    ) -> Result<ScrapedPage, ProviderError> {
        let body = ScrapeBody {
            url,
            formats: &options.formats,
            only_main_content: options.only_main_content,
        };

        let mut call = self.http.post(format!("{}/scrape", self.base_url)).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = check_response("scrape", call.send().await?).await?;
        let wire: ScrapeWire = response.json().await?;
        Ok(ScrapedPage {
            content: wire.flatten(),
        })
    }
}

/// Stateless HTTP tier of the semantic store: `POST {url}` with the query.
pub struct HttpKnowledgeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpKnowledgeClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            endpoint: config.knowledge.fallback_url.clone(),
        })
    }
}

#[derive(Serialize)]
struct KnowledgeBody<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct KnowledgeWire {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[async_trait]
impl KnowledgeProvider for HttpKnowledgeClient {
    async fn query(&self, text: &str) -> Result<KnowledgeResults, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&KnowledgeBody { query: text })
            .send()
            .await?;
        let response = check_response("knowledge", response).await?;
        let wire: KnowledgeWire = response.json().await?;
        Ok(KnowledgeResults {
            results: wire.results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"{
        "data": [
            {"url": "https://acme.test", "title": "Acme Roofing", "description": "Commercial roofing"},
            {"url": "https://rival.test", "title": "Rival Co"}
        ]
    }"#;

    const SCRAPE_NESTED_FIXTURE: &str = r##"{
        "data": {"markdown": "# Acme Roofing\nFamily owned since 1998."}
    }"##;

    const ANALYZE_FIXTURE: &str = r#"{
        "text": "{\"description\": \"Commercial roofer\"}",
        "usage": {"input_tokens": 812, "output_tokens": 64}
    }"#;

    #[test]
    fn search_wire_tolerates_missing_description() {
        let wire: SearchWire = serde_json::from_str(SEARCH_FIXTURE).expect("fixture parses");
        assert_eq!(wire.data.len(), 2);
        assert_eq!(wire.data[1].description, "");
    }

    #[test]
    fn scrape_wire_prefers_top_level_then_nested_markdown() {
        let nested: ScrapeWire =
            serde_json::from_str(SCRAPE_NESTED_FIXTURE).expect("fixture parses");
        assert_eq!(nested.flatten(), "# Acme Roofing\nFamily owned since 1998.");

        let top: ScrapeWire =
            serde_json::from_str(r#"{"content": "plain", "data": {"markdown": "ignored"}}"#)
                .expect("fixture parses");
        assert_eq!(top.flatten(), "plain");

        let empty: ScrapeWire = serde_json::from_str("{}").expect("fixture parses");
        assert_eq!(empty.flatten(), "");
    }

    #[test]
    fn analyze_wire_carries_usage() {
        let wire: AnalyzeWire = serde_json::from_str(ANALYZE_FIXTURE).expect("fixture parses");
        assert_eq!(wire.usage.input_tokens, 812);
        assert_eq!(wire.usage.output_tokens, 64);
        assert!(wire.text.contains("Commercial roofer"));
    }

    #[test]
    fn analyze_wire_defaults_usage_when_absent() {
        let wire: AnalyzeWire =
            serde_json::from_str(r#"{"text": "hello"}"#).expect("fixture parses");
        assert_eq!(wire.usage.input_tokens, 0);
    }

    #[test]
    fn knowledge_wire_defaults_to_empty_results() {
        let wire: KnowledgeWire = serde_json::from_str("{}").expect("fixture parses");
        assert!(wire.results.is_empty());
    }
}
