use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::workflows::assessment::{
    AdminHoursBucket, AssessmentInput, CrewSizeBracket, DecisionTimeline, TradeCategory,
};
use crate::workflows::research::{
    AnalysisOutcome, AnalysisProvider, AnalysisRequest, KnowledgeProvider, KnowledgeResults,
    ProviderError, ResearchPipeline, ScrapeOptions, ScrapeProvider, ScrapedPage, SearchHit,
    SearchProvider, SearchResults, TokenUsage,
};

pub(super) fn intake() -> AssessmentInput {
    AssessmentInput {
        company_name: "Summit Roofing".to_string(),
        website: None,
        contact_email: Some("ops@summitroofing.test".to_string()),
        trade: TradeCategory::Roofing,
        crew_size: CrewSizeBracket::TwentyToFortyNine,
        pain_points: vec![
            "scheduling conflicts".to_string(),
            "change order tracking".to_string(),
        ],
        urgency: 7,
        admin_hours: AdminHoursBucket::TenToTwenty,
        current_tools: vec!["Excel".to_string(), "QuickBooks".to_string()],
        timeline: DecisionTimeline::WithinQuarter,
        purchase_likelihood: 8,
        competitors: vec!["BuilderTrend".to_string()],
    }
}

pub(super) fn hits() -> Vec<SearchHit> {
    vec![
        SearchHit {
            url: "https://summitroofing.test".to_string(),
            title: "Summit Roofing".to_string(),
            description: "Commercial roofing in Des Moines since 1998".to_string(),
        },
        SearchHit {
            url: "https://rival-roofing.test".to_string(),
            title: "Rival Roofing".to_string(),
            description: "Roofing across Iowa".to_string(),
        },
    ]
}

pub(super) fn page_content() -> String {
    "Summit Roofing installs and repairs commercial TPO and metal roofs across central Iowa. "
        .repeat(6)
}

pub(super) const BASIC_INFO_REPLY: &str = r#"{
    "description": "Commercial roofing contractor serving central Iowa",
    "services": ["TPO roofing", "Metal roofing"],
    "location": "Des Moines, IA",
    "yearsInBusiness": "25",
    "sizeEstimate": "about 40 in the field"
}"#;

pub(super) const WEBSITE_REPLY: &str = r#"{
    "technologies": ["QuickBooks"],
    "services": ["Commercial roofing", "Roof repair"],
    "valuePropositions": ["24-hour emergency service"],
    "painPoints": ["Paper-based job tracking"],
    "companyHistory": {"founded": "1998", "milestones": ["Second crew added 2008"], "ownership": "family"}
}"#;

pub(super) const COMPETITOR_REPLY: &str = r#"{
    "competitors": [
        {"name": "Rival Roofing", "url": "https://rival-roofing.test",
         "positioning": "volume residential work", "strengths": ["brand"], "weaknesses": ["no commercial crews"]}
    ],
    "positioningSummary": "Commercial focus differentiates Summit from volume residential rivals."
}"#;

pub(super) const INDUSTRY_REPLY: &str = r#"{
    "trends": ["Labor shortage pushing automation"],
    "challenges": ["Material cost volatility"],
    "opportunities": ["Service agreements"],
    "marketSize": "$56B US roofing"
}"#;

pub(super) const TOOLING_REPLY: &str = r#"{
    "tools": [
        {"name": "Excel", "category": "spreadsheet", "limitations": ["no field access"]},
        {"name": "QuickBooks", "category": "accounting", "limitations": ["no job costing detail"]}
    ],
    "gaps": ["scheduling", "field-to-office sync"],
    "switchingConsiderations": ["data migration from spreadsheets"]
}"#;

pub(super) const KNOWLEDGE_REPLY: &str = r#"{
    "similarCustomers": ["Peak Plumbing"],
    "caseStudies": ["Peak Plumbing cut invoicing time 60%"],
    "insights": [{"insight": "Roofing crews adopt mobile tools fastest", "source": "case-study-17"}]
}"#;

pub(super) const SALES_REPLY: &str = r#"{
    "talkingPoints": [{"point": "They lose two days a month to scheduling conflicts", "source": "intake form"}],
    "objections": [{"objection": "Too busy to switch", "response": "Onboarding runs alongside current jobs", "source": "case-study-17"}],
    "competitiveAdvantages": [{"point": "Rival Roofing has no commercial crews", "source": "competitor research"}],
    "buyingSignals": [{"point": "Decision expected within the quarter", "source": "intake form"}],
    "risks": [{"point": "Spreadsheet habits run deep", "source": "website"}],
    "keyContacts": [{"name": null, "role": "Operations Manager", "rationale": "owns scheduling", "decisionMaker": true}]
}"#;

/// Analysis double that routes on a prompt fragment, so replies stay
/// correct regardless of how the parallel tasks interleave.
pub(super) struct RoutedAnalysis {
    routes: Vec<(&'static str, String)>,
    prompts: Mutex<Vec<String>>,
}

impl RoutedAnalysis {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, marker: &'static str, reply: &str) -> Self {
        self.routes.push((marker, reply.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl AnalysisProvider for RoutedAnalysis {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(request.prompt.clone());
        for (marker, reply) in &self.routes {
            if request.prompt.contains(marker) {
                return Ok(AnalysisOutcome {
                    text: reply.clone(),
                    usage: TokenUsage {
                        input_tokens: 100,
                        output_tokens: 50,
                    },
                });
            }
        }
        Err(ProviderError::Connection("no scripted reply".to_string()))
    }
}

/// Routes for every call the full pipeline makes. Markers quote the prompt
/// builders.
pub(super) fn routed_analysis() -> RoutedAnalysis {
    RoutedAnalysis::new()
        .route("Extract basic company facts", BASIC_INFO_REPLY)
        .route("Analyze the website content", WEBSITE_REPLY)
        .route("Profile the competitors", COMPETITOR_REPLY)
        .route("Summarize the current state", INDUSTRY_REPLY)
        .route("currently runs their operation", TOOLING_REPLY)
        .route("knowledge-base records", KNOWLEDGE_REPLY)
        .route("Produce sales intelligence", SALES_REPLY)
}

pub(super) struct FailingAnalysis;

#[async_trait]
impl AnalysisProvider for FailingAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        Err(ProviderError::Connection("analysis endpoint down".to_string()))
    }
}

/// Never answers within a test's lifetime; used to hold a run in flight.
pub(super) struct SlowAnalysis;

#[async_trait]
impl AnalysisProvider for SlowAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Err(ProviderError::Connection("never answers".to_string()))
    }
}

pub(super) struct StaticSearch {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_hits(Vec::new())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults, ProviderError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());
        Ok(SearchResults {
            data: self.hits.iter().take(limit).cloned().collect(),
        })
    }
}

pub(super) struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<SearchResults, ProviderError> {
        Err(ProviderError::Connection("search endpoint down".to_string()))
    }
}

pub(super) struct StaticScrape {
    pub content: String,
}

#[async_trait]
impl ScrapeProvider for StaticScrape {
    async fn scrape(
        &self,
        _url: &str,
        _options: ScrapeOptions,
    ) -> Result<ScrapedPage, ProviderError> {
        Ok(ScrapedPage {
            content: self.content.clone(),
        })
    }
}

/// Returns thin content with the main-content filter on and substantial
/// content without it, to exercise the full-page retry.
pub(super) struct FilterSensitiveScrape {
    pub filtered: String,
    pub full: String,
}

#[async_trait]
impl ScrapeProvider for FilterSensitiveScrape {
    async fn scrape(
        &self,
        _url: &str,
        options: ScrapeOptions,
    ) -> Result<ScrapedPage, ProviderError> {
        let content = if options.only_main_content {
            self.filtered.clone()
        } else {
            self.full.clone()
        };
        Ok(ScrapedPage { content })
    }
}

pub(super) struct StaticKnowledge {
    pub results: Vec<serde_json::Value>,
}

impl StaticKnowledge {
    pub fn with_case_study() -> Self {
        Self {
            results: vec![json!({
                "title": "case-study-17",
                "content": "Peak Plumbing cut invoicing time 60% after onboarding"
            })],
        }
    }
}

#[async_trait]
impl KnowledgeProvider for StaticKnowledge {
    async fn query(&self, _text: &str) -> Result<KnowledgeResults, ProviderError> {
        Ok(KnowledgeResults {
            results: self.results.clone(),
        })
    }
}

pub(super) struct FailingKnowledge;

#[async_trait]
impl KnowledgeProvider for FailingKnowledge {
    async fn query(&self, _text: &str) -> Result<KnowledgeResults, ProviderError> {
        Err(ProviderError::Connection("knowledge store down".to_string()))
    }
}

/// Pipeline with the fully scripted happy-path doubles.
pub(super) fn scripted_pipeline() -> (ResearchPipeline, Arc<RoutedAnalysis>, Arc<StaticSearch>) {
    let analysis = Arc::new(routed_analysis());
    let search = Arc::new(StaticSearch::with_hits(hits()));
    let pipeline = ResearchPipeline::new(
        analysis.clone(),
        search.clone(),
        Arc::new(StaticScrape {
            content: page_content(),
        }),
        Arc::new(StaticKnowledge::with_case_study()),
    );
    (pipeline, analysis, search)
}
