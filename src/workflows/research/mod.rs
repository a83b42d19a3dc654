//! Company research orchestrator.
//!
//! Runs a fixed sequence of stages over four external capability providers
//! and assembles a [`CompanyResearch`] bundle. Stages hand their outputs
//! forward; within the parallel stage four tasks run concurrently with
//! wait-for-all semantics. A failing source degrades its own field and
//! nothing else. The run as a whole fails only when the generative-analysis
//! service answered none of the calls made to it.

mod decode;
mod domain;
mod http;
mod knowledge;
mod parallel;
mod prompts;
mod providers;
mod recorder;
mod supervisor;
mod synthesis;
mod website;

#[cfg(test)]
mod tests;

pub use decode::{structured, Decoded};
pub use domain::{
    BasicCompanyInfo, CompanyHistory, CompanyResearch, CompetitorLandscape, CompetitorProfile,
    ContactGuess, IndustryInsights, KnowledgeIntelligence, ObjectionResponse, SalesIntelligence,
    SourcedInsight, SourcedPoint, ToolAssessment, ToolingAnalysis, WebsiteAnalysis,
};
pub use http::{HttpAnalysisClient, HttpKnowledgeClient, HttpScrapeClient, HttpSearchClient};
pub use knowledge::{KnowledgeGateway, ProcessKnowledgeTier, ProcessTierConfig};
pub use providers::{
    AnalysisOutcome, AnalysisProvider, AnalysisRequest, KnowledgeProvider, KnowledgeResults,
    ProviderError, ScrapeOptions, ScrapeProvider, ScrapedPage, SearchHit, SearchProvider,
    SearchResults, Sourced, TokenUsage,
};
pub use supervisor::{ResearchRun, ResearchSupervisor};

use std::sync::Arc;
use std::time::Instant;

use crate::audit::{AuditDetail, AuditEntry, AuditKind, AuditTrail};
use crate::citations::CitationTracker;
use crate::config::ResearchConfig;
use crate::workflows::assessment::AssessmentInput;

use recorder::{AnalysisMeter, TaskLog};

/// Pipeline stages in execution order. Reported through the progress
/// callback as each stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStage {
    WebsiteDiscovery,
    WebsiteScrape,
    ParallelResearch,
    SalesIntelligenceSynthesis,
    Complete,
}

impl ResearchStage {
    pub const fn ordered() -> [ResearchStage; 5] {
        [
            ResearchStage::WebsiteDiscovery,
            ResearchStage::WebsiteScrape,
            ResearchStage::ParallelResearch,
            ResearchStage::SalesIntelligenceSynthesis,
            ResearchStage::Complete,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ResearchStage::WebsiteDiscovery => "website_discovery",
            ResearchStage::WebsiteScrape => "website_scrape",
            ResearchStage::ParallelResearch => "parallel_research",
            ResearchStage::SalesIntelligenceSynthesis => "sales_intelligence_synthesis",
            ResearchStage::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchProgress {
    pub stage: ResearchStage,
    pub detail: String,
}

pub type ProgressCallback = dyn Fn(ResearchProgress) + Send + Sync;

/// Fatal research failure. Partial data never lands here; a run that got
/// even one generative answer returns `Ok` with degraded fields instead.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("analysis service unreachable: {attempts} generative calls made, none answered")]
    AnalysisUnavailable { attempts: u32 },
}

/// Orchestrates one research run per call. Stateless between runs, so a
/// single pipeline can be shared behind an `Arc` by concurrent callers.
pub struct ResearchPipeline {
    analysis: Arc<dyn AnalysisProvider>,
    search: Arc<dyn SearchProvider>,
    scrape: Arc<dyn ScrapeProvider>,
    knowledge: Arc<dyn KnowledgeProvider>,
}

impl ResearchPipeline {
    pub fn new(
        analysis: Arc<dyn AnalysisProvider>,
        search: Arc<dyn SearchProvider>,
        scrape: Arc<dyn ScrapeProvider>,
        knowledge: Arc<dyn KnowledgeProvider>,
    ) -> Self {
        Self {
            analysis,
            search,
            scrape,
            knowledge,
        }
    }

    /// Wires the HTTP providers and the two-tier knowledge gateway from
    /// configuration.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(
            Arc::new(HttpAnalysisClient::from_config(config)?),
            Arc::new(HttpSearchClient::from_config(config)?),
            Arc::new(HttpScrapeClient::from_config(config)?),
            Arc::new(KnowledgeGateway::from_config(config)?),
        ))
    }

    /// Runs the full research state machine for one prospect.
    ///
    /// Audit entries and citations accumulate into the caller-owned trail
    /// and tracker; on a fatal error the caller keeps the partial trail.
    /// The trail is finalized on both exits.
    pub async fn research(
        &self,
        input: &AssessmentInput,
        trail: &mut AuditTrail,
        citations: &mut CitationTracker,
        progress: Option<&ProgressCallback>,
    ) -> Result<CompanyResearch, ResearchError> {
        let meter = AnalysisMeter::default();
        let mut research = CompanyResearch::seeded_from(input);

        emit(
            progress,
            ResearchStage::WebsiteDiscovery,
            format!("locating website for {}", input.company_name),
        );
        let (discovery, log) = self.discover_website(input, &meter).await;
        log.flush(trail, citations);
        research.website = discovery.website;
        research.basic_info = discovery.basic_info;

        if let Some(website) = research.website.clone() {
            emit(
                progress,
                ResearchStage::WebsiteScrape,
                format!("reading {website}"),
            );
            let (analysis, log) = self.study_website(input, &website, &meter).await;
            log.flush(trail, citations);
            research.website_analysis = analysis.into_option();
        }

        emit(
            progress,
            ResearchStage::ParallelResearch,
            "competitors, industry, tooling, knowledge base",
        );
        let ((competitors, competitor_log), (industry, industry_log), (tooling, tooling_log), (knowledge, knowledge_log)) = tokio::join!(
            self.research_competitors(input, &meter),
            self.research_industry(input, &meter),
            self.research_tooling(input, &meter),
            self.research_knowledge(input, &meter),
        );
        competitor_log.flush(trail, citations);
        industry_log.flush(trail, citations);
        tooling_log.flush(trail, citations);
        knowledge_log.flush(trail, citations);
        research.competitors = competitors.into_option();
        research.industry = industry.into_option();
        research.tooling = tooling.into_option();
        research.knowledge = knowledge.into_option();

        emit(
            progress,
            ResearchStage::SalesIntelligenceSynthesis,
            "synthesizing sales intelligence",
        );
        let (sales, log) = self.synthesize_sales_intelligence(input, &research, &meter).await;
        log.flush(trail, citations);
        research.sales_intelligence = sales.into_option();

        trail.finalize();

        if meter.nothing_answered() {
            return Err(ResearchError::AnalysisUnavailable {
                attempts: meter.attempts(),
            });
        }

        emit(
            progress,
            ResearchStage::Complete,
            format!("{} of 7 research fields populated", research.populated_fields()),
        );
        Ok(research)
    }

    /// One generative call, metered and audited. `Some` on success; `None`
    /// leaves an error entry in the log.
    pub(super) async fn analyze_logged(
        &self,
        action: &str,
        request: AnalysisRequest,
        meter: &AnalysisMeter,
        log: &mut TaskLog,
    ) -> Option<AnalysisOutcome> {
        meter.attempt();
        let prompt = request.prompt.clone();
        let started = Instant::now();
        match self.analysis.analyze(request).await {
            Ok(outcome) => {
                meter.success();
                log.record(
                    AuditEntry::now(
                        AuditKind::GenerativeQuery,
                        action,
                        AuditDetail {
                            prompt: Some(prompt),
                            success: true,
                            summary: Some(prompts::truncate(&outcome.text, 600)),
                            input_tokens: Some(outcome.usage.input_tokens),
                            output_tokens: Some(outcome.usage.output_tokens),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                Some(outcome)
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "generative analysis failed");
                log.record(
                    AuditEntry::now(
                        AuditKind::Error,
                        action,
                        AuditDetail {
                            prompt: Some(prompt),
                            success: false,
                            summary: Some(err.to_string()),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                None
            }
        }
    }

    pub(super) async fn search_logged(
        &self,
        action: &str,
        query: &str,
        limit: usize,
        log: &mut TaskLog,
    ) -> Option<SearchResults> {
        let started = Instant::now();
        match self.search.search(query, limit).await {
            Ok(results) => {
                log.record(
                    AuditEntry::now(
                        AuditKind::WebSearch,
                        action,
                        AuditDetail {
                            query: Some(query.to_string()),
                            success: true,
                            summary: Some(format!("{} hits", results.data.len())),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                Some(results)
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "web search failed");
                log.record(
                    AuditEntry::now(
                        AuditKind::Error,
                        action,
                        AuditDetail {
                            query: Some(query.to_string()),
                            success: false,
                            summary: Some(err.to_string()),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                None
            }
        }
    }

    pub(super) async fn scrape_logged(
        &self,
        action: &str,
        url: &str,
        options: ScrapeOptions,
        log: &mut TaskLog,
    ) -> Option<ScrapedPage> {
        let started = Instant::now();
        match self.scrape.scrape(url, options).await {
            Ok(page) => {
                log.record(
                    AuditEntry::now(
                        AuditKind::WebScrape,
                        action,
                        AuditDetail {
                            url: Some(url.to_string()),
                            success: true,
                            summary: Some(format!("{} chars", page.content.chars().count())),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                Some(page)
            }
            Err(err) => {
                tracing::warn!(action, url, error = %err, "scrape failed");
                log.record(
                    AuditEntry::now(
                        AuditKind::Error,
                        action,
                        AuditDetail {
                            url: Some(url.to_string()),
                            success: false,
                            summary: Some(err.to_string()),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                None
            }
        }
    }

    pub(super) async fn knowledge_logged(
        &self,
        action: &str,
        query: &str,
        log: &mut TaskLog,
    ) -> Option<KnowledgeResults> {
        let started = Instant::now();
        match self.knowledge.query(query).await {
            Ok(results) => {
                log.record(
                    AuditEntry::now(
                        AuditKind::KnowledgeQuery,
                        action,
                        AuditDetail {
                            query: Some(query.to_string()),
                            success: true,
                            summary: Some(format!("{} results", results.results.len())),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                Some(results)
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "knowledge lookup failed");
                log.record(
                    AuditEntry::now(
                        AuditKind::Error,
                        action,
                        AuditDetail {
                            query: Some(query.to_string()),
                            success: false,
                            summary: Some(err.to_string()),
                            ..AuditDetail::default()
                        },
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                );
                None
            }
        }
    }
}

fn emit(progress: Option<&ProgressCallback>, stage: ResearchStage, detail: impl Into<String>) {
    let detail = detail.into();
    tracing::info!(stage = stage.label(), detail = %detail, "research stage");
    if let Some(callback) = progress {
        callback(ResearchProgress { stage, detail });
    }
}
