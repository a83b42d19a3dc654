//! The four independent research tasks of the parallel stage.
//!
//! Each task returns its own [`TaskLog`] alongside a [`Sourced`] result so
//! the orchestrator can flush audit entries in task order after the join.
//! No task failure propagates past its own return value.

use serde::Deserialize;

use crate::audit::{AuditDetail, AuditEntry, AuditKind};
use crate::citations::{CitationKind, CitationMeta};
use crate::workflows::assessment::AssessmentInput;

use super::decode::{structured, Decoded};
use super::domain::{
    attributed, CompetitorLandscape, CompetitorProfile, IndustryInsights, KnowledgeIntelligence,
    SourcedInsight, ToolAssessment, ToolingAnalysis,
};
use super::prompts;
use super::providers::{AnalysisRequest, ScrapeOptions, Sourced};
use super::recorder::{AnalysisMeter, TaskLog};
use super::website::{near_empty, site_label};
use super::ResearchPipeline;

/// Secondary scrapes are issued sequentially and bounded per task.
const COMPETITOR_SCRAPE_LIMIT: usize = 5;
const INDUSTRY_SCRAPE_LIMIT: usize = 3;
/// Raw knowledge hits kept in a citation snapshot.
const SNAPSHOT_RESULT_LIMIT: usize = 3;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitorsWire {
    #[serde(default)]
    competitors: Vec<CompetitorProfileWire>,
    #[serde(default)]
    positioning_summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitorProfileWire {
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    positioning: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
}

impl From<CompetitorsWire> for CompetitorLandscape {
    fn from(wire: CompetitorsWire) -> Self {
        Self {
            profiles: wire
                .competitors
                .into_iter()
                .map(|profile| CompetitorProfile {
                    name: profile.name,
                    url: profile.url,
                    positioning: profile.positioning,
                    strengths: profile.strengths,
                    weaknesses: profile.weaknesses,
                })
                .collect(),
            positioning_summary: wire
                .positioning_summary
                .filter(|summary| !summary.trim().is_empty()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndustryWire {
    #[serde(default)]
    trends: Vec<String>,
    #[serde(default)]
    challenges: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
    #[serde(default)]
    market_size: Option<String>,
}

impl From<IndustryWire> for IndustryInsights {
    fn from(wire: IndustryWire) -> Self {
        Self {
            trends: wire.trends,
            challenges: wire.challenges,
            opportunities: wire.opportunities,
            market_size: wire.market_size,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolingWire {
    #[serde(default)]
    tools: Vec<ToolWire>,
    #[serde(default)]
    gaps: Vec<String>,
    #[serde(default)]
    switching_considerations: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolWire {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    limitations: Vec<String>,
}

impl From<ToolingWire> for ToolingAnalysis {
    fn from(wire: ToolingWire) -> Self {
        Self {
            current_tools: wire
                .tools
                .into_iter()
                .map(|tool| ToolAssessment {
                    name: tool.name,
                    category: tool.category,
                    limitations: tool.limitations,
                })
                .collect(),
            gaps: wire.gaps,
            switching_considerations: wire.switching_considerations,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeInsightsWire {
    #[serde(default)]
    similar_customers: Vec<String>,
    #[serde(default)]
    case_studies: Vec<String>,
    #[serde(default)]
    insights: Vec<InsightWire>,
}

#[derive(Deserialize)]
struct InsightWire {
    insight: String,
    #[serde(default)]
    source: String,
}

impl From<KnowledgeInsightsWire> for KnowledgeIntelligence {
    fn from(wire: KnowledgeInsightsWire) -> Self {
        Self {
            similar_customers: wire.similar_customers,
            case_studies: wire.case_studies,
            insights: wire
                .insights
                .into_iter()
                .map(|insight| SourcedInsight {
                    insight: insight.insight,
                    source: attributed(insight.source),
                })
                .collect(),
        }
    }
}

impl ResearchPipeline {
    /// Competitor discovery: search, scrape up to five rival sites, then
    /// synthesize profiles. Failed scrapes fall back to the search snippet.
    pub(super) async fn research_competitors(
        &self,
        input: &AssessmentInput,
        meter: &AnalysisMeter,
    ) -> (Sourced<CompetitorLandscape>, TaskLog) {
        let mut log = TaskLog::new();

        let query = if input.competitors.is_empty() {
            format!(
                "{} {} competitors",
                input.company_name,
                input.trade.label()
            )
        } else {
            format!("{} comparison reviews", input.competitors.join(" vs "))
        };

        let Some(results) = self
            .search_logged("competitor discovery", &query, COMPETITOR_SCRAPE_LIMIT, &mut log)
            .await
        else {
            return (Sourced::degraded("competitor search failed"), log);
        };
        if results.data.is_empty() {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "competitor discovery",
                AuditDetail {
                    query: Some(query),
                    success: false,
                    summary: Some("no search hits".to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (Sourced::degraded("no competitor search hits"), log);
        }

        let mut materials: Vec<(String, String)> = Vec::new();
        let mut page_citations: Vec<CitationMeta> = Vec::new();
        for hit in results.data.iter().take(COMPETITOR_SCRAPE_LIMIT) {
            let content = match self
                .scrape_logged("competitor page", &hit.url, ScrapeOptions::default(), &mut log)
                .await
            {
                Some(page) if !near_empty(&page.content) => {
                    page_citations.push(CitationMeta {
                        kind: CitationKind::WebResearch,
                        source: site_label(&hit.url),
                        url: Some(hit.url.clone()),
                        snapshot: None,
                        query: None,
                        confidence: 0.8,
                    });
                    page.content
                }
                // Snippet stands in for a failed or empty scrape.
                _ => hit.description.clone(),
            };
            materials.push((hit.title.clone(), content));
        }

        let prompt =
            prompts::competitor_synthesis_prompt(&input.company_name, input.trade.label(), &materials);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let Some(outcome) = self
            .analyze_logged("competitor synthesis", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("competitor synthesis call failed"), log);
        };

        let landscape = match structured::<CompetitorsWire>(&outcome.text) {
            Decoded::Parsed(wire) => CompetitorLandscape::from(wire),
            // Literal fallback: keep the prose read of the field even when
            // profiles could not be extracted.
            Decoded::Unparsed(raw) => CompetitorLandscape {
                profiles: Vec::new(),
                positioning_summary: Some(prompts::truncate(&raw, 1500)),
            },
        };

        let linked = landscape.positioning_summary.clone();
        for meta in page_citations {
            log.cite(meta, linked.clone());
        }

        (Sourced::Ok(landscape), log)
    }

    /// Industry-trend research: search, scrape the top few hits, synthesize.
    pub(super) async fn research_industry(
        &self,
        input: &AssessmentInput,
        meter: &AnalysisMeter,
    ) -> (Sourced<IndustryInsights>, TaskLog) {
        let mut log = TaskLog::new();

        let query = format!(
            "{} contractor industry trends challenges",
            input.trade.label()
        );
        let Some(results) = self
            .search_logged("industry research", &query, INDUSTRY_SCRAPE_LIMIT, &mut log)
            .await
        else {
            return (Sourced::degraded("industry search failed"), log);
        };
        if results.data.is_empty() {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "industry research",
                AuditDetail {
                    query: Some(query),
                    success: false,
                    summary: Some("no search hits".to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (Sourced::degraded("no industry search hits"), log);
        }

        let mut materials: Vec<(String, String)> = Vec::new();
        for hit in results.data.iter().take(INDUSTRY_SCRAPE_LIMIT) {
            let content = match self
                .scrape_logged("industry page", &hit.url, ScrapeOptions::default(), &mut log)
                .await
            {
                Some(page) if !near_empty(&page.content) => {
                    log.cite(
                        CitationMeta {
                            kind: CitationKind::IndustryData,
                            source: site_label(&hit.url),
                            url: Some(hit.url.clone()),
                            snapshot: None,
                            query: Some(query.clone()),
                            confidence: 0.7,
                        },
                        None,
                    );
                    page.content
                }
                _ => hit.description.clone(),
            };
            materials.push((hit.title.clone(), content));
        }

        let prompt = prompts::industry_synthesis_prompt(input.trade.label(), &materials);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let Some(outcome) = self
            .analyze_logged("industry synthesis", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("industry synthesis call failed"), log);
        };

        match structured::<IndustryWire>(&outcome.text) {
            Decoded::Parsed(wire) => (Sourced::Ok(IndustryInsights::from(wire)), log),
            Decoded::Unparsed(_) => {
                log.record(AuditEntry::now(
                    AuditKind::DataSource,
                    "industry synthesis",
                    AuditDetail {
                        success: false,
                        summary: Some("response did not match the expected shape".to_string()),
                        ..AuditDetail::default()
                    },
                ));
                (Sourced::degraded("industry synthesis did not parse"), log)
            }
        }
    }

    /// Tooling analysis: pure synthesis over the tools named on the intake
    /// form. Makes no network call when none were named.
    pub(super) async fn research_tooling(
        &self,
        input: &AssessmentInput,
        meter: &AnalysisMeter,
    ) -> (Sourced<ToolingAnalysis>, TaskLog) {
        let mut log = TaskLog::new();

        let tools: Vec<String> = input
            .current_tools
            .iter()
            .map(|tool| tool.trim().to_string())
            .filter(|tool| !tool.is_empty())
            .collect();
        if tools.is_empty() {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "tooling analysis",
                AuditDetail {
                    success: true,
                    summary: Some("no tools named on intake; skipped".to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (Sourced::degraded("no tools named on intake"), log);
        }

        let prompt = prompts::tooling_analysis_prompt(input.trade.label(), &tools);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let Some(outcome) = self
            .analyze_logged("tooling analysis", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("tooling analysis call failed"), log);
        };

        match structured::<ToolingWire>(&outcome.text) {
            Decoded::Parsed(wire) => {
                log.cite(
                    CitationMeta {
                        kind: CitationKind::GeneratedContent,
                        source: "tooling assessment".to_string(),
                        url: None,
                        snapshot: Some(serde_json::json!({ "tools": tools })),
                        query: None,
                        confidence: 0.6,
                    },
                    None,
                );
                (Sourced::Ok(ToolingAnalysis::from(wire)), log)
            }
            Decoded::Unparsed(_) => {
                log.record(AuditEntry::now(
                    AuditKind::DataSource,
                    "tooling analysis",
                    AuditDetail {
                        success: false,
                        summary: Some("response did not match the expected shape".to_string()),
                        ..AuditDetail::default()
                    },
                ));
                (Sourced::degraded("tooling analysis did not parse"), log)
            }
        }
    }

    /// Knowledge-base research: three lookups in parallel through the
    /// two-tier gateway, then one extraction pass over the raw hits.
    pub(super) async fn research_knowledge(
        &self,
        input: &AssessmentInput,
        meter: &AnalysisMeter,
    ) -> (Sourced<KnowledgeIntelligence>, TaskLog) {
        let mut log = TaskLog::new();

        let queries = [
            format!(
                "customers similar to {} {} contractor",
                input.company_name,
                input.trade.label()
            ),
            format!("{} contractor case studies", input.trade.label()),
            format!("common objections from {} contractors", input.trade.label()),
        ];

        let lookup = |query: String| async move {
            let mut lookup_log = TaskLog::new();
            let results = self
                .knowledge_logged("knowledge lookup", &query, &mut lookup_log)
                .await;
            (query, results, lookup_log)
        };
        let (first, second, third) = tokio::join!(
            lookup(queries[0].clone()),
            lookup(queries[1].clone()),
            lookup(queries[2].clone()),
        );

        let mut raw_blocks: Vec<(String, String)> = Vec::new();
        let mut any_answered = false;
        for (query, results, lookup_log) in [first, second, third] {
            log.merge(lookup_log);
            let Some(results) = results else { continue };
            any_answered = true;
            if results.results.is_empty() {
                continue;
            }
            let rendered = serde_json::to_string_pretty(&results.results)
                .unwrap_or_else(|_| "[]".to_string());
            log.cite(
                CitationMeta {
                    kind: CitationKind::SemanticLookup,
                    source: "knowledge base".to_string(),
                    url: None,
                    snapshot: Some(serde_json::json!(results
                        .results
                        .iter()
                        .take(SNAPSHOT_RESULT_LIMIT)
                        .collect::<Vec<_>>())),
                    query: Some(query.clone()),
                    confidence: 0.8,
                },
                None,
            );
            raw_blocks.push((query, rendered));
        }

        if raw_blocks.is_empty() {
            let reason = if any_answered {
                "no knowledge-base matches"
            } else {
                "knowledge base unreachable"
            };
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "knowledge research",
                AuditDetail {
                    success: any_answered,
                    summary: Some(reason.to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (Sourced::degraded(reason), log);
        }

        let prompt =
            prompts::knowledge_insights_prompt(&input.company_name, input.trade.label(), &raw_blocks);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let Some(outcome) = self
            .analyze_logged("knowledge insights", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("knowledge insight extraction failed"), log);
        };

        match structured::<KnowledgeInsightsWire>(&outcome.text) {
            Decoded::Parsed(wire) => (Sourced::Ok(KnowledgeIntelligence::from(wire)), log),
            Decoded::Unparsed(_) => {
                log.record(AuditEntry::now(
                    AuditKind::DataSource,
                    "knowledge insights",
                    AuditDetail {
                        success: false,
                        summary: Some("response did not match the expected shape".to_string()),
                        ..AuditDetail::default()
                    },
                ));
                (Sourced::degraded("knowledge insights did not parse"), log)
            }
        }
    }
}
