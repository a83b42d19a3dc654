use std::sync::Arc;

use async_trait::async_trait;
use prospect_ai::audit::{AuditDetail, AuditEntry, AuditKind, AuditTrail};
use prospect_ai::citations::{CitationKind, CitationMeta, CitationTracker};
use prospect_ai::workflows::assessment::roi::{CostModel, RoiEngine};
use prospect_ai::workflows::assessment::scoring::{
    load_or_default, JsonFileStore, ScoringConfig, ScoringEngine,
};
use prospect_ai::workflows::assessment::{
    AdminHoursBucket, AssessmentInput, CrewSizeBracket, DecisionTimeline, TradeCategory,
};
use prospect_ai::workflows::reporting::compose_admin_report;
use prospect_ai::workflows::research::{
    AnalysisOutcome, AnalysisProvider, AnalysisRequest, KnowledgeProvider, KnowledgeResults,
    ProviderError, ResearchError, ResearchPipeline, ScrapeOptions, ScrapeProvider, ScrapedPage,
    SearchHit, SearchProvider, SearchResults, TokenUsage,
};

fn intake() -> AssessmentInput {
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

/// Answers every generative call with an empty JSON object. Each reply
/// parses against its expected shape with all-default interiors, so the
/// pipeline runs its full happy path without scripted prompt routing.
struct BlankAnalysis;

#[async_trait]
impl AnalysisProvider for BlankAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        Ok(AnalysisOutcome {
            text: "{}".to_string(),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        })
    }
}

struct DownAnalysis;

#[async_trait]
impl AnalysisProvider for DownAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisOutcome, ProviderError> {
        Err(ProviderError::Connection(
            "analysis endpoint down".to_string(),
        ))
    }
}

struct CannedSearch;

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<SearchResults, ProviderError> {
        Ok(SearchResults {
            data: vec![
                SearchHit {
                    url: "https://summitroofing.test".to_string(),
                    title: "Summit Roofing".to_string(),
                    description: "Commercial roofing in Des Moines".to_string(),
                },
                SearchHit {
                    url: "https://rival-roofing.test".to_string(),
                    title: "Rival Roofing".to_string(),
                    description: "Roofing across Iowa".to_string(),
                },
            ],
        })
    }
}

struct CannedScrape;

#[async_trait]
impl ScrapeProvider for CannedScrape {
    async fn scrape(
        &self,
        _url: &str,
        _options: ScrapeOptions,
    ) -> Result<ScrapedPage, ProviderError> {
        Ok(ScrapedPage {
            content: "Summit Roofing installs and repairs commercial TPO and metal roofs. "
                .repeat(6),
        })
    }
}

struct CannedKnowledge;

#[async_trait]
impl KnowledgeProvider for CannedKnowledge {
    async fn query(&self, text: &str) -> Result<KnowledgeResults, ProviderError> {
        Ok(KnowledgeResults {
            results: vec![serde_json::json!({"match": text})],
        })
    }
}

#[test]
fn scored_report_flows_from_intake_to_admin_document() {
    let input = intake();

    let dir = tempfile::tempdir().expect("create temp dir");
    let store = JsonFileStore::new(dir.path().join("scoring.json"));
    let engine = ScoringEngine::new(load_or_default(&store)).expect("default rubric is valid");
    let score = engine.score(&input);

    assert_eq!(score.total_score, 67);
    assert_eq!(score.max_score, 100);
    assert_eq!(score.grade, "B-");
    assert!(
        !score.recommendations.is_empty(),
        "Excel on the tool list should trigger at least one recommendation"
    );

    let roi = RoiEngine::new(CostModel::default()).estimate(&input);
    assert_eq!(roi.representative_crew, 35);
    assert!(
        roi.money_costs.missed_change_orders > 0.0,
        "change order tracking pain should activate its cost line"
    );
    assert!(roi.total_annual_cost >= roi.annual_time_cost);

    let mut trail = AuditTrail::new();
    trail.append(AuditEntry::now(
        AuditKind::Calculation,
        "opportunity score",
        AuditDetail {
            success: true,
            summary: Some(format!("{} of {}", score.total_score, score.max_score)),
            ..AuditDetail::default()
        },
    ));
    trail.append(AuditEntry::now(
        AuditKind::Calculation,
        "roi estimate",
        AuditDetail {
            success: true,
            summary: Some(format!("net annual value {:.0}", roi.net_annual_value)),
            ..AuditDetail::default()
        },
    ));
    trail.finalize();

    let mut citations = CitationTracker::new();
    let id = citations.cite(CitationMeta {
        kind: CitationKind::StructuredData,
        source: "intake form".to_string(),
        url: None,
        snapshot: Some(serde_json::json!({"pain_points": input.pain_points})),
        query: None,
        confidence: 1.0,
    });
    citations.link_content(&score.recommendations[0], &[id.clone()]);
    assert_eq!(citations.format_badge(&[id]), "[sources: intake form]");

    let admin = compose_admin_report(&score, &roi, None, &input, &trail, &citations);

    assert!(admin.customer.research.is_none());
    assert!(admin.sales.is_none());
    assert_eq!(admin.citations.len(), 1);
    assert_eq!(admin.audit_summary.calculations, 2);
    assert!(admin
        .customer
        .summary
        .contains("Summit Roofing scores 67 of 100"));
    assert!(admin.customer.summary.contains("grade B-"));

    let rendered = admin.render_text();
    assert!(rendered.contains("Opportunity Report: Summit Roofing"));
    assert!(rendered.contains("Citations (1):"));
    assert!(
        rendered.contains("research coverage [unavailable]"),
        "derivation trace should flag the missing research step"
    );
    assert!(
        rendered.contains("calculation"),
        "transcript should carry the appended calculation entries"
    );
}

#[tokio::test]
async fn unreachable_analysis_still_yields_an_auditable_report() {
    let input = intake();
    let pipeline = ResearchPipeline::new(
        Arc::new(DownAnalysis),
        Arc::new(CannedSearch),
        Arc::new(CannedScrape),
        Arc::new(CannedKnowledge),
    );

    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();
    let outcome = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await;

    match outcome {
        Err(ResearchError::AnalysisUnavailable { attempts }) => assert_eq!(attempts, 7),
        other => panic!("expected analysis-unavailable failure, got {other:?}"),
    }
    assert!(trail.is_finalized());
    assert_eq!(trail.summary().errors, 7);
    assert_eq!(trail.summary().web_searches, 3);
    assert_eq!(trail.summary().web_scrapes, 5);
    assert_eq!(
        citations.len(),
        6,
        "search hits, industry pages, and knowledge lookups are cited before synthesis"
    );

    // The assessment half is independent of research, so the admin report
    // still composes from the partial trail.
    let engine = ScoringEngine::new(ScoringConfig::default()).expect("default rubric is valid");
    let score = engine.score(&input);
    let roi = RoiEngine::new(CostModel::default()).estimate(&input);
    let admin = compose_admin_report(&score, &roi, None, &input, &trail, &citations);

    assert!(admin.customer.research.is_none());
    assert_eq!(admin.citations.len(), 6);
    assert_eq!(admin.audit_summary.errors, 7);
    assert!(admin.render_text().contains("Opportunity Report:"));
}

#[tokio::test]
async fn research_run_populates_the_full_admin_surface() {
    let input = intake();
    let pipeline = ResearchPipeline::new(
        Arc::new(BlankAnalysis),
        Arc::new(CannedSearch),
        Arc::new(CannedScrape),
        Arc::new(CannedKnowledge),
    );

    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();
    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("pipeline succeeds with reachable providers");

    assert_eq!(research.populated_fields(), 7);
    assert_eq!(research.website.as_deref(), Some("https://summitroofing.test"));
    assert_eq!(trail.summary().generative_queries, 7);
    assert_eq!(trail.summary().errors, 0);
    assert_eq!(citations.len(), 11);

    let engine = ScoringEngine::new(ScoringConfig::default()).expect("default rubric is valid");
    let score = engine.score(&input);
    let roi = RoiEngine::new(CostModel::default()).estimate(&input);
    let admin = compose_admin_report(&score, &roi, Some(&research), &input, &trail, &citations);

    assert!(admin.customer.research.is_some());
    assert!(
        admin.sales.is_some(),
        "synthesis stage should produce the internal sales section"
    );
    assert_eq!(admin.citations.len(), 11);
    assert_eq!(admin.audit_summary.input_tokens, 700);
    assert_eq!(admin.audit_summary.output_tokens, 350);

    let rendered = admin.render_text();
    assert!(rendered.contains("Citations (11):"));
    assert!(rendered.contains("Sales intelligence (internal):"));
}
