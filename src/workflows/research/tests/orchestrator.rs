use std::sync::{Arc, Mutex};

use super::common::*;
use crate::audit::{AuditKind, AuditTrail};
use crate::citations::{CitationKind, CitationTracker};
use crate::workflows::research::{
    ProgressCallback, ResearchError, ResearchPipeline, ResearchProgress, ResearchStage,
};

#[tokio::test]
async fn happy_path_populates_every_research_field() {
    let (pipeline, _analysis, _search) = scripted_pipeline();
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("run succeeds");

    assert_eq!(research.company_name, "Summit Roofing");
    assert_eq!(research.website.as_deref(), Some("https://summitroofing.test"));
    assert_eq!(research.populated_fields(), 7);

    let basic = research.basic_info.as_ref().expect("basic info");
    assert_eq!(
        basic.description.as_deref(),
        Some("Commercial roofing contractor serving central Iowa")
    );
    let website = research.website_analysis.as_ref().expect("website analysis");
    assert_eq!(website.technologies, vec!["QuickBooks"]);
    assert!(website.notes.is_none());
    let competitors = research.competitors.as_ref().expect("competitors");
    assert_eq!(competitors.profiles[0].name, "Rival Roofing");
    let sales = research.sales_intelligence.as_ref().expect("sales intelligence");
    assert_eq!(sales.key_contacts[0].role, "Operations Manager");

    assert!(trail.is_finalized());
    let summary = trail.summary();
    assert_eq!(summary.generative_queries, 7);
    assert_eq!(summary.web_searches, 3);
    assert_eq!(summary.web_scrapes, 5);
    assert_eq!(summary.knowledge_queries, 3);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.input_tokens, 700);
    assert_eq!(summary.output_tokens, 350);
}

#[tokio::test]
async fn happy_path_links_citations_to_the_text_they_back() {
    let (pipeline, _analysis, _search) = scripted_pipeline();
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("run succeeds");

    // search 1 + website 1 + competitor pages 2 + industry pages 2
    // + tooling 1 + knowledge lookups 3 + synthesis 1
    assert_eq!(citations.len(), 11);

    let description = research
        .basic_info
        .as_ref()
        .and_then(|info| info.description.as_deref())
        .expect("description");
    let backing = citations.citations_for(description);
    assert_eq!(backing.len(), 1);
    assert_eq!(backing[0].kind, CitationKind::WebResearch);
    assert_eq!(backing[0].source, "web search");

    let summary_text = research
        .competitors
        .as_ref()
        .and_then(|landscape| landscape.positioning_summary.as_deref())
        .expect("positioning summary");
    let backing = citations.citations_for(summary_text);
    assert_eq!(backing.len(), 2, "both scraped competitor pages");

    let talking_point = &research
        .sales_intelligence
        .as_ref()
        .expect("sales intelligence")
        .talking_points[0]
        .point;
    let backing = citations.citations_for(talking_point);
    assert_eq!(backing.len(), 1);
    assert_eq!(backing[0].kind, CitationKind::GeneratedContent);
}

#[tokio::test]
async fn progress_reports_stages_in_order() {
    let (pipeline, _analysis, _search) = scripted_pipeline();
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let seen: Arc<Mutex<Vec<ResearchProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = move |progress: ResearchProgress| {
        sink.lock().expect("progress lock").push(progress);
    };
    let callback: &ProgressCallback = &callback;

    pipeline
        .research(&input, &mut trail, &mut citations, Some(callback))
        .await
        .expect("run succeeds");

    let seen = seen.lock().expect("progress lock");
    let stages: Vec<ResearchStage> = seen.iter().map(|progress| progress.stage).collect();
    assert_eq!(
        stages,
        vec![
            ResearchStage::WebsiteDiscovery,
            ResearchStage::WebsiteScrape,
            ResearchStage::ParallelResearch,
            ResearchStage::SalesIntelligenceSynthesis,
            ResearchStage::Complete,
        ]
    );
    assert_eq!(seen.last().expect("final event").detail, "7 of 7 research fields populated");
}

#[tokio::test]
async fn three_failed_parallel_tasks_leave_the_one_success_in_place() {
    // Search and knowledge store down, analysis only answering the tooling
    // prompt: competitors, industry, and knowledge all degrade.
    let analysis = RoutedAnalysis::new().route("currently runs their operation", TOOLING_REPLY);
    let pipeline = ResearchPipeline::new(
        Arc::new(analysis),
        Arc::new(FailingSearch),
        Arc::new(StaticScrape {
            content: page_content(),
        }),
        Arc::new(FailingKnowledge),
    );
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("partial failure must not abort the run");

    assert!(research.tooling.is_some());
    assert!(research.competitors.is_none());
    assert!(research.industry.is_none());
    assert!(research.knowledge.is_none());
    assert!(research.website.is_none(), "discovery search failed");
    assert!(research.sales_intelligence.is_none());
    assert_eq!(research.populated_fields(), 1);

    // discovery search, two task searches, three knowledge lookups, and
    // the unanswered synthesis call
    assert_eq!(trail.summary().errors, 7);
}

#[tokio::test]
async fn fully_unreachable_analysis_fails_the_run_with_partial_trail() {
    let pipeline = ResearchPipeline::new(
        Arc::new(FailingAnalysis),
        Arc::new(StaticSearch::with_hits(hits())),
        Arc::new(StaticScrape {
            content: page_content(),
        }),
        Arc::new(StaticKnowledge::with_case_study()),
    );
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let outcome = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await;

    match outcome {
        Err(ResearchError::AnalysisUnavailable { attempts }) => assert_eq!(attempts, 7),
        other => panic!("expected availability failure, got {other:?}"),
    }

    // The non-generative work still ran and is all on the trail.
    assert!(trail.is_finalized());
    let summary = trail.summary();
    assert_eq!(summary.errors, 7);
    assert_eq!(summary.web_searches, 3);
    assert_eq!(summary.web_scrapes, 5);
    assert_eq!(summary.knowledge_queries, 3);
}

#[tokio::test]
async fn near_empty_scrape_retries_full_page_and_keeps_the_analysis() {
    let mut input = intake();
    input.website = Some("summitroofing.test".to_string());
    let search = Arc::new(StaticSearch::with_hits(hits()));
    let pipeline = ResearchPipeline::new(
        Arc::new(routed_analysis()),
        search.clone(),
        Arc::new(FilterSensitiveScrape {
            filtered: String::new(),
            full: page_content(),
        }),
        Arc::new(StaticKnowledge::with_case_study()),
    );
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("run succeeds");

    assert_eq!(research.website.as_deref(), Some("https://summitroofing.test"));
    let website = research.website_analysis.as_ref().expect("retry populated the field");
    assert_eq!(website.inferred_pain_points, vec!["Paper-based job tracking"]);

    assert!(trail
        .entries()
        .iter()
        .any(|entry| entry.action == "website scrape (full page)"));
    assert!(trail
        .entries()
        .iter()
        .any(|entry| entry.action == "website from intake form"
            && entry.kind == AuditKind::DataSource));

    // A known website means no discovery search and no basic-info call.
    assert!(research.basic_info.is_none());
    assert!(search
        .queries()
        .iter()
        .all(|query| !query.contains("Summit Roofing roofing contractor")));
    assert_eq!(trail.summary().web_searches, 2, "competitor and industry only");
}

#[tokio::test]
async fn empty_search_results_skip_scrape_and_degrade_quietly() {
    let pipeline = ResearchPipeline::new(
        Arc::new(routed_analysis()),
        Arc::new(StaticSearch::empty()),
        Arc::new(StaticScrape {
            content: page_content(),
        }),
        Arc::new(StaticKnowledge::with_case_study()),
    );
    let input = intake();
    let mut trail = AuditTrail::new();
    let mut citations = CitationTracker::new();

    let research = pipeline
        .research(&input, &mut trail, &mut citations, None)
        .await
        .expect("run succeeds");

    assert!(research.website.is_none());
    assert!(research.website_analysis.is_none());
    assert!(research.competitors.is_none());
    assert!(research.industry.is_none());
    assert!(research.tooling.is_some());
    assert!(research.knowledge.is_some());
    assert!(research.sales_intelligence.is_some());
    assert_eq!(trail.summary().web_scrapes, 0);
}
