use serde::Deserialize;

use crate::audit::{AuditDetail, AuditEntry, AuditKind};
use crate::citations::{CitationKind, CitationMeta};
use crate::workflows::assessment::AssessmentInput;

use super::decode::{structured, Decoded};
use super::domain::{BasicCompanyInfo, CompanyHistory, WebsiteAnalysis};
use super::prompts;
use super::providers::{AnalysisRequest, ScrapeOptions, Sourced};
use super::recorder::{AnalysisMeter, TaskLog};
use super::ResearchPipeline;

/// Scraped content shorter than this after trimming counts as near-empty
/// and triggers the full-page retry.
const MIN_USABLE_CHARS: usize = 200;
const DISCOVERY_HIT_LIMIT: usize = 5;

pub(super) struct Discovery {
    pub website: Option<String>,
    pub basic_info: Option<BasicCompanyInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicInfoWire {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    years_in_business: Option<String>,
    #[serde(default)]
    size_estimate: Option<String>,
}

impl From<BasicInfoWire> for BasicCompanyInfo {
    fn from(wire: BasicInfoWire) -> Self {
        Self {
            description: wire.description,
            services: wire.services,
            location: wire.location,
            years_in_business: wire.years_in_business,
            size_estimate: wire.size_estimate,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebsiteAnalysisWire {
    #[serde(default)]
    technologies: Vec<String>,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    value_propositions: Vec<String>,
    #[serde(default)]
    pain_points: Vec<String>,
    #[serde(default)]
    company_history: Option<CompanyHistoryWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyHistoryWire {
    #[serde(default)]
    founded: Option<String>,
    #[serde(default)]
    milestones: Vec<String>,
    #[serde(default)]
    ownership: Option<String>,
}

impl From<WebsiteAnalysisWire> for WebsiteAnalysis {
    fn from(wire: WebsiteAnalysisWire) -> Self {
        Self {
            technologies: wire.technologies,
            services: wire.services,
            value_propositions: wire.value_propositions,
            inferred_pain_points: wire.pain_points,
            history: wire.company_history.map(|history| CompanyHistory {
                founded: history.founded,
                milestones: history.milestones,
                ownership: history.ownership,
            }),
            notes: None,
        }
    }
}

impl ResearchPipeline {
    /// Website discovery stage. An intake-provided URL short-circuits the
    /// search; otherwise the top hit becomes the website and the snippets
    /// feed a basic-info extraction.
    pub(super) async fn discover_website(
        &self,
        input: &AssessmentInput,
        meter: &AnalysisMeter,
    ) -> (Discovery, TaskLog) {
        let mut log = TaskLog::new();

        if let Some(website) = known_website(input) {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "website from intake form",
                AuditDetail {
                    url: Some(website.clone()),
                    success: true,
                    ..AuditDetail::default()
                },
            ));
            return (
                Discovery {
                    website: Some(website),
                    basic_info: None,
                },
                log,
            );
        }

        let query = format!("{} {} contractor", input.company_name, input.trade.label());
        let Some(results) = self
            .search_logged("website discovery", &query, DISCOVERY_HIT_LIMIT, &mut log)
            .await
        else {
            return (
                Discovery {
                    website: None,
                    basic_info: None,
                },
                log,
            );
        };

        if results.data.is_empty() {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "website discovery",
                AuditDetail {
                    query: Some(query),
                    success: false,
                    summary: Some("no search hits".to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (
                Discovery {
                    website: None,
                    basic_info: None,
                },
                log,
            );
        }

        let website = results.data[0].url.clone();

        let prompt =
            prompts::basic_info_prompt(&input.company_name, input.trade.label(), &results.data);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let basic_info = match self
            .analyze_logged("basic company info", request, meter, &mut log)
            .await
        {
            Some(outcome) => match structured::<BasicInfoWire>(&outcome.text) {
                Decoded::Parsed(wire) => Some(BasicCompanyInfo::from(wire)),
                Decoded::Unparsed(_) => {
                    log.record(AuditEntry::now(
                        AuditKind::DataSource,
                        "basic company info",
                        AuditDetail {
                            success: false,
                            summary: Some("response did not match the expected shape".to_string()),
                            ..AuditDetail::default()
                        },
                    ));
                    None
                }
            },
            None => None,
        };

        let snapshot = serde_json::json!(results
            .data
            .iter()
            .take(3)
            .map(|hit| serde_json::json!({"url": hit.url, "title": hit.title}))
            .collect::<Vec<_>>());
        let linked = basic_info
            .as_ref()
            .and_then(|info| info.description.clone());
        log.cite(
            CitationMeta {
                kind: CitationKind::WebResearch,
                source: "web search".to_string(),
                url: Some(website.clone()),
                snapshot: Some(snapshot),
                query: Some(query),
                confidence: 0.7,
            },
            linked,
        );

        (
            Discovery {
                website: Some(website),
                basic_info,
            },
            log,
        )
    }

    /// Website scrape stage: scrape, retry near-empty results once with the
    /// full-page variant, then extract a structured reading of the site.
    pub(super) async fn study_website(
        &self,
        input: &AssessmentInput,
        website: &str,
        meter: &AnalysisMeter,
    ) -> (Sourced<WebsiteAnalysis>, TaskLog) {
        let mut log = TaskLog::new();

        let mut content = match self
            .scrape_logged("website scrape", website, ScrapeOptions::default(), &mut log)
            .await
        {
            Some(page) => page.content,
            None => return (Sourced::degraded("website scrape failed"), log),
        };

        if near_empty(&content) {
            if let Some(page) = self
                .scrape_logged(
                    "website scrape (full page)",
                    website,
                    ScrapeOptions::full_page(),
                    &mut log,
                )
                .await
            {
                if page.content.chars().count() > content.chars().count() {
                    content = page.content;
                }
            }
        }

        if near_empty(&content) {
            log.record(AuditEntry::now(
                AuditKind::DataSource,
                "website analysis",
                AuditDetail {
                    url: Some(website.to_string()),
                    success: false,
                    summary: Some("content near-empty after full-page retry".to_string()),
                    ..AuditDetail::default()
                },
            ));
            return (Sourced::degraded("website content near-empty after retry"), log);
        }

        let prompt = prompts::website_analysis_prompt(&input.company_name, &content);
        let request = AnalysisRequest::new(prompt).with_system(prompts::ANALYST_SYSTEM);
        let Some(outcome) = self
            .analyze_logged("website analysis", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("website analysis call failed"), log);
        };

        let analysis = match structured::<WebsiteAnalysisWire>(&outcome.text) {
            Decoded::Parsed(wire) => WebsiteAnalysis::from(wire),
            // Literal fallback: keep the raw reading rather than dropping
            // the source.
            Decoded::Unparsed(raw) => WebsiteAnalysis {
                notes: Some(prompts::truncate(&raw, 2000)),
                ..WebsiteAnalysis::default()
            },
        };

        log.cite(
            CitationMeta {
                kind: CitationKind::CompanyWebsite,
                source: site_label(website),
                url: Some(website.to_string()),
                snapshot: Some(serde_json::json!({
                    "chars": content.chars().count()
                })),
                query: None,
                confidence: 0.9,
            },
            None,
        );

        (Sourced::Ok(analysis), log)
    }
}

fn known_website(input: &AssessmentInput) -> Option<String> {
    input
        .website
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(normalize_url)
}

/// Intake forms routinely omit the scheme.
fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

pub(super) fn near_empty(content: &str) -> bool {
    content.trim().chars().count() < MIN_USABLE_CHARS
}

/// Host portion of a URL, for citation source labels.
pub(super) fn site_label(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = stripped.split('/').next().unwrap_or(stripped);
    if host.is_empty() {
        url.to_string()
    } else {
        host.to_string()
    }
}
