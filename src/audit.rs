use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Character budget for prompt/query previews in the rendered transcript.
const PREVIEW_BUDGET: usize = 160;

/// Kind of external work or bookkeeping an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    GenerativeQuery,
    KnowledgeQuery,
    WebSearch,
    WebScrape,
    DataSource,
    Calculation,
    Error,
}

impl AuditKind {
    pub const fn ordered() -> [AuditKind; 7] {
        [
            AuditKind::GenerativeQuery,
            AuditKind::KnowledgeQuery,
            AuditKind::WebSearch,
            AuditKind::WebScrape,
            AuditKind::DataSource,
            AuditKind::Calculation,
            AuditKind::Error,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            AuditKind::GenerativeQuery => "generative_query",
            AuditKind::KnowledgeQuery => "knowledge_query",
            AuditKind::WebSearch => "web_search",
            AuditKind::WebScrape => "web_scrape",
            AuditKind::DataSource => "data_source",
            AuditKind::Calculation => "calculation",
            AuditKind::Error => "error",
        }
    }
}

/// Details bag attached to an entry. Only the fields that apply are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub kind: AuditKind,
    pub action: String,
    pub detail: AuditDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AuditEntry {
    pub fn now(kind: AuditKind, action: impl Into<String>, detail: AuditDetail) -> Self {
        Self {
            at: Utc::now(),
            kind,
            action: action.into(),
            detail,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Running counters kept in lockstep with the entry list. Updated inside
/// [`AuditTrail::append`], never recomputed after the fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub generative_queries: u32,
    pub knowledge_queries: u32,
    pub web_searches: u32,
    pub web_scrapes: u32,
    pub data_sources: u32,
    pub calculations: u32,
    pub errors: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl AuditSummary {
    fn absorb(&mut self, entry: &AuditEntry) {
        match entry.kind {
            AuditKind::GenerativeQuery => self.generative_queries += 1,
            AuditKind::KnowledgeQuery => self.knowledge_queries += 1,
            AuditKind::WebSearch => self.web_searches += 1,
            AuditKind::WebScrape => self.web_scrapes += 1,
            AuditKind::DataSource => self.data_sources += 1,
            AuditKind::Calculation => self.calculations += 1,
            AuditKind::Error => self.errors += 1,
        }
        if let Some(tokens) = entry.detail.input_tokens {
            self.input_tokens += u64::from(tokens);
        }
        if let Some(tokens) = entry.detail.output_tokens {
            self.output_tokens += u64::from(tokens);
        }
    }

    pub const fn count_for(&self, kind: AuditKind) -> u32 {
        match kind {
            AuditKind::GenerativeQuery => self.generative_queries,
            AuditKind::KnowledgeQuery => self.knowledge_queries,
            AuditKind::WebSearch => self.web_searches,
            AuditKind::WebScrape => self.web_scrapes,
            AuditKind::DataSource => self.data_sources,
            AuditKind::Calculation => self.calculations,
            AuditKind::Error => self.errors,
        }
    }
}

/// Append-only event log covering every external call a pipeline run makes.
/// Internal debugging and compliance surface; never shown to the prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
    entries: Vec<AuditEntry>,
    summary: AuditSummary,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            total_duration_ms: None,
            entries: Vec::new(),
            summary: AuditSummary::default(),
        }
    }

    /// Appends the entry and folds it into the summary in the same call.
    pub fn append(&mut self, entry: AuditEntry) {
        self.summary.absorb(&entry);
        self.entries.push(entry);
    }

    /// Stamps the completion time once. Repeat calls leave the first stamp
    /// untouched.
    pub fn finalize(&mut self) {
        if self.completed_at.is_some() {
            return;
        }
        let now = Utc::now();
        self.completed_at = Some(now);
        self.total_duration_ms = Some(
            (now - self.started_at)
                .num_milliseconds()
                .max(0) as u64,
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn summary(&self) -> &AuditSummary {
        &self.summary
    }

    /// Deterministic human-readable transcript of the run.
    pub fn format_transcript(&self) -> String {
        let mut out = String::new();
        writeln!(&mut out, "=== research audit trail ===").expect("write transcript line");
        writeln!(
            &mut out,
            "started:   {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .expect("write transcript line");
        match self.completed_at {
            Some(completed) => {
                writeln!(
                    &mut out,
                    "completed: {}",
                    completed.format("%Y-%m-%d %H:%M:%S UTC")
                )
                .expect("write transcript line");
                if let Some(total) = self.total_duration_ms {
                    writeln!(&mut out, "duration:  {total} ms").expect("write transcript line");
                }
            }
            None => writeln!(&mut out, "completed: (still running)").expect("write transcript line"),
        }
        writeln!(&mut out).expect("write transcript line");

        for (index, entry) in self.entries.iter().enumerate() {
            writeln!(
                &mut out,
                "{:>3}. [{}] {} ({})",
                index + 1,
                entry.kind.label(),
                entry.action,
                if entry.detail.success { "ok" } else { "failed" }
            )
            .expect("write transcript line");

            if let Some(prompt) = &entry.detail.prompt {
                writeln!(&mut out, "     prompt: {}", elide(prompt)).expect("write transcript line");
            }
            if let Some(query) = &entry.detail.query {
                writeln!(&mut out, "     query: {}", elide(query)).expect("write transcript line");
            }
            if let Some(url) = &entry.detail.url {
                writeln!(&mut out, "     url: {url}").expect("write transcript line");
            }
            if let Some(summary) = &entry.detail.summary {
                writeln!(&mut out, "     result: {}", elide(summary))
                    .expect("write transcript line");
            }
            if let (Some(input), Some(output)) =
                (entry.detail.input_tokens, entry.detail.output_tokens)
            {
                writeln!(&mut out, "     tokens: {input} in / {output} out")
                    .expect("write transcript line");
            }
            if !entry.detail.sources.is_empty() {
                writeln!(&mut out, "     sources: {}", entry.detail.sources.join(", "))
                    .expect("write transcript line");
            }
            if let Some(duration) = entry.duration_ms {
                writeln!(&mut out, "     took: {duration} ms").expect("write transcript line");
            }
        }

        writeln!(&mut out).expect("write transcript line");
        writeln!(&mut out, "--- summary ---").expect("write transcript line");
        for kind in AuditKind::ordered() {
            writeln!(
                &mut out,
                "{}: {}",
                kind.label(),
                self.summary.count_for(kind)
            )
            .expect("write transcript line");
        }
        writeln!(
            &mut out,
            "tokens: {} in / {} out",
            self.summary.input_tokens, self.summary.output_tokens
        )
        .expect("write transcript line");

        out
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates to the preview budget, marking the cut and the original length.
fn elide(text: &str) -> String {
    let total = text.chars().count();
    if total <= PREVIEW_BUDGET {
        return text.to_string();
    }
    let preview: String = text.chars().take(PREVIEW_BUDGET).collect();
    format!("{preview}… ({total} chars)")
}
