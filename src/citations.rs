use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier wrapper for recorded citations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationId(pub String);

impl fmt::Display for CitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a cited claim came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    GeneratedContent,
    StructuredData,
    WebResearch,
    SemanticLookup,
    CompanyWebsite,
    IndustryData,
}

impl CitationKind {
    pub const fn label(self) -> &'static str {
        match self {
            CitationKind::GeneratedContent => "generated_content",
            CitationKind::StructuredData => "structured_data",
            CitationKind::WebResearch => "web_research",
            CitationKind::SemanticLookup => "semantic_lookup",
            CitationKind::CompanyWebsite => "company_website",
            CitationKind::IndustryData => "industry_data",
        }
    }
}

/// Caller-supplied citation fields; the tracker assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationMeta {
    pub kind: CitationKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Confidence in [0, 1]; values outside the range are clamped on cite.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: CitationId,
    pub kind: CitationKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub cited_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub confidence: f32,
}

/// Per-run citation store. Content blocks are keyed by a SHA-256 of the
/// exact text, so identical blocks generated at different times share the
/// same lookup key.
#[derive(Debug, Default)]
pub struct CitationTracker {
    sequence: u64,
    citations: HashMap<CitationId, Citation>,
    content_links: HashMap<String, Vec<CitationId>>,
}

impl CitationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cite(&mut self, meta: CitationMeta) -> CitationId {
        self.sequence += 1;
        let id = CitationId(format!("cit-{:06}", self.sequence));
        let citation = Citation {
            id: id.clone(),
            kind: meta.kind,
            source: meta.source,
            url: meta.url,
            cited_at: Utc::now(),
            snapshot: meta.snapshot,
            query: meta.query,
            confidence: meta.confidence.clamp(0.0, 1.0),
        };
        self.citations.insert(id.clone(), citation);
        id
    }

    /// Links a content block to the citations backing it. Re-linking the
    /// same text replaces the earlier set. Ids that were never issued by
    /// this tracker are dropped so every linked id stays resolvable.
    pub fn link_content(&mut self, text: &str, ids: &[CitationId]) {
        let known: Vec<CitationId> = ids
            .iter()
            .filter(|id| {
                let exists = self.citations.contains_key(id);
                if !exists {
                    tracing::warn!(id = %id, "dropping link to unknown citation");
                }
                exists
            })
            .cloned()
            .collect();
        self.content_links.insert(content_key(text), known);
    }

    /// Citations backing the exact text, in the order they were linked.
    pub fn citations_for(&self, text: &str) -> Vec<&Citation> {
        self.content_links
            .get(&content_key(text))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.citations.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn citation(&self, id: &CitationId) -> Option<&Citation> {
        self.citations.get(id)
    }

    pub fn len(&self) -> usize {
        self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    /// Inline badge naming the sources behind a set of citations. Empty
    /// input renders as an empty string, never a bracket pair.
    pub fn format_badge(&self, ids: &[CitationId]) -> String {
        if ids.is_empty() {
            return String::new();
        }
        let labels: Vec<String> = ids
            .iter()
            .map(|id| match self.citations.get(id) {
                Some(citation) => citation.source.clone(),
                None => id.to_string(),
            })
            .collect();
        format!("[sources: {}]", labels.join(", "))
    }

    /// All citations in issue order, for report rendering.
    pub fn all_in_order(&self) -> Vec<&Citation> {
        let mut all: Vec<&Citation> = self.citations.values().collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        all
    }
}

fn content_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
