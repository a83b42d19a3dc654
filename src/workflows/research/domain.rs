use serde::{Deserialize, Serialize};

use crate::workflows::assessment::AssessmentInput;

/// Headline facts pulled from search snippets before any scrape happens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicCompanyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_in_business: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_estimate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<String>,
}

/// Extracted reading of the prospect's own website.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteAnalysis {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_propositions: Vec<String>,
    /// Pain points inferred from the site, distinct from the ones declared
    /// on the intake form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inferred_pain_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<CompanyHistory>,
    /// Literal fallback when the extraction did not parse as structured
    /// output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positioning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strengths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weaknesses: Vec<String>,
}

/// Competitor task output: profiled rivals plus a synthesized read of the
/// field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitorLandscape {
    pub profiles: Vec<CompetitorProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positioning_summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustryInsights {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trends: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_size: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolAssessment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolingAnalysis {
    pub current_tools: Vec<ToolAssessment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub switching_considerations: Vec<String>,
}

/// An insight that names the knowledge-base record it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcedInsight {
    pub insight: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeIntelligence {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar_customers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub case_studies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<SourcedInsight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcedPoint {
    pub point: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectionResponse {
    pub objection: String,
    pub response: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactGuess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub decision_maker: bool,
}

/// Final synthesis consumed directly by sales. Every point carries a source
/// label by contract with the synthesis prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesIntelligence {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub talking_points: Vec<SourcedPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objections: Vec<ObjectionResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub competitive_advantages: Vec<SourcedPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buying_signals: Vec<SourcedPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<SourcedPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_contacts: Vec<ContactGuess>,
}

/// Research bundle built incrementally across the pipeline stages. A failed
/// step leaves its field `None` rather than failing the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResearch {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<BasicCompanyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_analysis: Option<WebsiteAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitors: Option<CompetitorLandscape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<IndustryInsights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooling: Option<ToolingAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgeIntelligence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_intelligence: Option<SalesIntelligence>,
}

impl CompanyResearch {
    /// Seeds the bundle with the identity fields the intake already knows.
    pub fn seeded_from(input: &AssessmentInput) -> Self {
        Self {
            company_name: input.company_name.clone(),
            website: input.website.clone(),
            contact_email: input.contact_email.clone(),
            basic_info: None,
            website_analysis: None,
            competitors: None,
            industry: None,
            tooling: None,
            knowledge: None,
            sales_intelligence: None,
        }
    }

    /// Count of research fields that actually got populated.
    pub fn populated_fields(&self) -> usize {
        [
            self.basic_info.is_some(),
            self.website_analysis.is_some(),
            self.competitors.is_some(),
            self.industry.is_some(),
            self.tooling.is_some(),
            self.knowledge.is_some(),
            self.sales_intelligence.is_some(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }
}

/// Sources are contractual on synthesized points; blank ones become an
/// explicit marker instead of an empty string.
pub(crate) fn attributed(source: String) -> String {
    if source.trim().is_empty() {
        "unattributed".to_string()
    } else {
        source
    }
}
