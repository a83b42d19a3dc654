use serde::Deserialize;

use crate::audit::{AuditDetail, AuditEntry, AuditKind};
use crate::citations::{CitationKind, CitationMeta};
use crate::workflows::assessment::AssessmentInput;

use super::decode::{structured, Decoded};
use super::domain::{
    attributed, CompanyResearch, ContactGuess, ObjectionResponse, SalesIntelligence, SourcedPoint,
};
use super::prompts;
use super::providers::{AnalysisRequest, Sourced};
use super::recorder::{AnalysisMeter, TaskLog};
use super::ResearchPipeline;

/// The synthesis consumes the whole bundle and needs room to answer.
const SYNTHESIS_MAX_TOKENS: u32 = 4096;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesIntelligenceWire {
    #[serde(default)]
    talking_points: Vec<PointWire>,
    #[serde(default)]
    objections: Vec<ObjectionWire>,
    #[serde(default)]
    competitive_advantages: Vec<PointWire>,
    #[serde(default)]
    buying_signals: Vec<PointWire>,
    #[serde(default)]
    risks: Vec<PointWire>,
    #[serde(default)]
    key_contacts: Vec<ContactWire>,
}

#[derive(Deserialize)]
struct PointWire {
    point: String,
    #[serde(default)]
    source: String,
}

#[derive(Deserialize)]
struct ObjectionWire {
    objection: String,
    response: String,
    #[serde(default)]
    source: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactWire {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: String,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    decision_maker: bool,
}

fn points(wire: Vec<PointWire>) -> Vec<SourcedPoint> {
    wire.into_iter()
        .map(|point| SourcedPoint {
            point: point.point,
            source: attributed(point.source),
        })
        .collect()
}

impl From<SalesIntelligenceWire> for SalesIntelligence {
    fn from(wire: SalesIntelligenceWire) -> Self {
        Self {
            talking_points: points(wire.talking_points),
            objections: wire
                .objections
                .into_iter()
                .map(|objection| ObjectionResponse {
                    objection: objection.objection,
                    response: objection.response,
                    source: attributed(objection.source),
                })
                .collect(),
            competitive_advantages: points(wire.competitive_advantages),
            buying_signals: points(wire.buying_signals),
            risks: points(wire.risks),
            key_contacts: wire
                .key_contacts
                .into_iter()
                .filter(|contact| !contact.role.trim().is_empty())
                .map(|contact| ContactGuess {
                    name: contact.name,
                    role: contact.role,
                    rationale: contact.rationale,
                    decision_maker: contact.decision_maker,
                })
                .collect(),
        }
    }
}

impl ResearchPipeline {
    /// Terminal synthesis: one generative call over the assembled bundle
    /// plus the intake form. Runs only after every earlier source settled.
    pub(super) async fn synthesize_sales_intelligence(
        &self,
        input: &AssessmentInput,
        research: &CompanyResearch,
        meter: &AnalysisMeter,
    ) -> (Sourced<SalesIntelligence>, TaskLog) {
        let mut log = TaskLog::new();

        let research_json = serde_json::to_string_pretty(research).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "research bundle failed to serialize");
            "{}".to_string()
        });
        let prompt = prompts::sales_intelligence_prompt(input, &research_json);
        let request = AnalysisRequest::new(prompt)
            .with_system(prompts::SALES_SYSTEM)
            .with_max_tokens(SYNTHESIS_MAX_TOKENS);

        let Some(outcome) = self
            .analyze_logged("sales intelligence", request, meter, &mut log)
            .await
        else {
            return (Sourced::degraded("sales synthesis call failed"), log);
        };

        match structured::<SalesIntelligenceWire>(&outcome.text) {
            Decoded::Parsed(wire) => {
                let intelligence = SalesIntelligence::from(wire);
                let linked = intelligence
                    .talking_points
                    .first()
                    .map(|point| point.point.clone());
                log.cite(
                    CitationMeta {
                        kind: CitationKind::GeneratedContent,
                        source: "sales synthesis".to_string(),
                        url: None,
                        snapshot: Some(serde_json::json!({
                            "populatedFields": research.populated_fields()
                        })),
                        query: None,
                        confidence: 0.6,
                    },
                    linked,
                );
                (Sourced::Ok(intelligence), log)
            }
            Decoded::Unparsed(_) => {
                log.record(AuditEntry::now(
                    AuditKind::DataSource,
                    "sales intelligence",
                    AuditDetail {
                        success: false,
                        summary: Some("response did not match the expected shape".to_string()),
                        ..AuditDetail::default()
                    },
                ));
                (Sourced::degraded("sales synthesis did not parse"), log)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_wire_maps_points_and_filters_roleless_contacts() {
        let raw = r#"{
            "talkingPoints": [{"point": "They bid against Rival Co weekly", "source": "competitor research"}],
            "objections": [{"objection": "Too expensive", "response": "Payback in under a year", "source": ""}],
            "buyingSignals": [{"point": "Urgency 9 of 10", "source": "intake form"}],
            "keyContacts": [
                {"name": "J. Smith", "role": "Operations Manager", "decisionMaker": true},
                {"name": null, "role": "  ", "decisionMaker": false}
            ]
        }"#;
        let wire: SalesIntelligenceWire = serde_json::from_str(raw).expect("fixture parses");
        let intelligence = SalesIntelligence::from(wire);

        assert_eq!(intelligence.talking_points.len(), 1);
        assert_eq!(intelligence.talking_points[0].source, "competitor research");
        assert_eq!(intelligence.objections[0].source, "unattributed");
        assert_eq!(intelligence.key_contacts.len(), 1);
        assert!(intelligence.key_contacts[0].decision_maker);
        assert!(intelligence.competitive_advantages.is_empty());
    }
}
