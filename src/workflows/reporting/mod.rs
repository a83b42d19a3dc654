//! Report composition. Pure assembly over the scoring, ROI, and research
//! outputs of one run; no I/O happens here. Optional research sections are
//! omitted rather than rendered as errors, and every number the report
//! states is backed by a step in the derivation trace.

mod derivation;
mod views;

pub use derivation::{explain, DerivationStep, DerivationTrace};
pub use views::{
    AdminReport, AttributedLine, ContactLine, FactorLine, ObjectionLine, Report, ResearchSection,
    RoiSection, SalesSection, ScoringSection,
};

use chrono::Utc;

use crate::audit::AuditTrail;
use crate::citations::CitationTracker;
use crate::workflows::assessment::roi::RoiCalculation;
use crate::workflows::assessment::scoring::OpportunityScore;
use crate::workflows::assessment::AssessmentInput;
use crate::workflows::research::CompanyResearch;

use derivation::money;
use views::return_summary;

/// Assembles the customer-facing report for one run.
pub fn compose_customer_report(
    scoring: &OpportunityScore,
    roi: &RoiCalculation,
    research: Option<&CompanyResearch>,
    input: &AssessmentInput,
) -> Report {
    Report {
        company_name: input.company_name.clone(),
        prepared_for: input.contact_email.clone(),
        generated_at: Utc::now(),
        summary: headline(scoring, roi, input),
        scoring: ScoringSection::from_score(scoring),
        roi: RoiSection::from_calculation(roi),
        research: research.map(ResearchSection::from_research),
        recommendations: scoring.recommendations.clone(),
        derivation: explain(scoring, roi, research),
    }
}

/// Assembles the internal report: the customer report plus sales
/// intelligence with citation badges, the citation register, and the audit
/// transcript.
pub fn compose_admin_report(
    scoring: &OpportunityScore,
    roi: &RoiCalculation,
    research: Option<&CompanyResearch>,
    input: &AssessmentInput,
    trail: &AuditTrail,
    citations: &CitationTracker,
) -> AdminReport {
    let customer = compose_customer_report(scoring, roi, research, input);
    let sales = research
        .and_then(|research| research.sales_intelligence.as_ref())
        .map(|sales| SalesSection::from_intelligence(sales, citations));

    AdminReport {
        customer,
        sales,
        citations: citations
            .all_in_order()
            .into_iter()
            .cloned()
            .collect(),
        audit_summary: *trail.summary(),
        transcript: trail.format_transcript(),
    }
}

fn headline(scoring: &OpportunityScore, roi: &RoiCalculation, input: &AssessmentInput) -> String {
    format!(
        "{} scores {} of {} (grade {}, {} priority); projected {} in annual savings with {}.",
        input.company_name,
        scoring.total_score,
        scoring.max_score,
        scoring.grade,
        scoring.priority.label(),
        money(roi.savings.total()),
        return_summary(roi),
    )
}
