use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::AuditSummary;
use crate::citations::{Citation, CitationId, CitationTracker};
use crate::workflows::assessment::roi::{MoneyCosts, PainPointCost, RoiCalculation};
use crate::workflows::assessment::scoring::{OpportunityScore, Priority};
use crate::workflows::research::{CompanyResearch, SalesIntelligence, SourcedPoint};

use super::derivation::{money, DerivationTrace};

/// Customer-facing report: the scored opportunity, the financial case, and
/// whatever research survived, narrated without internal surfaces. Built
/// once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_for: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub scoring: ScoringSection,
    pub roi: RoiSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchSection>,
    pub recommendations: Vec<String>,
    pub derivation: DerivationTrace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringSection {
    pub grade: String,
    pub priority: Priority,
    pub total_score: u16,
    pub max_score: u16,
    pub percentage: f64,
    pub factors: Vec<FactorLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorLine {
    pub factor: String,
    pub raw: u16,
    pub subscale_max: u16,
    pub weight: u16,
    pub weighted: u16,
    pub notes: String,
}

impl ScoringSection {
    pub(super) fn from_score(scoring: &OpportunityScore) -> Self {
        Self {
            grade: scoring.grade.clone(),
            priority: scoring.priority,
            total_score: scoring.total_score,
            max_score: scoring.max_score,
            percentage: scoring.percentage,
            factors: scoring
                .components
                .iter()
                .map(|component| FactorLine {
                    factor: component.factor.label().to_string(),
                    raw: component.raw,
                    subscale_max: component.subscale_max,
                    weight: component.weight,
                    weighted: component.weighted,
                    notes: component.notes.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiSection {
    pub representative_crew: u32,
    pub implied_annual_revenue: f64,
    pub weekly_admin_hours: f64,
    pub annual_time_cost: f64,
    pub money_costs: MoneyCosts,
    pub total_annual_cost: f64,
    pub seats: u32,
    pub recurring_annual_investment: f64,
    pub one_time_investment: f64,
    pub annual_savings: f64,
    pub net_annual_value: f64,
    /// "187% first-year return; payback in 4.2 months", or the floored
    /// wording when the numbers do not get there.
    pub return_summary: String,
    pub pain_points: Vec<PainPointCost>,
}

impl RoiSection {
    pub(super) fn from_calculation(roi: &RoiCalculation) -> Self {
        Self {
            representative_crew: roi.representative_crew,
            implied_annual_revenue: roi.implied_annual_revenue,
            weekly_admin_hours: roi.weekly_admin_hours,
            annual_time_cost: roi.annual_time_cost,
            money_costs: roi.money_costs,
            total_annual_cost: roi.total_annual_cost,
            seats: roi.investment.seats,
            recurring_annual_investment: roi.investment.recurring_annual,
            one_time_investment: roi.investment.one_time,
            annual_savings: roi.savings.total(),
            net_annual_value: roi.net_annual_value,
            return_summary: return_summary(roi),
            pain_points: roi.pain_point_costs.clone(),
        }
    }
}

pub(super) fn return_summary(roi: &RoiCalculation) -> String {
    if roi.roi_percentage > 0.0 && roi.payback_months > 0.0 {
        format!(
            "{:.0}% first-year return; payback in {:.1} months",
            roi.roi_percentage, roi.payback_months
        )
    } else {
        "no measurable return yet at the stated assumptions".to_string()
    }
}

/// Research findings reshaped for the prospect. Only present when the
/// research pipeline ran; inner lists are empty rather than absent when a
/// source degraded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub services: Vec<String>,
    pub technologies: Vec<String>,
    pub value_propositions: Vec<String>,
    pub inferred_pain_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_summary: Option<String>,
    pub industry_trends: Vec<String>,
    pub industry_challenges: Vec<String>,
    pub similar_customers: Vec<String>,
    pub case_studies: Vec<String>,
}

impl ResearchSection {
    pub(super) fn from_research(research: &CompanyResearch) -> Self {
        let basic = research.basic_info.as_ref();
        let website_analysis = research.website_analysis.as_ref();

        let services = basic
            .map(|info| info.services.clone())
            .filter(|services| !services.is_empty())
            .or_else(|| website_analysis.map(|analysis| analysis.services.clone()))
            .unwrap_or_default();

        Self {
            website: research.website.clone(),
            overview: basic.and_then(|info| info.description.clone()),
            location: basic.and_then(|info| info.location.clone()),
            services,
            technologies: website_analysis
                .map(|analysis| analysis.technologies.clone())
                .unwrap_or_default(),
            value_propositions: website_analysis
                .map(|analysis| analysis.value_propositions.clone())
                .unwrap_or_default(),
            inferred_pain_points: website_analysis
                .map(|analysis| analysis.inferred_pain_points.clone())
                .unwrap_or_default(),
            competitor_summary: research
                .competitors
                .as_ref()
                .and_then(|landscape| landscape.positioning_summary.clone()),
            industry_trends: research
                .industry
                .as_ref()
                .map(|industry| industry.trends.clone())
                .unwrap_or_default(),
            industry_challenges: research
                .industry
                .as_ref()
                .map(|industry| industry.challenges.clone())
                .unwrap_or_default(),
            similar_customers: research
                .knowledge
                .as_ref()
                .map(|knowledge| knowledge.similar_customers.clone())
                .unwrap_or_default(),
            case_studies: research
                .knowledge
                .as_ref()
                .map(|knowledge| knowledge.case_studies.clone())
                .unwrap_or_default(),
        }
    }
}

/// Internal report: the customer report plus the sales surfaces the
/// prospect never sees, with citation badges resolved per claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminReport {
    pub customer: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesSection>,
    pub citations: Vec<Citation>,
    pub audit_summary: AuditSummary,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSection {
    pub talking_points: Vec<AttributedLine>,
    pub objections: Vec<ObjectionLine>,
    pub competitive_advantages: Vec<AttributedLine>,
    pub buying_signals: Vec<AttributedLine>,
    pub risks: Vec<AttributedLine>,
    pub key_contacts: Vec<ContactLine>,
}

/// A sourced claim with its citation badge, empty when nothing backs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedLine {
    pub text: String,
    pub source: String,
    pub sources_badge: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectionLine {
    pub objection: String,
    pub response: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub decision_maker: bool,
}

impl SalesSection {
    pub(super) fn from_intelligence(
        sales: &SalesIntelligence,
        citations: &CitationTracker,
    ) -> Self {
        let attributed = |points: &[SourcedPoint]| {
            points
                .iter()
                .map(|point| AttributedLine {
                    text: point.point.clone(),
                    source: point.source.clone(),
                    sources_badge: badge_for(citations, &point.point),
                })
                .collect::<Vec<_>>()
        };

        Self {
            talking_points: attributed(&sales.talking_points),
            objections: sales
                .objections
                .iter()
                .map(|objection| ObjectionLine {
                    objection: objection.objection.clone(),
                    response: objection.response.clone(),
                    source: objection.source.clone(),
                })
                .collect(),
            competitive_advantages: attributed(&sales.competitive_advantages),
            buying_signals: attributed(&sales.buying_signals),
            risks: attributed(&sales.risks),
            key_contacts: sales
                .key_contacts
                .iter()
                .map(|contact| ContactLine {
                    name: contact.name.clone(),
                    role: contact.role.clone(),
                    rationale: contact.rationale.clone(),
                    decision_maker: contact.decision_maker,
                })
                .collect(),
        }
    }
}

fn badge_for(citations: &CitationTracker, text: &str) -> String {
    let ids: Vec<CitationId> = citations
        .citations_for(text)
        .into_iter()
        .map(|citation| citation.id.clone())
        .collect();
    citations.format_badge(&ids)
}

impl Report {
    /// Plain-text rendering of the customer report, derivation included.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        writeln!(&mut out, "Opportunity Report: {}", self.company_name).expect("write title");
        if let Some(prepared_for) = &self.prepared_for {
            writeln!(&mut out, "Prepared for {prepared_for}").expect("write recipient");
        }
        writeln!(&mut out, "{}", self.summary).expect("write summary");
        out.push('\n');

        writeln!(
            &mut out,
            "Score: {} of {} ({:.1}%), grade {}, {} priority",
            self.scoring.total_score,
            self.scoring.max_score,
            self.scoring.percentage,
            self.scoring.grade,
            self.scoring.priority.label()
        )
        .expect("write score line");
        for factor in &self.scoring.factors {
            writeln!(
                &mut out,
                "  {}: {} of {} raw, {} of {} weighted ({})",
                factor.factor,
                factor.raw,
                factor.subscale_max,
                factor.weighted,
                factor.weight,
                factor.notes
            )
            .expect("write factor line");
        }
        out.push('\n');

        render_roi(&mut out, &self.roi);

        if let Some(research) = &self.research {
            render_research(&mut out, research);
        }

        if !self.recommendations.is_empty() {
            writeln!(&mut out, "Recommendations:").expect("write recommendations header");
            for recommendation in &self.recommendations {
                writeln!(&mut out, "  - {recommendation}").expect("write recommendation");
            }
            out.push('\n');
        }

        out.push_str(&self.derivation.render());
        out
    }
}

fn render_roi(out: &mut String, roi: &RoiSection) {
    writeln!(
        out,
        "Current state cost: {} per year ({} admin time + {} operational losses)",
        money(roi.total_annual_cost),
        money(roi.annual_time_cost),
        money(roi.money_costs.total())
    )
    .expect("write cost line");
    writeln!(
        out,
        "Investment: {} seats at {} per year recurring, {} one-time",
        roi.seats,
        money(roi.recurring_annual_investment),
        money(roi.one_time_investment)
    )
    .expect("write investment line");
    writeln!(
        out,
        "Projected savings: {} per year, net {}; {}",
        money(roi.annual_savings),
        money(roi.net_annual_value),
        roi.return_summary
    )
    .expect("write savings line");
    if !roi.pain_points.is_empty() {
        writeln!(out, "Where the cost sits:").expect("write pain header");
        for row in &roi.pain_points {
            writeln!(
                out,
                "  {}: {} per year; {}; recovers {}",
                row.pain_point,
                money(row.annual_cost),
                row.solution,
                money(row.annual_savings)
            )
            .expect("write pain row");
        }
    }
    out.push('\n');
}

fn render_research(out: &mut String, research: &ResearchSection) {
    writeln!(out, "About the company:").expect("write research header");
    if let Some(website) = &research.website {
        writeln!(out, "  Website: {website}").expect("write website");
    }
    if let Some(overview) = &research.overview {
        writeln!(out, "  {overview}").expect("write overview");
    }
    if let Some(location) = &research.location {
        writeln!(out, "  Based in {location}").expect("write location");
    }
    if !research.services.is_empty() {
        writeln!(out, "  Services: {}", research.services.join(", ")).expect("write services");
    }
    if !research.technologies.is_empty() {
        writeln!(out, "  Current stack: {}", research.technologies.join(", "))
            .expect("write technologies");
    }
    if !research.inferred_pain_points.is_empty() {
        writeln!(
            out,
            "  Operational friction we noticed: {}",
            research.inferred_pain_points.join(", ")
        )
        .expect("write inferred pains");
    }
    if let Some(summary) = &research.competitor_summary {
        writeln!(out, "  Competitive picture: {summary}").expect("write competitor summary");
    }
    if !research.industry_trends.is_empty() {
        writeln!(
            out,
            "  Industry trends: {}",
            research.industry_trends.join("; ")
        )
        .expect("write trends");
    }
    if !research.case_studies.is_empty() {
        writeln!(
            out,
            "  Results from similar contractors: {}",
            research.case_studies.join("; ")
        )
        .expect("write case studies");
    }
    out.push('\n');
}

impl AdminReport {
    /// Full internal document: customer report, sales intelligence with
    /// badges, the citation register, and the audit transcript.
    pub fn render_text(&self) -> String {
        let mut out = self.customer.render_text();
        out.push('\n');

        if let Some(sales) = &self.sales {
            render_sales(&mut out, sales);
        }

        if !self.citations.is_empty() {
            writeln!(&mut out, "Citations ({}):", self.citations.len())
                .expect("write citations header");
            for citation in &self.citations {
                let location = citation
                    .url
                    .as_deref()
                    .or(citation.query.as_deref())
                    .unwrap_or("-");
                writeln!(
                    &mut out,
                    "  {} [{}] {} (confidence {:.2}) {}",
                    citation.id,
                    citation.kind.label(),
                    citation.source,
                    citation.confidence,
                    location
                )
                .expect("write citation line");
            }
            out.push('\n');
        }

        out.push_str(&self.transcript);
        out
    }
}

fn render_sales(out: &mut String, sales: &SalesSection) {
    writeln!(out, "Sales intelligence (internal):").expect("write sales header");
    for line in &sales.talking_points {
        writeln!(
            out,
            "  talk: {} (source: {}) {}",
            line.text, line.source, line.sources_badge
        )
        .expect("write talking point");
    }
    for objection in &sales.objections {
        writeln!(
            out,
            "  objection: {} -> {} (source: {})",
            objection.objection, objection.response, objection.source
        )
        .expect("write objection");
    }
    for line in &sales.competitive_advantages {
        writeln!(out, "  edge: {} (source: {})", line.text, line.source).expect("write advantage");
    }
    for line in &sales.buying_signals {
        writeln!(out, "  signal: {} (source: {})", line.text, line.source).expect("write signal");
    }
    for line in &sales.risks {
        writeln!(out, "  risk: {} (source: {})", line.text, line.source).expect("write risk");
    }
    for contact in &sales.key_contacts {
        let name = contact.name.as_deref().unwrap_or("unknown");
        let marker = if contact.decision_maker {
            " [decision maker]"
        } else {
            ""
        };
        writeln!(out, "  contact: {name}, {}{marker}", contact.role).expect("write contact");
    }
    out.push('\n');
}
