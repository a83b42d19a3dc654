use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::workflows::assessment::roi::RoiCalculation;
use crate::workflows::assessment::scoring::OpportunityScore;
use crate::workflows::research::CompanyResearch;

/// One named step of the derivation: the literal inputs it consumed, the
/// arithmetic spelled out with the actual values, and the assumptions it
/// leaned on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationStep {
    pub name: String,
    pub inputs: Vec<String>,
    pub formula: String,
    pub output: String,
    pub success: bool,
    pub assumptions: Vec<String>,
}

/// Ordered explanation of every number and claim a report states. Generated
/// once alongside the report and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationTrace {
    pub steps: Vec<DerivationStep>,
}

impl DerivationTrace {
    pub fn step(&self, name: &str) -> Option<&DerivationStep> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// Plain-text rendering for the admin transcript.
    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(&mut out, "Derivation ({} steps)", self.steps.len()).expect("write header");
        for (index, step) in self.steps.iter().enumerate() {
            let marker = if step.success { "ok" } else { "unavailable" };
            writeln!(&mut out, "{:>2}. {} [{marker}]", index + 1, step.name).expect("write step");
            for input in &step.inputs {
                writeln!(&mut out, "      input: {input}").expect("write input");
            }
            writeln!(&mut out, "      formula: {}", step.formula).expect("write formula");
            writeln!(&mut out, "      output: {}", step.output).expect("write output");
            for assumption in &step.assumptions {
                writeln!(&mut out, "      assuming: {assumption}").expect("write assumption");
            }
        }
        out
    }
}

/// Builds the full derivation for one run: seven factor steps, the score
/// rollup, every ROI formula with its literal intermediates, and a research
/// coverage note. Pure assembly over values already computed.
pub fn explain(
    scoring: &OpportunityScore,
    roi: &RoiCalculation,
    research: Option<&CompanyResearch>,
) -> DerivationTrace {
    let mut steps = Vec::new();
    scoring_steps(scoring, &mut steps);
    roi_steps(roi, &mut steps);
    steps.push(research_step(research));
    DerivationTrace { steps }
}

fn scoring_steps(scoring: &OpportunityScore, steps: &mut Vec<DerivationStep>) {
    for component in &scoring.components {
        steps.push(DerivationStep {
            name: format!("score factor: {}", component.factor.label()),
            inputs: vec![
                format!(
                    "raw sub-score {} of {}",
                    component.raw, component.subscale_max
                ),
                format!("configured weight {}", component.weight),
            ],
            formula: format!(
                "round({} / {} x {}) = {}",
                component.raw, component.subscale_max, component.weight, component.weighted
            ),
            output: format!("{} weighted points", component.weighted),
            success: true,
            assumptions: vec![component.notes.clone()],
        });
    }

    let addends: Vec<String> = scoring
        .components
        .iter()
        .map(|component| component.weighted.to_string())
        .collect();
    steps.push(DerivationStep {
        name: "total opportunity score".to_string(),
        inputs: scoring
            .components
            .iter()
            .map(|component| format!("{} {}", component.weighted, component.factor.label()))
            .collect(),
        formula: format!("{} = {}", addends.join(" + "), scoring.total_score),
        output: format!("{} of {}", scoring.total_score, scoring.max_score),
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "score percentage".to_string(),
        inputs: vec![
            format!("total score {}", scoring.total_score),
            format!("maximum score {}", scoring.max_score),
        ],
        formula: format!(
            "{} / {} x 100 = {:.1}%",
            scoring.total_score, scoring.max_score, scoring.percentage
        ),
        output: format!("{:.1}%", scoring.percentage),
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "grade".to_string(),
        inputs: vec![format!("percentage {:.1}%", scoring.percentage)],
        formula: format!(
            "highest grade threshold at or below {:.1}%",
            scoring.percentage
        ),
        output: scoring.grade.clone(),
        success: true,
        assumptions: vec!["grade thresholds are inclusive lower bounds".to_string()],
    });

    steps.push(DerivationStep {
        name: "priority".to_string(),
        inputs: vec![format!("raw total {}", scoring.total_score)],
        formula: format!(
            "highest priority threshold at or below {}",
            scoring.total_score
        ),
        output: scoring.priority.label().to_string(),
        success: true,
        assumptions: Vec::new(),
    });
}

fn roi_steps(roi: &RoiCalculation, steps: &mut Vec<DerivationStep>) {
    let model = &roi.assumptions;
    let crew = roi.representative_crew;

    steps.push(DerivationStep {
        name: "implied annual revenue".to_string(),
        inputs: vec![
            format!("{crew} field workers (bracket midpoint)"),
            format!("{} revenue per worker", money(model.revenue_per_field_worker)),
        ],
        formula: format!(
            "{crew} x {} = {}",
            money(model.revenue_per_field_worker),
            money(roi.implied_annual_revenue)
        ),
        output: money(roi.implied_annual_revenue),
        success: true,
        assumptions: vec!["crew bracket midpoint stands in for exact headcount".to_string()],
    });

    steps.push(DerivationStep {
        name: "annual admin time cost".to_string(),
        inputs: vec![
            format!("{:.1} admin hours per week (bucket midpoint)", roi.weekly_admin_hours),
            format!("{} hourly admin rate", money(model.hourly_admin_rate)),
            format!("{:.0} working weeks per year", model.weeks_per_year),
        ],
        formula: format!(
            "{:.1} h/week x {}/h x {:.0} weeks = {}",
            roi.weekly_admin_hours,
            money(model.hourly_admin_rate),
            model.weeks_per_year,
            money(roi.annual_time_cost)
        ),
        output: money(roi.annual_time_cost),
        success: true,
        assumptions: Vec::new(),
    });

    money_cost_step(
        steps,
        "money cost: margin erosion",
        roi.money_costs.margin_erosion,
        format!(
            "{} x {} x {:.2} = {}",
            money(roi.implied_annual_revenue),
            percent(model.margin_erosion_rate),
            roi.urgency_multiplier,
            money(roi.money_costs.margin_erosion)
        ),
        "a declared job-costing or estimating pain",
        roi.urgency_multiplier,
    );
    money_cost_step(
        steps,
        "money cost: missed change orders",
        roi.money_costs.missed_change_orders,
        format!(
            "{} x {} x {:.2} = {}",
            money(roi.implied_annual_revenue),
            percent(model.change_order_leakage_rate),
            roi.urgency_multiplier,
            money(roi.money_costs.missed_change_orders)
        ),
        "a declared change-order pain",
        roi.urgency_multiplier,
    );
    money_cost_step(
        steps,
        "money cost: compliance overhead",
        roi.money_costs.compliance_overhead,
        format!(
            "{crew} workers x {} x {:.2} = {}",
            money(model.compliance_cost_per_worker),
            roi.urgency_multiplier,
            money(roi.money_costs.compliance_overhead)
        ),
        "a declared compliance, payroll, or safety pain",
        roi.urgency_multiplier,
    );

    steps.push(DerivationStep {
        name: "total annual cost of current state".to_string(),
        inputs: vec![
            format!("time cost {}", money(roi.annual_time_cost)),
            format!("margin erosion {}", money(roi.money_costs.margin_erosion)),
            format!(
                "missed change orders {}",
                money(roi.money_costs.missed_change_orders)
            ),
            format!(
                "compliance overhead {}",
                money(roi.money_costs.compliance_overhead)
            ),
        ],
        formula: format!(
            "{} + {} + {} + {} = {}",
            money(roi.annual_time_cost),
            money(roi.money_costs.margin_erosion),
            money(roi.money_costs.missed_change_orders),
            money(roi.money_costs.compliance_overhead),
            money(roi.total_annual_cost)
        ),
        output: money(roi.total_annual_cost),
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "seat count".to_string(),
        inputs: vec![
            format!("{crew} field crew"),
            format!("{} office seat buffer", model.office_seat_buffer),
            format!("{} seat minimum", model.minimum_seats),
        ],
        formula: format!(
            "max({crew} + {}, {}) = {} seats",
            model.office_seat_buffer, model.minimum_seats, roi.investment.seats
        ),
        output: format!("{} seats", roi.investment.seats),
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "investment".to_string(),
        inputs: vec![
            format!("{} per seat per month", money(model.monthly_price_per_seat)),
            format!("{} onboarding", money(model.onboarding_fee)),
            format!("{} training", money(model.training_fee)),
        ],
        formula: format!(
            "{} seats x {}/seat/month x 12 = {} recurring; {} + {} = {} one-time",
            roi.investment.seats,
            money(model.monthly_price_per_seat),
            money(roi.investment.recurring_annual),
            money(model.onboarding_fee),
            money(model.training_fee),
            money(roi.investment.one_time)
        ),
        output: format!("{} first year", money(roi.investment.first_year_total())),
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "projected annual savings".to_string(),
        inputs: vec![
            format!(
                "admin time: {} x {} = {}",
                money(roi.annual_time_cost),
                percent(model.admin_time_recovery_rate),
                money(roi.savings.recovered_admin_time)
            ),
            format!(
                "margin: {} x {} = {}",
                money(roi.money_costs.margin_erosion),
                percent(model.margin_recovery_rate),
                money(roi.savings.recovered_margin)
            ),
            format!(
                "change orders: {} x {} = {}",
                money(roi.money_costs.missed_change_orders),
                percent(model.change_order_recovery_rate),
                money(roi.savings.recovered_change_orders)
            ),
            format!(
                "compliance: {} x {} = {}",
                money(roi.money_costs.compliance_overhead),
                percent(model.compliance_recovery_rate),
                money(roi.savings.reduced_compliance_overhead)
            ),
        ],
        formula: format!(
            "{} + {} + {} + {} = {}",
            money(roi.savings.recovered_admin_time),
            money(roi.savings.recovered_margin),
            money(roi.savings.recovered_change_orders),
            money(roi.savings.reduced_compliance_overhead),
            money(roi.savings.total())
        ),
        output: money(roi.savings.total()),
        success: true,
        assumptions: vec!["recovery rates are published constants, not guarantees".to_string()],
    });

    steps.push(DerivationStep {
        name: "net annual value".to_string(),
        inputs: vec![
            format!("savings {}", money(roi.savings.total())),
            format!(
                "recurring investment {}",
                money(roi.investment.recurring_annual)
            ),
        ],
        formula: format!(
            "{} - {} = {}",
            money(roi.savings.total()),
            money(roi.investment.recurring_annual),
            money(roi.net_annual_value)
        ),
        output: money(roi.net_annual_value),
        success: true,
        assumptions: Vec::new(),
    });

    let roi_formula = format!(
        "{} / {} x 100, floored at 0",
        money(roi.net_annual_value),
        money(roi.investment.first_year_total())
    );
    steps.push(DerivationStep {
        name: "first-year return".to_string(),
        inputs: vec![
            format!("net annual value {}", money(roi.net_annual_value)),
            format!(
                "first-year investment {}",
                money(roi.investment.first_year_total())
            ),
        ],
        formula: roi_formula,
        output: if roi.roi_percentage > 0.0 {
            format!("{:.0}%", roi.roi_percentage)
        } else {
            "no measurable return yet".to_string()
        },
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "payback period".to_string(),
        inputs: vec![
            format!(
                "first-year investment {}",
                money(roi.investment.first_year_total())
            ),
            format!("monthly savings {}", money(roi.savings.total() / 12.0)),
        ],
        formula: format!(
            "{} / ({} / 12) = {:.1} months",
            money(roi.investment.first_year_total()),
            money(roi.savings.total()),
            roi.payback_months
        ),
        output: if roi.payback_months > 0.0 {
            format!("{:.1} months", roi.payback_months)
        } else {
            "no measurable return yet".to_string()
        },
        success: true,
        assumptions: Vec::new(),
    });

    steps.push(DerivationStep {
        name: "pain point cost table".to_string(),
        inputs: roi
            .pain_point_costs
            .iter()
            .map(|row| {
                format!(
                    "{}: {} annual cost x {} recovery = {}",
                    row.pain_point,
                    money(row.annual_cost),
                    percent(row.recovery_rate),
                    money(row.annual_savings)
                )
            })
            .collect(),
        formula: "keyword bucket lookup over the declared pain points".to_string(),
        output: format!("{} rows", roi.pain_point_costs.len()),
        success: true,
        assumptions: vec!["unrecognized pains fall into the default bucket".to_string()],
    });
}

fn money_cost_step(
    steps: &mut Vec<DerivationStep>,
    name: &str,
    amount: f64,
    active_formula: String,
    gate: &str,
    multiplier: f64,
) {
    let step = if amount > 0.0 {
        DerivationStep {
            name: name.to_string(),
            inputs: vec![format!("urgency multiplier {multiplier:.2}")],
            formula: active_formula,
            output: money(amount),
            success: true,
            assumptions: vec![format!("cost applies only with {gate}")],
        }
    } else {
        DerivationStep {
            name: name.to_string(),
            inputs: Vec::new(),
            formula: "matching pain point not declared".to_string(),
            output: money(0.0),
            success: true,
            assumptions: vec![format!("cost applies only with {gate}")],
        }
    };
    steps.push(step);
}

fn research_step(research: Option<&CompanyResearch>) -> DerivationStep {
    match research {
        Some(research) => DerivationStep {
            name: "research coverage".to_string(),
            inputs: populated_research_fields(research)
                .into_iter()
                .map(str::to_string)
                .collect(),
            formula: "presence check per research field".to_string(),
            output: format!(
                "{} of 7 research fields populated",
                research.populated_fields()
            ),
            success: true,
            assumptions: Vec::new(),
        },
        None => DerivationStep {
            name: "research coverage".to_string(),
            inputs: Vec::new(),
            formula: "presence check per research field".to_string(),
            output: "research unavailable; report renders without research sections".to_string(),
            success: false,
            assumptions: Vec::new(),
        },
    }
}

fn populated_research_fields(research: &CompanyResearch) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if research.basic_info.is_some() {
        fields.push("basic info");
    }
    if research.website_analysis.is_some() {
        fields.push("website analysis");
    }
    if research.competitors.is_some() {
        fields.push("competitor landscape");
    }
    if research.industry.is_some() {
        fields.push("industry insights");
    }
    if research.tooling.is_some() {
        fields.push("tooling analysis");
    }
    if research.knowledge.is_some() {
        fields.push("knowledge intelligence");
    }
    if research.sales_intelligence.is_some() {
        fields.push("sales intelligence");
    }
    fields
}

/// Whole-dollar rendering with thousands separators.
pub(super) fn money(amount: f64) -> String {
    let negative = amount < 0.0;
    let whole = amount.abs().round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub(super) fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
