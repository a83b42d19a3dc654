use super::super::{AdminHoursBucket, AssessmentInput, CrewSizeBracket, DecisionTimeline};
use super::config::ScoringFactor;

/// Pain-point phrasing that marks a revenue-threatening problem rather than
/// an inconvenience.
const SEVERE_PAIN_MARKERS: [&str; 7] = [
    "cash flow",
    "payroll",
    "compliance",
    "losing bids",
    "change order",
    "rework",
    "overtime",
];

/// Tool names that indicate a manual, pre-software workflow.
const MANUAL_TOOL_MARKERS: [&str; 6] = [
    "spreadsheet",
    "excel",
    "paper",
    "whiteboard",
    "text message",
    "phone call",
];

pub(crate) struct RawFactor {
    pub factor: ScoringFactor,
    pub raw: u16,
    pub notes: String,
}

/// Scores every factor on its own bounded sub-scale. All tiers are monotonic
/// in their inputs; interpolation only ever happens inside a tier.
pub(crate) fn score_factors(input: &AssessmentInput) -> Vec<RawFactor> {
    vec![
        urgency_factor(input),
        pain_severity_factor(input),
        company_size_factor(input),
        timeline_factor(input),
        likelihood_factor(input),
        friction_factor(input),
        budget_factor(input),
    ]
}

fn urgency_factor(input: &AssessmentInput) -> RawFactor {
    let urgency = u16::from(input.bounded_urgency());
    let raw = match urgency {
        9..=10 => 20,
        7..=8 => 14 + (urgency - 7) * 3,
        5..=6 => 10 + (urgency - 5) * 2,
        3..=4 => 6 + (urgency - 3) * 2,
        _ => urgency * 2,
    };
    let notes = if urgency >= 9 {
        format!("urgency {urgency}/10 in the critical tier")
    } else {
        format!("urgency {urgency}/10")
    };
    RawFactor {
        factor: ScoringFactor::Urgency,
        raw,
        notes,
    }
}

fn pain_severity_factor(input: &AssessmentInput) -> RawFactor {
    let declared = input.pain_points.len() as u16;
    let base = (declared * 3).min(12);

    let severe = input
        .pain_points
        .iter()
        .filter(|pain| {
            let lowered = pain.to_lowercase();
            SEVERE_PAIN_MARKERS
                .iter()
                .any(|marker| lowered.contains(marker))
        })
        .count() as u16;
    let severity_bonus = (severe * 2).min(8);

    RawFactor {
        factor: ScoringFactor::PainSeverity,
        raw: (base + severity_bonus).min(20),
        notes: format!("{declared} pain point(s) declared, {severe} revenue-threatening"),
    }
}

fn company_size_factor(input: &AssessmentInput) -> RawFactor {
    let raw = match input.crew_size {
        CrewSizeBracket::OneToFour => 3,
        CrewSizeBracket::FiveToNine => 5,
        CrewSizeBracket::TenToNineteen => 7,
        CrewSizeBracket::TwentyToFortyNine => 9,
        CrewSizeBracket::FiftyToNinetyNine => 11,
        CrewSizeBracket::HundredToTwoFortyNine => 13,
        CrewSizeBracket::TwoFiftyPlus => 15,
    };
    RawFactor {
        factor: ScoringFactor::CompanySize,
        raw,
        notes: format!("crew bracket {}", input.crew_size.label()),
    }
}

fn timeline_factor(input: &AssessmentInput) -> RawFactor {
    let raw = match input.timeline {
        DecisionTimeline::Immediate => 15,
        DecisionTimeline::WithinQuarter => 12,
        DecisionTimeline::WithinTwoQuarters => 9,
        DecisionTimeline::WithinYear => 6,
        DecisionTimeline::Exploring => 3,
    };
    RawFactor {
        factor: ScoringFactor::Timeline,
        raw,
        notes: format!("decision timeline {}", input.timeline.label()),
    }
}

fn likelihood_factor(input: &AssessmentInput) -> RawFactor {
    let likelihood = u16::from(input.bounded_likelihood());
    let raw = match likelihood {
        9..=10 => 15,
        7..=8 => 11 + (likelihood - 7) * 2,
        5..=6 => 7 + (likelihood - 5) * 2,
        3..=4 => 3 + (likelihood - 3) * 2,
        _ => likelihood,
    };
    RawFactor {
        factor: ScoringFactor::Likelihood,
        raw,
        notes: format!("stated purchase likelihood {likelihood}/10"),
    }
}

fn friction_factor(input: &AssessmentInput) -> RawFactor {
    let hours_points = match input.admin_hours {
        AdminHoursBucket::UnderFive => 1,
        AdminHoursBucket::FiveToTen => 3,
        AdminHoursBucket::TenToTwenty => 5,
        AdminHoursBucket::TwentyPlus => 7,
    };

    let (tool_points, tool_note) = if runs_manual(input) {
        (3, "manual workflow")
    } else if input.current_tools.len() >= 3 {
        (2, "fragmented stack")
    } else {
        (0, "consolidated stack")
    };

    RawFactor {
        factor: ScoringFactor::Friction,
        raw: (hours_points + tool_points).min(10),
        notes: format!(
            "{} admin hours weekly, {tool_note}",
            input.admin_hours.label()
        ),
    }
}

fn budget_factor(input: &AssessmentInput) -> RawFactor {
    let mut raw: u16 = 0;
    let mut signals = Vec::new();

    if input.crew_size.representative_crew() >= CrewSizeBracket::FiftyToNinetyNine.representative_crew() {
        raw += 2;
        signals.push("headcount supports software spend");
    }
    if input.bounded_urgency() >= 7 {
        raw += 1;
        signals.push("urgency implies allocated budget");
    }
    if input.bounded_likelihood() >= 7 {
        raw += 2;
        signals.push("intent signals active budget");
    }

    let notes = if signals.is_empty() {
        "no budget indicators".to_string()
    } else {
        signals.join("; ")
    };
    RawFactor {
        factor: ScoringFactor::BudgetIndicators,
        raw: raw.min(5),
        notes,
    }
}

pub(crate) fn runs_manual(input: &AssessmentInput) -> bool {
    if input.current_tools.is_empty() {
        return true;
    }
    input.current_tools.iter().any(|tool| {
        let lowered = tool.to_lowercase();
        MANUAL_TOOL_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
    })
}

/// Independent rule checks; each firing rule appends one recommendation.
pub(crate) fn recommendations(input: &AssessmentInput) -> Vec<String> {
    let mut notes = Vec::new();

    if input.pain_points.len() > 5 {
        notes.push(format!(
            "{} separate pain points suggest tool sprawl; lead with the integrated-platform story.",
            input.pain_points.len()
        ));
    }
    if input.timeline == DecisionTimeline::Immediate {
        notes.push(
            "Decision window is immediate; propose fast-track onboarding in the first call."
                .to_string(),
        );
    }
    if !input.competitors.is_empty() {
        notes.push(format!(
            "Prospect is actively evaluating {}; prepare a head-to-head comparison.",
            input.competitors.join(", ")
        ));
    }
    if input.bounded_urgency() >= 8 && input.bounded_likelihood() <= 4 {
        notes.push(
            "High urgency with low stated intent; nurture with ROI evidence before a hard pitch."
                .to_string(),
        );
    }
    if input.admin_hours == AdminHoursBucket::TwentyPlus {
        notes.push(
            "Office loses 20+ hours weekly to admin; quantify the time-savings case first."
                .to_string(),
        );
    }
    if matches!(
        input.crew_size,
        CrewSizeBracket::HundredToTwoFortyNine | CrewSizeBracket::TwoFiftyPlus
    ) {
        notes.push(
            "Enterprise-scale crew; involve a solutions engineer before the demo.".to_string(),
        );
    }
    if runs_manual(input) {
        notes.push(
            "Current workflow is manual; demo double-entry elimination end to end.".to_string(),
        );
    }

    notes
}
