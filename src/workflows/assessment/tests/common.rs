use crate::workflows::assessment::scoring::{ScoringConfig, ScoringEngine};
use crate::workflows::assessment::{
    AdminHoursBucket, AssessmentInput, CrewSizeBracket, DecisionTimeline, TradeCategory,
};

/// Mid-strength intake shared by the suites; tests mutate the fields they
/// exercise.
pub(super) fn intake() -> AssessmentInput {
    AssessmentInput {
        company_name: "Summit Roofing".to_string(),
        website: None,
        contact_email: None,
        trade: TradeCategory::Roofing,
        crew_size: CrewSizeBracket::TwentyToFortyNine,
        pain_points: vec![
            "scheduling conflicts".to_string(),
            "change order tracking".to_string(),
        ],
        urgency: 7,
        admin_hours: AdminHoursBucket::TenToTwenty,
        current_tools: vec!["Excel".to_string(), "QuickBooks".to_string()],
        timeline: DecisionTimeline::WithinQuarter,
        purchase_likelihood: 8,
        competitors: Vec::new(),
    }
}

pub(super) fn default_engine() -> ScoringEngine {
    ScoringEngine::new(ScoringConfig::default()).expect("default rubric is valid")
}

/// Every factor at its ceiling: scores 100 of 100 under default weights.
pub(super) fn maxed_intake() -> AssessmentInput {
    AssessmentInput {
        company_name: "Apex Mechanical".to_string(),
        website: None,
        contact_email: None,
        trade: TradeCategory::Hvac,
        crew_size: CrewSizeBracket::TwoFiftyPlus,
        pain_points: vec![
            "cash flow crunch".to_string(),
            "payroll errors".to_string(),
            "change orders slip".to_string(),
            "rework eating margins".to_string(),
        ],
        urgency: 10,
        admin_hours: AdminHoursBucket::TwentyPlus,
        current_tools: vec!["paper timesheets".to_string()],
        timeline: DecisionTimeline::Immediate,
        purchase_likelihood: 10,
        competitors: Vec::new(),
    }
}

/// Every factor near its floor.
pub(super) fn weak_intake() -> AssessmentInput {
    AssessmentInput {
        company_name: "Solo Painting".to_string(),
        website: None,
        contact_email: None,
        trade: TradeCategory::Painting,
        crew_size: CrewSizeBracket::OneToFour,
        pain_points: Vec::new(),
        urgency: 1,
        admin_hours: AdminHoursBucket::UnderFive,
        current_tools: vec!["Jobber".to_string()],
        timeline: DecisionTimeline::Exploring,
        purchase_likelihood: 1,
        competitors: Vec::new(),
    }
}
