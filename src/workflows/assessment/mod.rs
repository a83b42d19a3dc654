pub mod roi;
pub mod scoring;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

/// Trade vertical declared on the intake form. Drives search phrasing and
/// revenue assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeCategory {
    Electrical,
    Plumbing,
    Hvac,
    Roofing,
    Concrete,
    Framing,
    Excavation,
    Painting,
    GeneralContracting,
    Specialty,
}

impl TradeCategory {
    pub const fn label(self) -> &'static str {
        match self {
            TradeCategory::Electrical => "electrical",
            TradeCategory::Plumbing => "plumbing",
            TradeCategory::Hvac => "HVAC",
            TradeCategory::Roofing => "roofing",
            TradeCategory::Concrete => "concrete",
            TradeCategory::Framing => "framing",
            TradeCategory::Excavation => "excavation",
            TradeCategory::Painting => "painting",
            TradeCategory::GeneralContracting => "general contracting",
            TradeCategory::Specialty => "specialty trade",
        }
    }
}

/// Field-crew headcount bracket as collected on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrewSizeBracket {
    #[serde(rename = "1-4")]
    OneToFour,
    #[serde(rename = "5-9")]
    FiveToNine,
    #[serde(rename = "10-19")]
    TenToNineteen,
    #[serde(rename = "20-49")]
    TwentyToFortyNine,
    #[serde(rename = "50-99")]
    FiftyToNinetyNine,
    #[serde(rename = "100-249")]
    HundredToTwoFortyNine,
    #[serde(rename = "250+")]
    TwoFiftyPlus,
}

impl CrewSizeBracket {
    pub const fn ordered() -> [CrewSizeBracket; 7] {
        [
            CrewSizeBracket::OneToFour,
            CrewSizeBracket::FiveToNine,
            CrewSizeBracket::TenToNineteen,
            CrewSizeBracket::TwentyToFortyNine,
            CrewSizeBracket::FiftyToNinetyNine,
            CrewSizeBracket::HundredToTwoFortyNine,
            CrewSizeBracket::TwoFiftyPlus,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            CrewSizeBracket::OneToFour => "1-4",
            CrewSizeBracket::FiveToNine => "5-9",
            CrewSizeBracket::TenToNineteen => "10-19",
            CrewSizeBracket::TwentyToFortyNine => "20-49",
            CrewSizeBracket::FiftyToNinetyNine => "50-99",
            CrewSizeBracket::HundredToTwoFortyNine => "100-249",
            CrewSizeBracket::TwoFiftyPlus => "250+",
        }
    }

    /// Midpoint headcount used when a formula needs a single number.
    pub const fn representative_crew(self) -> u32 {
        match self {
            CrewSizeBracket::OneToFour => 3,
            CrewSizeBracket::FiveToNine => 7,
            CrewSizeBracket::TenToNineteen => 15,
            CrewSizeBracket::TwentyToFortyNine => 35,
            CrewSizeBracket::FiftyToNinetyNine => 75,
            CrewSizeBracket::HundredToTwoFortyNine => 175,
            CrewSizeBracket::TwoFiftyPlus => 300,
        }
    }
}

/// Weekly hours the office loses to manual administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminHoursBucket {
    #[serde(rename = "<5")]
    UnderFive,
    #[serde(rename = "5-10")]
    FiveToTen,
    #[serde(rename = "10-20")]
    TenToTwenty,
    #[serde(rename = "20+")]
    TwentyPlus,
}

impl AdminHoursBucket {
    pub const fn label(self) -> &'static str {
        match self {
            AdminHoursBucket::UnderFive => "<5",
            AdminHoursBucket::FiveToTen => "5-10",
            AdminHoursBucket::TenToTwenty => "10-20",
            AdminHoursBucket::TwentyPlus => "20+",
        }
    }

    /// Midpoint hours used by the ROI time-cost formula.
    pub const fn representative_hours(self) -> f64 {
        match self {
            AdminHoursBucket::UnderFive => 3.0,
            AdminHoursBucket::FiveToTen => 7.5,
            AdminHoursBucket::TenToTwenty => 15.0,
            AdminHoursBucket::TwentyPlus => 25.0,
        }
    }
}

/// How soon the prospect says they intend to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTimeline {
    Immediate,
    WithinQuarter,
    WithinTwoQuarters,
    WithinYear,
    Exploring,
}

impl DecisionTimeline {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionTimeline::Immediate => "immediate",
            DecisionTimeline::WithinQuarter => "1-3 months",
            DecisionTimeline::WithinTwoQuarters => "3-6 months",
            DecisionTimeline::WithinYear => "6-12 months",
            DecisionTimeline::Exploring => "exploring",
        }
    }
}

/// Intake form snapshot. Immutable once submitted; every downstream engine
/// reads from the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub trade: TradeCategory,
    pub crew_size: CrewSizeBracket,
    pub pain_points: Vec<String>,
    /// Self-reported operational urgency, 1 (none) to 10 (critical).
    pub urgency: u8,
    pub admin_hours: AdminHoursBucket,
    pub current_tools: Vec<String>,
    pub timeline: DecisionTimeline,
    /// Self-reported likelihood to purchase, 1 to 10.
    pub purchase_likelihood: u8,
    pub competitors: Vec<String>,
}

impl AssessmentInput {
    /// Urgency clamped into its declared 1..=10 range.
    pub fn bounded_urgency(&self) -> u8 {
        self.urgency.clamp(1, 10)
    }

    /// Purchase likelihood clamped into its declared 1..=10 range.
    pub fn bounded_likelihood(&self) -> u8 {
        self.purchase_likelihood.clamp(1, 10)
    }
}
