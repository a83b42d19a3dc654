use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Factors permitted in the opportunity rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFactor {
    Urgency,
    PainSeverity,
    CompanySize,
    Timeline,
    Likelihood,
    Friction,
    BudgetIndicators,
}

impl ScoringFactor {
    pub const fn ordered() -> [ScoringFactor; 7] {
        [
            ScoringFactor::Urgency,
            ScoringFactor::PainSeverity,
            ScoringFactor::CompanySize,
            ScoringFactor::Timeline,
            ScoringFactor::Likelihood,
            ScoringFactor::Friction,
            ScoringFactor::BudgetIndicators,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScoringFactor::Urgency => "urgency",
            ScoringFactor::PainSeverity => "pain_severity",
            ScoringFactor::CompanySize => "company_size",
            ScoringFactor::Timeline => "timeline",
            ScoringFactor::Likelihood => "likelihood",
            ScoringFactor::Friction => "friction",
            ScoringFactor::BudgetIndicators => "budget_indicators",
        }
    }

    /// Fixed upper bound of the factor's raw sub-scale. Raw points are
    /// re-normalized from this bound to the configured weight.
    pub const fn subscale_max(self) -> u16 {
        match self {
            ScoringFactor::Urgency => 20,
            ScoringFactor::PainSeverity => 20,
            ScoringFactor::CompanySize => 15,
            ScoringFactor::Timeline => 15,
            ScoringFactor::Likelihood => 15,
            ScoringFactor::Friction => 10,
            ScoringFactor::BudgetIndicators => 5,
        }
    }
}

/// Weight assigned to each factor. The seven weights must sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub urgency: u16,
    pub pain_severity: u16,
    pub company_size: u16,
    pub timeline: u16,
    pub likelihood: u16,
    pub friction: u16,
    pub budget_indicators: u16,
}

impl FactorWeights {
    pub const fn sum(&self) -> u16 {
        self.urgency
            + self.pain_severity
            + self.company_size
            + self.timeline
            + self.likelihood
            + self.friction
            + self.budget_indicators
    }

    pub const fn weight_for(&self, factor: ScoringFactor) -> u16 {
        match factor {
            ScoringFactor::Urgency => self.urgency,
            ScoringFactor::PainSeverity => self.pain_severity,
            ScoringFactor::CompanySize => self.company_size,
            ScoringFactor::Timeline => self.timeline,
            ScoringFactor::Likelihood => self.likelihood,
            ScoringFactor::Friction => self.friction,
            ScoringFactor::BudgetIndicators => self.budget_indicators,
        }
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            urgency: 20,
            pain_severity: 20,
            company_size: 15,
            timeline: 15,
            likelihood: 15,
            friction: 10,
            budget_indicators: 5,
        }
    }
}

/// Letter grade cutoff. A percentage at or above `min_percentage` earns the
/// grade, so thresholds are inclusive lower bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub grade: String,
    pub min_percentage: u8,
}

/// Follow-up urgency tier derived from the raw weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Immediate,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::Immediate => "immediate",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityThreshold {
    pub priority: Priority,
    pub min_score: u16,
}

/// Rubric configuration: factor weights plus grade and priority cutoffs.
/// Loaded per run from the configuration store; mutated only through
/// [`update_scoring_config`], which re-validates before persisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    /// Sorted descending by `min_percentage`; the last entry must be a 0
    /// floor so every percentage maps to a grade.
    pub grade_thresholds: Vec<GradeThreshold>,
    /// Sorted descending by `min_score`; the last entry must be a 0 floor.
    pub priority_thresholds: Vec<PriorityThreshold>,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let sum = self.weights.sum();
        if sum != 100 {
            return Err(ScoringConfigError::WeightSum { sum });
        }

        if self.grade_thresholds.is_empty() {
            return Err(ScoringConfigError::NoGradeThresholds);
        }
        for pair in self.grade_thresholds.windows(2) {
            if pair[0].min_percentage <= pair[1].min_percentage {
                return Err(ScoringConfigError::UnorderedGradeThresholds);
            }
        }
        match self.grade_thresholds.last() {
            Some(floor) if floor.min_percentage == 0 => {}
            _ => return Err(ScoringConfigError::MissingGradeFloor),
        }

        if self.priority_thresholds.is_empty() {
            return Err(ScoringConfigError::NoPriorityThresholds);
        }
        for pair in self.priority_thresholds.windows(2) {
            if pair[0].min_score <= pair[1].min_score {
                return Err(ScoringConfigError::UnorderedPriorityThresholds);
            }
        }
        match self.priority_thresholds.last() {
            Some(floor) if floor.min_score == 0 => {}
            _ => return Err(ScoringConfigError::MissingPriorityFloor),
        }

        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let grades = [
            ("A+", 90),
            ("A", 85),
            ("A-", 80),
            ("B+", 75),
            ("B", 70),
            ("B-", 65),
            ("C+", 60),
            ("C", 55),
            ("D", 45),
            ("F", 0),
        ];
        Self {
            weights: FactorWeights::default(),
            grade_thresholds: grades
                .into_iter()
                .map(|(grade, min_percentage)| GradeThreshold {
                    grade: grade.to_string(),
                    min_percentage,
                })
                .collect(),
            priority_thresholds: vec![
                PriorityThreshold {
                    priority: Priority::Immediate,
                    min_score: 80,
                },
                PriorityThreshold {
                    priority: Priority::High,
                    min_score: 60,
                },
                PriorityThreshold {
                    priority: Priority::Medium,
                    min_score: 40,
                },
                PriorityThreshold {
                    priority: Priority::Low,
                    min_score: 0,
                },
            ],
        }
    }
}

/// Validation failures that keep a rubric from being accepted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoringConfigError {
    #[error("factor weights sum to {sum}, expected exactly 100")]
    WeightSum { sum: u16 },
    #[error("grade thresholds are empty")]
    NoGradeThresholds,
    #[error("grade thresholds are not strictly descending")]
    UnorderedGradeThresholds,
    #[error("grade thresholds lack a 0% floor")]
    MissingGradeFloor,
    #[error("priority thresholds are empty")]
    NoPriorityThresholds,
    #[error("priority thresholds are not strictly descending")]
    UnorderedPriorityThresholds,
    #[error("priority thresholds lack a 0-point floor")]
    MissingPriorityFloor,
}

/// Persistence contract for the rubric. Reads may fall back to the built-in
/// default; writes must never be silently defaulted.
pub trait ConfigStore: Send + Sync {
    fn load_scoring_config(&self) -> Result<Option<ScoringConfig>, StoreError>;
    fn save_scoring_config(&self, config: &ScoringConfig) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("configuration store unavailable: {0}")]
    Unavailable(String),
    #[error("configuration io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigUpdateError {
    #[error(transparent)]
    Invalid(#[from] ScoringConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read path: a missing or unreachable store yields the built-in default.
pub fn load_or_default(store: &dyn ConfigStore) -> ScoringConfig {
    match store.load_scoring_config() {
        Ok(Some(config)) => config,
        Ok(None) => ScoringConfig::default(),
        Err(error) => {
            tracing::warn!(%error, "scoring config unavailable, using defaults");
            ScoringConfig::default()
        }
    }
}

/// Admin write path: re-validates the 100-point invariant and threshold
/// ordering before anything touches the store.
pub fn update_scoring_config(
    store: &dyn ConfigStore,
    config: &ScoringConfig,
) -> Result<(), ConfigUpdateError> {
    config.validate()?;
    store.save_scoring_config(config)?;
    Ok(())
}

/// JSON-document store over a single file path.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonFileStore {
    fn load_scoring_config(&self) -> Result<Option<ScoringConfig>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::Io(error)),
        }
    }

    fn save_scoring_config(&self, config: &ScoringConfig) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(config)?;
        let staged = self.path.with_extension("json.tmp");
        fs::write(&staged, raw)?;
        fs::rename(&staged, &self.path)?;
        Ok(())
    }
}
