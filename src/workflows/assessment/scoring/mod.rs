mod config;
mod rules;

pub use config::{
    load_or_default, update_scoring_config, ConfigStore, ConfigUpdateError, FactorWeights,
    GradeThreshold, JsonFileStore, Priority, PriorityThreshold, ScoringConfig, ScoringConfigError,
    ScoringFactor, StoreError,
};

use serde::{Deserialize, Serialize};

use super::AssessmentInput;

/// Stateless scorer that applies a validated rubric to an intake form.
/// Construction rejects any rubric whose weights do not sum to 100, so a
/// built engine can never score against an invalid configuration.
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Pure scoring pass: raw sub-scales from the rules, re-normalized to
    /// the configured weights, then grade and priority lookups.
    pub fn score(&self, input: &AssessmentInput) -> OpportunityScore {
        let mut components = Vec::new();
        let mut total_score: u16 = 0;

        for raw in rules::score_factors(input) {
            let subscale_max = raw.factor.subscale_max();
            let weight = self.config.weights.weight_for(raw.factor);
            let weighted = ((f64::from(raw.raw) / f64::from(subscale_max)) * f64::from(weight))
                .round() as u16;

            total_score += weighted;
            components.push(ScoreComponent {
                factor: raw.factor,
                raw: raw.raw,
                subscale_max,
                weight,
                weighted,
                notes: raw.notes,
            });
        }

        let max_score = self.config.weights.sum();
        let percentage = f64::from(total_score) / f64::from(max_score) * 100.0;
        let grade = grade_for(&self.config, percentage);
        let priority = priority_for(&self.config, total_score);
        let recommendations = rules::recommendations(input);

        OpportunityScore {
            components,
            total_score,
            max_score,
            percentage,
            grade,
            priority,
            recommendations,
        }
    }
}

/// Highest grade whose inclusive lower bound the percentage reaches. The
/// validated 0% floor guarantees a match.
fn grade_for(config: &ScoringConfig, percentage: f64) -> String {
    config
        .grade_thresholds
        .iter()
        .find(|threshold| percentage >= f64::from(threshold.min_percentage))
        .map(|threshold| threshold.grade.clone())
        .unwrap_or_else(|| "F".to_string())
}

fn priority_for(config: &ScoringConfig, total_score: u16) -> Priority {
    config
        .priority_thresholds
        .iter()
        .find(|threshold| total_score >= threshold.min_score)
        .map(|threshold| threshold.priority)
        .unwrap_or(Priority::Low)
}

/// Discrete contribution of one factor, kept raw and weighted so reports can
/// show the derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoringFactor,
    pub raw: u16,
    pub subscale_max: u16,
    /// Configured weight the raw sub-score was re-normalized to, kept so
    /// reports can show the arithmetic.
    pub weight: u16,
    pub weighted: u16,
    pub notes: String,
}

/// Scoring output for one intake form. Created fresh per run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub components: Vec<ScoreComponent>,
    pub total_score: u16,
    pub max_score: u16,
    pub percentage: f64,
    pub grade: String,
    pub priority: Priority,
    pub recommendations: Vec<String>,
}

impl OpportunityScore {
    pub fn component(&self, factor: ScoringFactor) -> Option<&ScoreComponent> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
    }
}
