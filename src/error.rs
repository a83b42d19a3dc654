use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::assessment::scoring::{ConfigUpdateError, ScoringConfigError, StoreError};
use crate::workflows::research::ResearchError;

/// Crate-level error rollup. Fatal configuration problems surface here;
/// expected source-level failures stay inside the research workflow as
/// degraded results and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    ScoringConfig(#[from] ScoringConfigError),
    #[error(transparent)]
    ConfigUpdate(#[from] ConfigUpdateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Research(#[from] ResearchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_failures_carry_the_prefix_and_source() {
        let err = PipelineError::from(ConfigError::InvalidNumber {
            var: "PROSPECT_REQUEST_TIMEOUT_SECS",
            value: "soon".to_string(),
        });
        assert!(err.to_string().starts_with("configuration error:"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn research_failures_pass_through_unwrapped() {
        let err = PipelineError::from(ResearchError::AnalysisUnavailable { attempts: 3 });
        assert_eq!(
            err.to_string(),
            "analysis service unreachable: 3 generative calls made, none answered"
        );
    }
}
