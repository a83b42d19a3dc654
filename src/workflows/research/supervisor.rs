use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

use crate::audit::AuditTrail;
use crate::citations::CitationTracker;
use crate::workflows::assessment::AssessmentInput;

use super::{CompanyResearch, ResearchError, ResearchPipeline};

/// Everything one supervised run produced, audit surfaces included. On a
/// fatal outcome the partial trail is still here for diagnosis.
pub struct ResearchRun {
    pub input: AssessmentInput,
    pub outcome: Result<CompanyResearch, ResearchError>,
    pub trail: AuditTrail,
    pub citations: CitationTracker,
}

/// Tracks in-flight research per company and enforces latest-wins: starting
/// a run for a company actively aborts the previous run for that company,
/// so a superseded run can never deliver stale results.
pub struct ResearchSupervisor {
    pipeline: Arc<ResearchPipeline>,
    active: Mutex<HashMap<String, AbortHandle>>,
}

impl ResearchSupervisor {
    pub fn new(pipeline: Arc<ResearchPipeline>) -> Self {
        Self {
            pipeline,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns a research run for the prospect. An earlier run still in
    /// flight for the same company name is aborted, and its join handle
    /// resolves as cancelled.
    pub async fn refresh(&self, input: AssessmentInput) -> JoinHandle<ResearchRun> {
        let key = input.company_name.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn(async move {
            let mut trail = AuditTrail::new();
            let mut citations = CitationTracker::new();
            let outcome = pipeline
                .research(&input, &mut trail, &mut citations, None)
                .await;
            ResearchRun {
                input,
                outcome,
                trail,
                citations,
            }
        });

        let mut active = self.active.lock().await;
        active.retain(|_, tracked| !tracked.is_finished());
        if let Some(previous) = active.insert(key, handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Aborts the in-flight run for a company, if any.
    pub async fn cancel(&self, company: &str) -> bool {
        match self.active.lock().await.remove(company) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Companies with a tracked (not yet pruned) run.
    pub async fn tracked(&self) -> usize {
        let mut active = self.active.lock().await;
        active.retain(|_, tracked| !tracked.is_finished());
        active.len()
    }
}
