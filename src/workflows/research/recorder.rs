use std::sync::atomic::{AtomicU32, Ordering};

use crate::audit::{AuditEntry, AuditTrail};
use crate::citations::{CitationId, CitationMeta, CitationTracker};

/// A citation noted by a research task, optionally tied to the text block
/// it backs. Ids are only issued at flush time, once the task owns the
/// tracker again.
pub(super) struct CitationSeed {
    meta: CitationMeta,
    content: Option<String>,
}

/// Per-task buffer for audit entries and citation seeds.
///
/// The parallel research tasks cannot share `&mut AuditTrail`, so each task
/// records into its own log and the orchestrator flushes the logs in a fixed
/// order after the tasks settle. That keeps the transcript grouped by task
/// instead of interleaved by timing.
#[derive(Default)]
pub(super) struct TaskLog {
    entries: Vec<AuditEntry>,
    seeds: Vec<CitationSeed>,
}

impl TaskLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn cite(&mut self, meta: CitationMeta, content: Option<String>) {
        self.seeds.push(CitationSeed { meta, content });
    }

    pub fn merge(&mut self, other: TaskLog) {
        self.entries.extend(other.entries);
        self.seeds.extend(other.seeds);
    }

    /// Appends buffered entries to the trail and materializes citation
    /// seeds. Seeds naming the same content block are linked as one set.
    pub fn flush(self, trail: &mut AuditTrail, citations: &mut CitationTracker) {
        for entry in self.entries {
            trail.append(entry);
        }

        let mut linked: Vec<(String, Vec<CitationId>)> = Vec::new();
        for seed in self.seeds {
            let id = citations.cite(seed.meta);
            if let Some(content) = seed.content {
                match linked.iter_mut().find(|(text, _)| *text == content) {
                    Some((_, ids)) => ids.push(id),
                    None => linked.push((content, vec![id])),
                }
            }
        }
        for (content, ids) in linked {
            citations.link_content(&content, &ids);
        }
    }
}

/// Counts generative-analysis attempts and successes across one run.
///
/// Shared by reference across the parallel tasks; the final verdict
/// "nothing answered" is what turns a degraded run into a fatal one.
#[derive(Debug, Default)]
pub(super) struct AnalysisMeter {
    attempts: AtomicU32,
    successes: AtomicU32,
}

impl AnalysisMeter {
    pub fn attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn nothing_answered(&self) -> bool {
        self.attempts() > 0 && self.successes.load(Ordering::Relaxed) == 0
    }
}
