use crate::{TaskReport, TaskStatus};

/// Summary of one dispatcher run.
///
/// Returned only after every launched task has reached a terminal state, so
/// `entities` always holds one report per dispatched entity, ordered by
/// identity (which is also input order).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunResult {
    /// Final value of the run's identity counter.
    pub total_identities_issued: u64,
    /// One report per dispatched entity.
    pub entities: Vec<TaskReport>,
    /// Inputs rejected before any identity was issued.
    pub validation_errors: Vec<String>,
    /// Valid inputs that could not be given an identity.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub dispatch_errors: Vec<String>,
}

impl RunResult {
    /// Reports whose task finished successfully.
    pub fn completed(&self) -> impl Iterator<Item = &TaskReport> {
        self.entities.iter().filter(|r| r.status == TaskStatus::Completed)
    }

    /// Reports whose task failed.
    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.entities.iter().filter(|r| r.status == TaskStatus::Failed)
    }

    /// True when every input was valid, dispatched and completed.
    pub fn is_clean(&self) -> bool {
        self.validation_errors.is_empty()
            && self.dispatch_errors.is_empty()
            && self.entities.iter().all(TaskReport::is_completed)
    }
}
