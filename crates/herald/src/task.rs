use core::fmt;

use portable_atomic::{AtomicU8, Ordering};

use crate::{Identity, SinkError};

/// Lifecycle of the task bound to one entity.
///
/// ```text
/// Pending --launch--> Running --(delay elapses, action succeeds)--> Completed
///                     Running --(fault)--------------------------> Failed
/// ```
///
/// `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum TaskStatus {
    Pending = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

impl TaskStatus {
    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is an edge of the task state machine.
    ///
    /// A pending task that faults before it ever runs may go straight to
    /// `Failed`, so the join barrier never loses it.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Running,
            2 => Self::Completed,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A status cell shared between a running task and the dispatcher.
///
/// Transitions are applied with a compare-and-swap and refused when they
/// would leave a terminal state or skip backwards.
#[derive(Debug)]
pub struct TaskState {
    status: AtomicU8,
}

impl TaskState {
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(TaskStatus::Pending as u8),
        }
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Moves to `next` if the current status allows it.
    ///
    /// Returns the status that was replaced, or the current status if the
    /// transition was refused.
    pub fn transition(&self, next: TaskStatus) -> Result<TaskStatus, TaskStatus> {
        self.status
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                TaskStatus::from_u8(raw)
                    .can_transition_to(next)
                    .then_some(next as u8)
            })
            .map(TaskStatus::from_u8)
            .map_err(TaskStatus::from_u8)
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a task ended in [`TaskStatus::Failed`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskFault {
    /// The greeting sink refused or failed to emit the line.
    #[error("greeting sink failed: {0}")]
    Sink(#[from] SinkError),

    /// The task body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The run was cancelled while the task was waiting.
    #[error("cancelled")]
    Cancelled,

    /// The runtime aborted the task before it could finish.
    #[error("aborted by runtime")]
    Aborted,
}

/// The terminal outcome of one dispatched entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskReport {
    pub identity: Identity,
    pub first_name: String,
    pub age: u32,
    pub status: TaskStatus,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fault: Option<String>,
}

impl TaskReport {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
