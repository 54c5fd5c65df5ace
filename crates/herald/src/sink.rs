use std::io::{self, Write};

use parking_lot::Mutex;

use crate::Identity;

/// Errors a [`GreetingSink`] can report back to its task.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The underlying writer failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The sink refused the line.
    #[error("greeting rejected: {reason}")]
    Rejected { reason: String },
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        Self::Write(err.to_string())
    }
}

/// Destination for the greeting line each task emits.
///
/// Implementations are shared by every task of a run and called concurrently,
/// in whatever order the tasks finish.
pub trait GreetingSink: Send + Sync + 'static {
    /// Emits one complete line for the entity with `identity`.
    fn emit(&self, identity: Identity, line: &str) -> Result<(), SinkError>;
}

/// Writes each greeting as its own line on standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl GreetingSink for StdoutSink {
    fn emit(&self, _identity: Identity, line: &str) -> Result<(), SinkError> {
        // Hold the lock for the whole line so concurrent tasks never interleave.
        write_line(&mut io::stdout().lock(), line)
    }
}

/// Writes `line` and a newline to `out`, then flushes.
fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), SinkError> {
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Collects greetings in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Identity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the emitted lines in the order tasks finished.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Returns the identities in the order their lines were emitted.
    pub fn emission_order(&self) -> Vec<Identity> {
        self.lines.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl GreetingSink for MemorySink {
    fn emit(&self, identity: Identity, line: &str) -> Result<(), SinkError> {
        self.lines.lock().push((identity, line.to_owned()));
        Ok(())
    }
}
