//! Validation, identity assignment and concurrent greeting tasks.
//!
//! A [`WorkerDispatcher`] takes a batch of [`RawEntity`] records and:
//!
//! 1. validates all of them up front, collecting failures without aborting;
//! 2. assigns identities to the valid ones, in input order, on the calling
//!    task before anything is spawned;
//! 3. spawns one tokio task per entity, which sleeps for the configured delay
//!    and then hands its greeting to a [`GreetingSink`];
//! 4. joins every task and returns a [`RunResult`].
//!
//! Task completion order is unordered. Faults inside a task (sink errors,
//! panics, cancellation) are caught at the task boundary and reported as
//! [`TaskStatus::Failed`].

mod result;

pub use result::*;

use std::sync::Arc;

use core::time::Duration;
use futures::future::join_all;
use tokio::{runtime::Handle, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DispatchConfig, DispatchFailure, Entity, GreetingSink, Identity, IdentityCounter, RawEntity,
    Result, StdoutSink, TaskFault, TaskReport, TaskState, TaskStatus,
};

/// Runs one greeting task per valid entity and reports the tally.
///
/// The dispatcher owns its [`IdentityCounter`] (shared through an `Arc` so
/// callers can read it afterwards) and is consumed by [`Self::run`], which
/// keeps the counter scoped to a single run.
///
/// # Example
/// ```
/// use core::time::Duration;
/// use herald::{DispatchConfig, MemorySink, RawEntity, WorkerDispatcher};
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let config = DispatchConfig::default().with_greeting_delay(Duration::from_millis(1));
/// let dispatcher = WorkerDispatcher::new(MemorySink::new(), config);
/// let sink = dispatcher.sink();
///
/// let result = dispatcher
///     .run([RawEntity::new("John", 30), RawEntity::new("Michael", 13)])
///     .await
///     .unwrap();
///
/// assert_eq!(result.total_identities_issued, 2);
/// assert_eq!(sink.len(), 2);
/// # });
/// ```
#[derive(Debug)]
pub struct WorkerDispatcher<S: GreetingSink = StdoutSink> {
    counter: Arc<IdentityCounter>,
    sink: Arc<S>,
    config: DispatchConfig,
    shutdown: CancellationToken,
}

impl<S: GreetingSink> WorkerDispatcher<S> {
    /// Creates a dispatcher with a fresh counter built from `config`.
    pub fn new(sink: S, config: DispatchConfig) -> Self {
        let counter = match config.max_identities {
            Some(max) => IdentityCounter::with_max(max),
            None => IdentityCounter::new(),
        };
        Self::with_counter(Arc::new(counter), sink, config)
    }

    /// Creates a dispatcher around an existing counter.
    ///
    /// The counter's own maximum wins over `config.max_identities`.
    ///
    /// ## Caveats
    /// [`RunResult::total_identities_issued`] is read from the counter after
    /// the join, so it only equals the number of dispatched entities when the
    /// counter starts at zero and no one else draws from it during the run.
    /// Sharing one counter across dispatchers makes every run report the
    /// cumulative total, and the first identity of a later run is not `1`.
    /// Use [`Self::new`] for the one-counter-per-run behaviour.
    pub fn with_counter(counter: Arc<IdentityCounter>, sink: S, config: DispatchConfig) -> Self {
        Self {
            counter,
            sink: Arc::new(sink),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Attaches a token that, once cancelled, makes every waiting task finish
    /// as [`TaskStatus::Failed`] with [`TaskFault::Cancelled`].
    ///
    /// Entities not yet launched when the token fires are never given an
    /// identity; they are listed in [`RunResult::dispatch_errors`] instead.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn counter(&self) -> Arc<IdentityCounter> {
        Arc::clone(&self.counter)
    }

    pub fn sink(&self) -> Arc<S> {
        Arc::clone(&self.sink)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Validates `inputs`, assigns identities, runs one task per entity and
    /// waits for all of them.
    ///
    /// Must be awaited from within a tokio runtime; the tasks are spawned on
    /// the ambient runtime.
    ///
    /// # Errors
    /// Returns [`DispatchFailure::NoRuntime`] if no tokio runtime is
    /// available, and [`DispatchFailure::TimerDisabled`] if the runtime was
    /// built without its time driver. Both are checked before any identity is
    /// issued. Every other problem is reported inside the returned
    /// [`RunResult`].
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub async fn run<I>(self, inputs: I) -> Result<RunResult>
    where
        I: IntoIterator,
        I::Item: Into<RawEntity>,
    {
        let runtime = Handle::try_current().map_err(|_| DispatchFailure::NoRuntime)?;
        ensure_timer()?;

        let mut validation_errors = Vec::new();
        let mut valid = Vec::new();
        for (index, raw) in inputs.into_iter().enumerate() {
            match raw.into().validate(index) {
                Ok(entity) => valid.push(entity),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Rejected input: {err}");
                    validation_errors.push(err.to_string());
                }
            }
        }

        let mut dispatch_errors = Vec::new();
        let mut launched = Vec::with_capacity(valid.len());
        for entity in valid {
            let first_name = entity.first_name().to_owned();
            if self.shutdown.is_cancelled() {
                #[cfg(feature = "tracing")]
                tracing::warn!("Not launching {first_name}: shutdown requested");
                dispatch_errors.push(format!("{first_name}: {}", TaskFault::Cancelled));
                continue;
            }
            match entity.with_identity_from(&self.counter) {
                Ok(entity) => launched.push(self.launch(&runtime, entity)),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("No identity for {first_name}: {err}");
                    dispatch_errors.push(format!("{first_name}: {err}"));
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Launched {} tasks, waiting for all of them", launched.len());

        let entities = join_all(launched.into_iter().map(LaunchedTask::join)).await;
        let total_identities_issued = self.counter.current();

        #[cfg(feature = "tracing")]
        tracing::info!(
            issued = total_identities_issued,
            rejected = validation_errors.len(),
            failed = entities.iter().filter(|r| !r.is_completed()).count(),
            "Run complete"
        );

        Ok(RunResult {
            total_identities_issued,
            entities,
            validation_errors,
            dispatch_errors,
        })
    }

    fn launch(&self, runtime: &Handle, entity: Entity) -> LaunchedTask {
        #[cfg(feature = "tracing")]
        tracing::trace!("Launching task for identity {}", entity.identity());

        let state = Arc::new(TaskState::new());
        let identity = entity.identity();
        let first_name = entity.first_name().to_owned();
        let age = entity.age();

        let handle = runtime.spawn(greet(
            entity,
            Arc::clone(&self.sink),
            self.config.greeting_delay,
            self.shutdown.clone(),
            Arc::clone(&state),
        ));

        LaunchedTask {
            identity,
            first_name,
            age,
            state,
            handle,
        }
    }
}

/// Fails when the ambient runtime has no time driver. Tokio only reports that
/// by panicking when a timer is created, so the check builds one up front
/// instead of letting every task panic on its delay.
fn ensure_timer() -> Result<()> {
    std::panic::catch_unwind(|| drop(sleep(Duration::ZERO)))
        .map_err(|_| DispatchFailure::TimerDisabled)
}

/// Body of one greeting task. Records its own terminal status on the way out.
async fn greet<S: GreetingSink>(
    entity: Entity,
    sink: Arc<S>,
    delay: Duration,
    shutdown: CancellationToken,
    state: Arc<TaskState>,
) -> core::result::Result<(), TaskFault> {
    let _ = state.transition(TaskStatus::Running);

    let outcome = deliver(&entity, sink.as_ref(), delay, &shutdown).await;

    let terminal = match outcome {
        Ok(()) => TaskStatus::Completed,
        Err(_) => TaskStatus::Failed,
    };
    let _ = state.transition(terminal);
    outcome
}

/// Waits out the delay, then emits the greeting. The delay is the only
/// suspension point and holds no lock.
async fn deliver<S: GreetingSink>(
    entity: &Entity,
    sink: &S,
    delay: Duration,
    shutdown: &CancellationToken,
) -> core::result::Result<(), TaskFault> {
    tokio::select! {
        () = sleep(delay) => {}
        () = shutdown.cancelled() => return Err(TaskFault::Cancelled),
    }
    sink.emit(entity.identity(), &entity.greeting())?;
    Ok(())
}

struct LaunchedTask {
    identity: Identity,
    first_name: String,
    age: u32,
    state: Arc<TaskState>,
    handle: JoinHandle<core::result::Result<(), TaskFault>>,
}

impl LaunchedTask {
    async fn join(self) -> TaskReport {
        let fault = match self.handle.await {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(fault),
            Err(err) if err.is_panic() => Some(TaskFault::Panicked(panic_message(err.into_panic()))),
            Err(_) => Some(TaskFault::Aborted),
        };

        // A panicking or aborted task never got to record its own outcome.
        if fault.is_some() {
            let _ = self.state.transition(TaskStatus::Failed);
        }

        #[cfg(feature = "tracing")]
        {
            if let Some(fault) = &fault {
                tracing::warn!("Task for identity {} failed: {fault}", self.identity);
            }
        }

        TaskReport {
            identity: self.identity,
            first_name: self.first_name,
            age: self.age,
            status: self.state.status(),
            fault: fault.map(|f| f.to_string()),
        }
    }
}

fn panic_message(payload: Box<dyn core::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
