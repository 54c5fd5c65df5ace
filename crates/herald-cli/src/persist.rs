use herald::{
    RunResult,
    store::{KeyValueStore, Projection, StoreError, UserRecord},
};
use serde::Serialize;

/// Writes one record per completed task, keyed by its identity.
///
/// Failed tasks are skipped. Returns the number of records written.
pub fn persist_completed<S: KeyValueStore + ?Sized>(
    store: &S,
    result: &RunResult,
) -> Result<usize, StoreError> {
    let mut written = 0;
    for report in result.completed() {
        store.put(
            report.identity,
            UserRecord::new(report.identity, report.first_name.clone(), report.age),
        )?;
        written += 1;
    }

    tracing::debug!("Persisted {written} records");
    Ok(written)
}

/// Response body listing every stored user id.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserIds {
    pub user_ids: Vec<u64>,
}

pub fn list_user_ids<S: KeyValueStore + ?Sized>(store: &S) -> Result<UserIds, StoreError> {
    let user_ids = store
        .scan(Projection::KeysOnly)?
        .into_iter()
        .map(|record| record.user_id.get())
        .collect();
    Ok(UserIds { user_ids })
}
