// Concurrent fetch dispatcher.
//
// Fans out one tokio task per standings row. Each task fetches the entrant's
// history through the injected `HistorySource`, decodes it, and appends the
// resulting entry to a shared `EntryAggregator`. The dispatcher joins every
// task before handing the league back, so callers never observe a league
// while fetches are still in flight.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregate::EntryAggregator;
use crate::entry::{Entry, EntryHistory, ExclusionSet, League, LeagueHeader, StandingsRow};
use crate::error::{DispatchError, EntryFailure, FetchError};

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// Retrieves the raw history document for one entrant.
///
/// Implementations own transport concerns (session cookies, compression,
/// retries). The dispatcher only decodes what they return.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(&self, entry_num: u64) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: HistorySource + ?Sized> HistorySource for Arc<T> {
    async fn fetch_history(&self, entry_num: u64) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_history(entry_num).await
    }
}

// ---------------------------------------------------------------------------
// Policy and outcome
// ---------------------------------------------------------------------------

/// How the dispatcher treats slow and failing fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Deadline for each history fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// Cancel every outstanding fetch on the first failure and fail the
    /// league, instead of skipping the failed entrant.
    pub fail_fast: bool,
}

/// Result of one league's fetch phase.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Entries in completion order. Not yet ranked.
    pub league: League,
    /// Rows dropped because their account is in the exclusion set.
    pub excluded: usize,
    /// Entrants whose history could not be fetched or decoded.
    pub failures: Vec<EntryFailure>,
}

/// Terminal state of a single worker.
enum TaskOutcome {
    Aggregated,
    Excluded,
    Failed(FetchError),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<S: ?Sized> {
    source: Arc<S>,
    exclusions: Arc<ExclusionSet>,
    policy: DispatchPolicy,
}

impl<S> Dispatcher<S>
where
    S: HistorySource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, exclusions: ExclusionSet, policy: DispatchPolicy) -> Self {
        Self {
            source,
            exclusions: Arc::new(exclusions),
            policy,
        }
    }

    /// Fetch every row's history concurrently and aggregate the results.
    ///
    /// Returns once every spawned task has reached a terminal state. In
    /// fail-fast mode the first failure aborts the remaining tasks and is
    /// returned as [`DispatchError::Aborted`].
    pub async fn dispatch(
        &self,
        header: LeagueHeader,
        rows: Vec<StandingsRow>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let aggregator = Arc::new(EntryAggregator::with_capacity(rows.len()));
        let mut tasks = JoinSet::new();

        // Rows can repeat an account, so outstanding work is counted per id.
        let mut pending: HashMap<u64, usize> = HashMap::new();

        for row in rows {
            *pending.entry(row.entry).or_default() += 1;

            let source = Arc::clone(&self.source);
            let exclusions = Arc::clone(&self.exclusions);
            let aggregator = Arc::clone(&aggregator);
            let timeout = self.policy.fetch_timeout;

            tasks.spawn(async move {
                let entry_num = row.entry;
                let work = fetch_entry(&*source, &exclusions, &row, timeout);
                // A panic stays inside the task so the entry id survives it.
                let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(Ok(Some(entry))) => {
                        aggregator.append(entry);
                        TaskOutcome::Aggregated
                    }
                    Ok(Ok(None)) => TaskOutcome::Excluded,
                    Ok(Err(err)) => TaskOutcome::Failed(err),
                    Err(panic) => TaskOutcome::Failed(FetchError::Task(format!(
                        "worker panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                };
                (entry_num, outcome)
            });
        }

        let mut excluded = 0;
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (entry_num, outcome) = match joined {
                Ok(done) => done,
                Err(join_err) => {
                    // Only cancellation gets here. The entry id went down with
                    // the task and is recovered from `pending` below.
                    warn!(league = header.id, "history fetch task failed: {join_err}");
                    if self.policy.fail_fast {
                        tasks.abort_all();
                        while tasks.join_next().await.is_some() {}
                    }
                    continue;
                }
            };
            release(&mut pending, entry_num);

            match outcome {
                TaskOutcome::Aggregated => {}
                TaskOutcome::Excluded => excluded += 1,
                TaskOutcome::Failed(error) => {
                    warn!(
                        league = header.id,
                        entry = entry_num,
                        "skipping entry: {error}"
                    );
                    if self.policy.fail_fast {
                        tasks.abort_all();
                        while tasks.join_next().await.is_some() {}
                        return Err(DispatchError::Aborted {
                            entry_num,
                            source: error,
                        });
                    }
                    failures.push(EntryFailure { entry_num, error });
                }
            }
        }

        for (entry_num, count) in pending {
            for _ in 0..count {
                let error = FetchError::Task("worker cancelled".into());
                if self.policy.fail_fast {
                    return Err(DispatchError::Aborted {
                        entry_num,
                        source: error,
                    });
                }
                failures.push(EntryFailure { entry_num, error });
            }
        }

        let entries = aggregator.take_entries();
        info!(
            league = header.id,
            entries = entries.len(),
            excluded,
            failed = failures.len(),
            "fetch phase complete"
        );

        Ok(DispatchOutcome {
            league: League::new(header, entries),
            excluded,
            failures,
        })
    }
}

fn release(pending: &mut HashMap<u64, usize>, entry_num: u64) {
    if let Some(count) = pending.get_mut(&entry_num) {
        *count -= 1;
        if *count == 0 {
            pending.remove(&entry_num);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Work done by one task. `Ok(None)` means the row was excluded.
async fn fetch_entry<S: HistorySource + ?Sized>(
    source: &S,
    exclusions: &ExclusionSet,
    row: &StandingsRow,
    timeout: Option<Duration>,
) -> Result<Option<Entry>, FetchError> {
    if exclusions.contains(row.entry) {
        debug!(entry = row.entry, "entry is excluded, not fetching history");
        return Ok(None);
    }

    debug!(entry = row.entry, "fetching history");
    let bytes = match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch_history(row.entry))
            .await
            .map_err(|_| FetchError::Timeout(limit))??,
        None => source.fetch_history(row.entry).await?,
    };

    let history: EntryHistory = serde_json::from_slice(&bytes)?;
    Ok(Some(Entry::from_history(row, &history.current)))
}
