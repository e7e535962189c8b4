//! Run table: at most one active transition per device.
//!
//! Each entry owns the [`CancelHandle`] of the background task playing the
//! device's plan. Entries are inserted before the task is spawned and
//! removed when the task's [`RunGuard`] drops, whether the task returned,
//! panicked or was aborted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Notify;

use twilight_domain::command::Selector;
use twilight_domain::error::ConflictError;
use twilight_domain::id::RunId;
use twilight_domain::plan::DuskStrategy;
use twilight_domain::time::Timestamp;

use crate::cancel::{CancelHandle, CancelToken, cancel_pair};

/// Public view of an active run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub run_id: RunId,
    pub device: String,
    pub selector: Selector,
    pub strategy: DuskStrategy,
    pub started_at: Timestamp,
}

struct RunEntry {
    info: RunInfo,
    handle: CancelHandle,
}

#[derive(Default)]
struct Inner {
    runs: Mutex<HashMap<Selector, RunEntry>>,
    idle: Notify,
}

/// Shared, cloneable map of active runs keyed by device selector.
#[derive(Clone, Default)]
pub struct RunTable {
    inner: Arc<Inner>,
}

impl RunTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<Selector, RunEntry>> {
        self.inner
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new run for `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError`] when the device already has an active run.
    pub fn reserve(
        &self,
        device: &str,
        selector: &Selector,
        strategy: DuskStrategy,
        now: Timestamp,
    ) -> Result<(RunInfo, CancelToken), ConflictError> {
        let mut runs = self.runs();
        if runs.contains_key(selector) {
            return Err(ConflictError {
                device: device.to_string(),
            });
        }
        let (handle, token) = cancel_pair();
        let info = RunInfo {
            run_id: RunId::new(),
            device: device.to_string(),
            selector: selector.clone(),
            strategy,
            started_at: now,
        };
        runs.insert(
            selector.clone(),
            RunEntry {
                info: info.clone(),
                handle,
            },
        );
        Ok((info, token))
    }

    /// Drop the entry for `selector` if it still belongs to `run_id`.
    pub fn finish(&self, selector: &Selector, run_id: RunId) {
        let mut runs = self.runs();
        if runs
            .get(selector)
            .is_some_and(|entry| entry.info.run_id == run_id)
        {
            runs.remove(selector);
        }
        let empty = runs.is_empty();
        drop(runs);
        if empty {
            self.inner.idle.notify_waiters();
        }
    }

    /// Tie the entry's lifetime to the returned guard.
    #[must_use]
    pub fn guard(&self, selector: Selector, run_id: RunId) -> RunGuard {
        RunGuard {
            table: self.clone(),
            selector,
            run_id,
        }
    }

    /// Request cancellation of the run for `selector`.
    ///
    /// The entry stays until the task acknowledges by calling [`finish`](Self::finish).
    pub fn cancel(&self, selector: &Selector) -> Option<RunInfo> {
        let runs = self.runs();
        let entry = runs.get(selector)?;
        entry.handle.cancel();
        Some(entry.info.clone())
    }

    /// Request cancellation of every run.
    pub fn cancel_all(&self) -> Vec<RunInfo> {
        let runs = self.runs();
        runs.values()
            .map(|entry| {
                entry.handle.cancel();
                entry.info.clone()
            })
            .collect()
    }

    /// Active runs ordered by device name.
    #[must_use]
    pub fn list(&self) -> Vec<RunInfo> {
        let mut list: Vec<RunInfo> = self.runs().values().map(|e| e.info.clone()).collect();
        list.sort_by(|a, b| a.device.cmp(&b.device));
        list
    }

    #[must_use]
    pub fn is_running(&self, selector: &Selector) -> bool {
        self.runs().contains_key(selector)
    }

    /// Wait until no run is active.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.runs().is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// Calls [`RunTable::finish`] on drop.
pub struct RunGuard {
    table: RunTable,
    selector: Selector,
    run_id: RunId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.table.finish(&self.selector, self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn living() -> Selector {
        Selector::new("id:d073d5000001")
    }

    #[test]
    fn should_reject_second_run_when_device_is_busy() {
        let table = RunTable::new();
        let now = twilight_domain::time::now();
        table
            .reserve("Living", &living(), DuskStrategy::Stepped, now)
            .unwrap();

        let err = table
            .reserve("Living", &living(), DuskStrategy::Basic, now)
            .unwrap_err();
        assert_eq!(err.device, "Living");
    }

    #[test]
    fn should_accept_runs_for_different_devices() {
        let table = RunTable::new();
        let now = twilight_domain::time::now();
        table
            .reserve("Living", &living(), DuskStrategy::Stepped, now)
            .unwrap();
        table
            .reserve("Kitchen", &Selector::new("group:Kitchen"), DuskStrategy::Beta, now)
            .unwrap();

        let names: Vec<String> = table.list().into_iter().map(|r| r.device).collect();
        assert_eq!(names, vec!["Kitchen".to_string(), "Living".to_string()]);
    }

    #[test]
    fn should_signal_token_when_cancelled() {
        let table = RunTable::new();
        let (info, token) = table
            .reserve("Living", &living(), DuskStrategy::Stepped, twilight_domain::time::now())
            .unwrap();

        let cancelled = table.cancel(&living()).unwrap();
        assert_eq!(cancelled.run_id, info.run_id);
        assert!(token.is_cancelled());
        assert!(table.is_running(&living()));
    }

    #[test]
    fn should_ignore_finish_from_stale_run() {
        let table = RunTable::new();
        table
            .reserve("Living", &living(), DuskStrategy::Stepped, twilight_domain::time::now())
            .unwrap();

        table.finish(&living(), RunId::new());
        assert!(table.is_running(&living()));
    }

    #[test]
    fn should_return_none_when_cancelling_idle_device() {
        assert!(RunTable::new().cancel(&living()).is_none());
    }

    #[tokio::test]
    async fn should_wake_idle_waiters_when_last_run_finishes() {
        let table = RunTable::new();
        let (info, _token) = table
            .reserve("Living", &living(), DuskStrategy::Stepped, twilight_domain::time::now())
            .unwrap();

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.wait_idle().await })
        };
        tokio::task::yield_now().await;
        table.finish(&living(), info.run_id);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn should_release_entry_when_guarded_task_panics() {
        let table = RunTable::new();
        let (info, _token) = table
            .reserve("Living", &living(), DuskStrategy::Stepped, twilight_domain::time::now())
            .unwrap();

        let guard = table.guard(living(), info.run_id);
        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("lighting client blew up");
        });

        assert!(task.await.unwrap_err().is_panic());
        assert!(!table.is_running(&living()));
        tokio::time::timeout(Duration::from_secs(1), table.wait_idle())
            .await
            .unwrap();
    }
}
