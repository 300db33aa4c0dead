//! The synchronizer: keeps the durable process record eventually consistent
//! with in-memory edits.
//!
//! One explicit state machine per open process replaces the ad hoc
//! isModified flag + duplicated timer logic this design descends from:
//!
//! - **Clean**: in-memory fields match the last-known-saved snapshot.
//! - **Modified**: at least one field changed since Clean; a debounce timer
//!   is armed.
//! - **Saving**: a save is in flight. Edits arriving now are queued
//!   implicitly; the settle path re-arms the timer instead of cancelling
//!   the in-flight request.
//!
//! Every save serializes the full current field store snapshot, so any
//! completed save reflects a superset of the edits known at trigger time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use wba_core::error::{Result, WbaError};
use wba_core::field_store::FieldStore;
use wba_core::process::{Process, ProcessStore};

/// Default quiet period before an autosave fires.
///
/// Long enough for an in-progress suggestion fetch to land in the field
/// store before the snapshot is taken; suggestion text counts as an edit.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);

/// Save status of the open process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    Clean,
    Modified,
    Saving,
}

/// Snapshot of the synchronizer state for UI feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub state: SaveState,
    pub open_process: Option<String>,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Retained until the next successful operation clears it.
    pub last_error: Option<String>,
}

struct SyncInner {
    fields: FieldStore,
    open_process: Option<String>,
    state: SaveState,
    /// Bumped on every edit; compared against the sequence captured at
    /// snapshot time to detect edits that raced an in-flight save.
    edit_seq: u64,
    /// Bumped to invalidate any armed debounce timer.
    timer_gen: u64,
    /// True once the subscription has delivered data for the open process.
    loaded: bool,
    last_saved_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    watch_task: Option<JoinHandle<()>>,
}

impl SyncInner {
    fn bump_timer(&mut self) -> u64 {
        self.timer_gen += 1;
        self.timer_gen
    }
}

/// Watches the field store for changes, decides when a remote save is due,
/// and reconciles local state with remote state on load.
///
/// The store is an explicit dependency so the synchronizer is testable
/// without a live backend. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Synchronizer {
    store: Arc<dyn ProcessStore>,
    inner: Arc<Mutex<SyncInner>>,
    debounce: Duration,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn ProcessStore>) -> Self {
        Self::with_debounce(store, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(store: Arc<dyn ProcessStore>, debounce: Duration) -> Self {
        Self {
            store,
            inner: Arc::new(Mutex::new(SyncInner {
                fields: FieldStore::new(),
                open_process: None,
                state: SaveState::Clean,
                edit_seq: 0,
                timer_gen: 0,
                loaded: false,
                last_saved_at: None,
                last_error: None,
                watch_task: None,
            })),
            debounce,
        }
    }

    // ------------------------------------------------------------------
    // Load protocol
    // ------------------------------------------------------------------

    /// Opens a process: subscribes to the store and overwrites the field
    /// store with each delivered snapshot ("server wins on load").
    ///
    /// Cancels the pending debounce and drops the subscription of any
    /// previously open process. An in-flight save of the previous process
    /// is not cancelled; its result is discarded on settle.
    pub async fn open(&self, id: &str) -> Result<()> {
        let mut watch = self.store.subscribe_one(id).await?;

        let mut inner = self.inner.lock().await;
        inner.bump_timer();
        if let Some(task) = inner.watch_task.take() {
            task.abort();
        }

        inner.open_process = Some(id.to_string());
        inner.state = SaveState::Clean;
        inner.last_error = None;
        inner.loaded = false;

        // The subscription seeds the current snapshot; apply it now so the
        // caller sees loaded fields on return.
        if let Some(process) = watch.borrow_and_update().clone() {
            inner.fields.load(&process);
            inner.loaded = true;
        }

        let sync = self.clone();
        let process_id = id.to_string();
        inner.watch_task = Some(tokio::spawn(async move {
            while watch.changed().await.is_ok() {
                let snapshot = watch.borrow_and_update().clone();
                sync.apply_remote(&process_id, snapshot).await;
            }
        }));

        tracing::debug!(process_id = %id, "opened process");
        Ok(())
    }

    /// Closes the open process: cancels the pending debounce, tears down
    /// the subscription and clears the current id. Field contents stay in
    /// place until the next open or clear; an in-flight save is not
    /// cancelled.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.bump_timer();
        if let Some(task) = inner.watch_task.take() {
            task.abort();
        }
        inner.open_process = None;
        inner.state = SaveState::Clean;
        inner.loaded = false;
    }

    async fn apply_remote(&self, process_id: &str, snapshot: Option<Process>) {
        let mut inner = self.inner.lock().await;
        if inner.open_process.as_deref() != Some(process_id) {
            return;
        }
        let Some(process) = snapshot else {
            tracing::debug!(process_id, "watched process was deleted");
            return;
        };
        // The first delivered snapshot always overwrites, discarding local
        // edits made before data arrived. Later pushes (own save echoes,
        // other-session writes) only apply while Clean so an in-progress
        // edit session is not clobbered; concurrent sessions race with
        // last-save-wins semantics.
        if !inner.loaded || inner.state == SaveState::Clean {
            inner.fields.load(&process);
            inner.loaded = true;
            inner.state = SaveState::Clean;
        }
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Applies a field mutation and marks the process modified, re-arming
    /// the debounce timer.
    pub async fn edit<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut FieldStore),
    {
        let generation = {
            let mut inner = self.inner.lock().await;
            if inner.open_process.is_none() {
                return Err(WbaError::validation("no process is open to edit"));
            }
            f(&mut inner.fields);
            inner.edit_seq += 1;
            if inner.state == SaveState::Clean {
                inner.state = SaveState::Modified;
            }
            // While Saving, the edit is queued implicitly: the settle path
            // compares edit sequences and re-arms.
            inner.bump_timer()
        };
        self.arm_timer(generation);
        Ok(())
    }

    /// Reads the field store without mutating it.
    pub async fn with_fields<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FieldStore) -> R,
    {
        let inner = self.inner.lock().await;
        f(&inner.fields)
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    /// Manual save, exposed independently of the timer.
    ///
    /// Still a no-op while Clean (no redundant writes), and fails with a
    /// user-visible reason when no process is open.
    pub async fn save_now(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.open_process.is_none() {
                return Err(WbaError::validation("no process is open to save"));
            }
            match inner.state {
                SaveState::Clean => return Ok(()),
                // Already in flight; the settle path reconciles.
                SaveState::Saving => return Ok(()),
                SaveState::Modified => {
                    // Cancel the pending debounce; this save supersedes it.
                    inner.bump_timer();
                }
            }
        }
        self.perform_save().await
    }

    pub async fn status(&self) -> SyncStatus {
        let inner = self.inner.lock().await;
        SyncStatus {
            state: inner.state,
            open_process: inner.open_process.clone(),
            last_saved_at: inner.last_saved_at,
            last_error: inner.last_error.clone(),
        }
    }

    pub async fn open_process_id(&self) -> Option<String> {
        self.inner.lock().await.open_process.clone()
    }

    fn arm_timer(&self, generation: u64) {
        let sync = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sync.debounce).await;
            sync.on_timer(generation).await;
        });
    }

    async fn on_timer(&self, generation: u64) {
        {
            let inner = self.inner.lock().await;
            if inner.timer_gen != generation {
                // Superseded by a later edit, a manual save, or a close.
                return;
            }
            if inner.state != SaveState::Modified {
                // Clean: nothing to write. Saving: settle path re-arms.
                return;
            }
        }
        if let Err(e) = self.perform_save().await {
            // Already retained in status; the Modified state retries.
            tracing::debug!(error = %e, "debounced save failed");
        }
    }

    /// Snapshots the field store and pushes it to the store.
    async fn perform_save(&self) -> Result<()> {
        let (id, patch, snapshot_seq) = {
            let mut inner = self.inner.lock().await;
            let Some(id) = inner.open_process.clone() else {
                return Err(WbaError::validation("no process is open to save"));
            };
            if inner.state != SaveState::Modified {
                return Ok(());
            }
            inner.state = SaveState::Saving;
            let seq = inner.edit_seq;
            (id, inner.fields.snapshot(), seq)
        };

        let result = self.store.update(&id, patch).await;

        let mut inner = self.inner.lock().await;
        if inner.open_process.as_deref() != Some(id.as_str()) {
            // Closed or switched mid-flight; nothing left to reconcile.
            if let Err(e) = &result {
                tracing::warn!(process_id = %id, error = %e, "save settled after close");
            }
            return result;
        }

        match &result {
            Ok(()) => {
                inner.last_saved_at = Some(Utc::now());
                inner.last_error = None;
                if inner.edit_seq == snapshot_seq {
                    inner.state = SaveState::Clean;
                } else {
                    // Edits raced the in-flight save; queue the next cycle.
                    inner.state = SaveState::Modified;
                    let generation = inner.bump_timer();
                    drop(inner);
                    self.arm_timer(generation);
                }
                tracing::debug!(process_id = %id, "autosave committed");
            }
            Err(e) => {
                // No rollback of in-memory values; staying Modified makes
                // the next edit/timer cycle retry automatically.
                inner.state = SaveState::Modified;
                inner.last_error = Some(e.to_string());
                let generation = inner.bump_timer();
                drop(inner);
                self.arm_timer(generation);
                tracing::warn!(process_id = %id, error = %e, "autosave failed; will retry");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use wba_core::process::{DirectoryWatch, ProcessPatch, ProcessWatch, QuestionKey};
    use wba_infrastructure::MemoryProcessStore;

    /// Store decorator that counts update calls, can inject failures, and
    /// can delay commits to widen the in-flight window.
    struct InstrumentedStore {
        inner: MemoryProcessStore,
        update_calls: AtomicUsize,
        fail_updates: AtomicBool,
        update_delay: Option<Duration>,
    }

    impl InstrumentedStore {
        fn new() -> Self {
            Self {
                inner: MemoryProcessStore::new(),
                update_calls: AtomicUsize::new(0),
                fail_updates: AtomicBool::new(false),
                update_delay: None,
            }
        }

        fn with_update_delay(delay: Duration) -> Self {
            Self {
                update_delay: Some(delay),
                ..Self::new()
            }
        }

        fn update_calls(&self) -> usize {
            self.update_calls.load(Ordering::SeqCst)
        }

        fn set_fail_updates(&self, fail: bool) {
            self.fail_updates.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProcessStore for InstrumentedStore {
        async fn create(
            &self,
            owner_id: &str,
            title: &str,
            initial_thoughts: &str,
        ) -> Result<String> {
            self.inner.create(owner_id, title, initial_thoughts).await
        }

        async fn get(&self, id: &str) -> Result<Option<Process>> {
            self.inner.get(id).await
        }

        async fn update(&self, id: &str, patch: ProcessPatch) -> Result<()> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.update_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(WbaError::store("simulated transport failure"));
            }
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn subscribe_one(&self, id: &str) -> Result<ProcessWatch> {
            self.inner.subscribe_one(id).await
        }

        async fn subscribe_many(&self, owner_id: &str) -> Result<DirectoryWatch> {
            self.inner.subscribe_many(owner_id).await
        }
    }

    async fn open_fresh(store: &Arc<InstrumentedStore>) -> (Synchronizer, String) {
        let id = store.create("user-1", "Test", "").await.unwrap();
        let sync = Synchronizer::new(store.clone() as Arc<dyn ProcessStore>);
        sync.open(&id).await.unwrap();
        (sync, id)
    }

    /// Advance well past the debounce delay and let spawned tasks settle.
    async fn run_quiet_period() {
        tokio::time::sleep(DEFAULT_DEBOUNCE + Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn edits_in_one_quiet_period_coalesce_into_one_save() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, id) = open_fresh(&store).await;

        for text in ["f", "fi", "first draft"] {
            sync.edit(|f| f.set_initial_thoughts(text)).await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        run_quiet_period().await;

        assert_eq!(store.update_calls(), 1);
        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.initial_thoughts, "first draft");

        let status = sync.status().await;
        assert_eq!(status.state, SaveState::Clean);
        assert!(status.last_saved_at.is_some());
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_with_no_edits_issues_no_request() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, _id) = open_fresh(&store).await;

        run_quiet_period().await;
        run_quiet_period().await;

        assert_eq!(store.update_calls(), 0);
        assert_eq!(sync.status().await.state, SaveState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_save_while_clean_is_a_noop() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, _id) = open_fresh(&store).await;

        sync.save_now().await.unwrap();
        assert_eq!(store.update_calls(), 0);

        // After a real save cycle it is still a no-op.
        sync.edit(|f| f.set_initial_thoughts("text")).await.unwrap();
        run_quiet_period().await;
        assert_eq!(store.update_calls(), 1);
        sync.save_now().await.unwrap();
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_save_with_no_open_process_is_rejected() {
        let store = Arc::new(InstrumentedStore::new());
        let sync = Synchronizer::new(store.clone() as Arc<dyn ProcessStore>);

        let err = sync.save_now().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn typed_text_saves_once_after_quiet_period() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, id) = open_fresh(&store).await;

        sync.edit(|f| f.set_initial_thoughts("customers struggle with X"))
            .await
            .unwrap();
        run_quiet_period().await;

        assert_eq!(store.update_calls(), 1);
        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.initial_thoughts, "customers struggle with X");
        let status = sync.status().await;
        assert_eq!(status.state, SaveState::Clean);
        assert!(status.last_saved_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_retains_error_and_retries_without_data_loss() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, id) = open_fresh(&store).await;

        store.set_fail_updates(true);
        sync.edit(|f| f.set_initial_thoughts("precious text")).await.unwrap();
        run_quiet_period().await;

        assert_eq!(store.update_calls(), 1);
        let status = sync.status().await;
        assert_eq!(status.state, SaveState::Modified);
        assert!(status.last_error.is_some());
        assert!(status.last_saved_at.is_none());
        // In-memory values are not rolled back.
        assert_eq!(
            sync.with_fields(|f| f.initial_thoughts().to_string()).await,
            "precious text"
        );

        // The failure path re-armed the timer, so recovery needs no new
        // edit: the next cycle retries on its own.
        store.set_fail_updates(false);
        run_quiet_period().await;

        assert!(store.update_calls() >= 2);
        let status = sync.status().await;
        assert_eq!(status.state, SaveState::Clean);
        assert!(status.last_error.is_none());
        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.initial_thoughts, "precious text");
    }

    #[tokio::test(start_paused = true)]
    async fn edit_during_inflight_save_queues_a_second_save() {
        let store = Arc::new(InstrumentedStore::with_update_delay(Duration::from_secs(2)));
        let id = store.create("user-1", "Test", "").await.unwrap();
        let sync = Synchronizer::new(store.clone() as Arc<dyn ProcessStore>);
        sync.open(&id).await.unwrap();

        sync.edit(|f| f.set_initial_thoughts("v1")).await.unwrap();
        // Timer fires at t=5; the save stays in flight until t=7.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(sync.status().await.state, SaveState::Saving);

        // An edit arriving while Saving does not cancel the in-flight
        // request; it is queued by re-arming after the save settles.
        sync.edit(|f| f.set_initial_thoughts("v2")).await.unwrap();

        // First save settles at t=7 leaving state Modified; the re-armed
        // timer fires at t=12 and the second save settles at t=14.
        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.update_calls(), 2);
        assert_eq!(sync.status().await.state, SaveState::Clean);
        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.initial_thoughts, "v2");
    }

    #[tokio::test(start_paused = true)]
    async fn opening_overwrites_local_unsaved_edits() {
        let store = Arc::new(InstrumentedStore::new());
        let first = store.create("user-1", "First", "").await.unwrap();
        let second = store.create("user-1", "Second", "").await.unwrap();
        store
            .update(
                &second,
                ProcessPatch {
                    initial_thoughts: Some("server copy".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sync = Synchronizer::new(store.clone() as Arc<dyn ProcessStore>);
        sync.open(&first).await.unwrap();
        sync.edit(|f| f.set_initial_thoughts("unsaved local edit"))
            .await
            .unwrap();

        // Switching processes discards local unsaved edits: server wins.
        sync.open(&second).await.unwrap();
        assert_eq!(
            sync.with_fields(|f| f.initial_thoughts().to_string()).await,
            "server copy"
        );
        assert_eq!(sync.status().await.state, SaveState::Clean);

        // The pending debounce of the first process was cancelled.
        let calls_before = store.update_calls();
        run_quiet_period().await;
        assert_eq!(store.update_calls(), calls_before);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_text_counts_as_an_edit() {
        let store = Arc::new(InstrumentedStore::new());
        let (sync, id) = open_fresh(&store).await;

        sync.edit(|f| f.set_suggestion(QuestionKey::Problem, "AI suggested wording"))
            .await
            .unwrap();
        run_quiet_period().await;

        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(
            saved.working_backwards.suggestions[&QuestionKey::Problem],
            "AI suggested wording"
        );
    }
}
