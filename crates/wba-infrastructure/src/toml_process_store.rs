//! TOML-based ProcessStore implementation.
//!
//! Stores each process as an individual TOML file:
//!
//! ```text
//! base_dir/
//! └── processes/
//!     ├── <process-id-1>.toml
//!     └── <process-id-2>.toml
//! ```
//!
//! Writes go through a temp-file-then-rename step so a crash mid-write never
//! leaves a truncated record. Local commits are pushed to subscribers the
//! same way the in-memory store does it, so the synchronizer sees one
//! backend contract regardless of the storage choice.

use crate::dto::ProcessDoc;
use crate::subscriptions::SubscriptionHub;
use async_trait::async_trait;
use chrono::Utc;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use wba_core::error::{Result, WbaError};
use wba_core::process::{
    DirectoryWatch, Process, ProcessPatch, ProcessStore, ProcessSummary, ProcessWatch,
};

/// A process store backed by one TOML file per process.
pub struct TomlProcessStore {
    base_dir: PathBuf,
    hub: SubscriptionHub,
}

impl TomlProcessStore {
    /// Creates a store rooted at `base_dir`, creating the directory
    /// structure if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_dir.join("processes"))?;
        Ok(Self {
            base_dir,
            hub: SubscriptionHub::new(),
        })
    }

    /// Creates a store at the default location (`~/.wb-assistant`).
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| WbaError::configuration("failed to determine home directory"))?;
        Self::new(home_dir.join(".wb-assistant"))
    }

    fn process_file_path(&self, id: &str) -> PathBuf {
        self.base_dir.join("processes").join(format!("{id}.toml"))
    }

    fn load_from_path(&self, path: &Path) -> Result<Process> {
        let content = fs::read_to_string(path)?;
        let doc: ProcessDoc = toml::from_str(&content)?;
        Ok(doc.into_domain())
    }

    /// Serializes and writes a record atomically: temp file, flush, rename.
    fn write_record(&self, process: &Process) -> Result<()> {
        let path = self.process_file_path(&process.id);
        let doc = ProcessDoc::from_domain(process);
        let content = toml::to_string_pretty(&doc)?;

        let tmp_path = path.with_extension("toml.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn owner_list(&self, owner_id: &str) -> Result<Vec<ProcessSummary>> {
        let processes_dir = self.base_dir.join("processes");
        let mut list = Vec::new();

        for entry in fs::read_dir(&processes_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }
            match self.load_from_path(&path) {
                Ok(process) if process.owner_id == owner_id => list.push(process.summary()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(?path, error = %e, "skipping unreadable process file");
                }
            }
        }

        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    /// Pushes post-commit notifications. The record is already durable at
    /// this point, so a failed directory rescan must not turn a committed
    /// write into an error; it is logged and the listing catches up on the
    /// next commit.
    fn notify_after_commit(&self, process: &Process) {
        self.hub.notify_process(&process.id, Some(process.clone()));
        match self.owner_list(&process.owner_id) {
            Ok(list) => self.hub.notify_directory(&process.owner_id, list),
            Err(e) => {
                tracing::warn!(owner_id = %process.owner_id, error = %e,
                    "directory refresh failed after commit");
            }
        }
    }
}

#[async_trait]
impl ProcessStore for TomlProcessStore {
    async fn create(&self, owner_id: &str, title: &str, initial_thoughts: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut process = Process::empty(&id, owner_id, title);
        process.initial_thoughts = initial_thoughts.to_string();

        self.write_record(&process)?;
        self.notify_after_commit(&process);
        tracing::debug!(process_id = %id, owner_id, "created process file");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Process>> {
        let path = self.process_file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.load_from_path(&path).map(Some)
    }

    async fn update(&self, id: &str, patch: ProcessPatch) -> Result<()> {
        let path = self.process_file_path(id);
        if !path.exists() {
            return Err(WbaError::not_found("process", id));
        }

        let mut process = self.load_from_path(&path)?;
        patch.apply_to(&mut process);
        process.updated_at = Utc::now();

        self.write_record(&process)?;
        self.notify_after_commit(&process);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.process_file_path(id);
        if !path.exists() {
            return Ok(());
        }

        let owner_id = self.load_from_path(&path).map(|p| p.owner_id).ok();
        fs::remove_file(&path)?;

        self.hub.notify_process(id, None);
        if let Some(owner_id) = owner_id {
            match self.owner_list(&owner_id) {
                Ok(list) => self.hub.notify_directory(&owner_id, list),
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, error = %e,
                        "directory refresh failed after delete");
                }
            }
        }
        tracing::debug!(process_id = %id, "deleted process file");
        Ok(())
    }

    async fn subscribe_one(&self, id: &str) -> Result<ProcessWatch> {
        let current = self.get(id).await?;
        Ok(self.hub.watch_process(id, current))
    }

    async fn subscribe_many(&self, owner_id: &str) -> Result<DirectoryWatch> {
        let current = self.owner_list(owner_id)?;
        Ok(self.hub.watch_directory(owner_id, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wba_core::process::{
        Assumption, Experiment, ExperimentStatus, FaqEntry, QuestionKey, Rating,
    };

    fn seeded_patch() -> ProcessPatch {
        let mut patch = ProcessPatch::default();
        patch.initial_thoughts = Some("first draft".to_string());
        let mut wb = wba_core::process::WorkingBackwards::default();
        wb.answers
            .insert(QuestionKey::Customer, "Indie developers".to_string());
        wb.suggestions
            .insert(QuestionKey::Customer, "Think about agencies too".to_string());
        patch.working_backwards = Some(wb);

        let mut document = wba_core::process::PrfaqDocument::default();
        document.title = "Launch PR".to_string();
        document.customer_faqs.push(FaqEntry {
            question: "Price?".to_string(),
            answer: "$10/mo".to_string(),
        });
        document.stakeholder_faqs.push(FaqEntry {
            question: "Margins?".to_string(),
            answer: "Healthy".to_string(),
        });
        patch.document = Some(document);

        patch.assumptions = Some(vec![
            Assumption {
                id: "a1".to_string(),
                statement: "Customers will pay $10/mo".to_string(),
                impact: Rating::High,
                confidence: Rating::Medium,
                priority: 0,
            },
            Assumption {
                id: "a2".to_string(),
                statement: "Churn stays under 5%".to_string(),
                impact: Rating::Medium,
                confidence: Rating::Low,
                priority: 1,
            },
        ]);
        patch.experiments = Some(vec![Experiment {
            id: "e1".to_string(),
            name: "Landing page".to_string(),
            hypothesis: "People sign up".to_string(),
            methodology: "Ads".to_string(),
            success_criteria: "100 signups".to_string(),
            status: ExperimentStatus::InProgress,
            related_assumption_ids: vec!["a1".to_string()],
        }]);
        patch
    }

    #[tokio::test]
    async fn save_then_reload_round_trips_everything() {
        let temp_dir = TempDir::new().unwrap();
        let id;
        {
            let store = TomlProcessStore::new(temp_dir.path()).unwrap();
            id = store.create("user-1", "Round trip", "").await.unwrap();
            store.update(&id, seeded_patch()).await.unwrap();
        }

        // Fresh store instance simulates a fresh session load.
        let store = TomlProcessStore::new(temp_dir.path()).unwrap();
        let loaded = store.get(&id).await.unwrap().unwrap();

        assert_eq!(loaded.initial_thoughts, "first draft");
        assert_eq!(
            loaded.working_backwards.answers[&QuestionKey::Customer],
            "Indie developers"
        );
        assert_eq!(loaded.document.customer_faqs.len(), 1);
        assert_eq!(loaded.document.stakeholder_faqs.len(), 1);
        // Ordering of the collections is preserved.
        assert_eq!(loaded.assumptions[0].id, "a1");
        assert_eq!(loaded.assumptions[1].id, "a2");
        assert_eq!(loaded.experiments[0].related_assumption_ids, vec!["a1"]);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProcessStore::new(temp_dir.path()).unwrap();
        let err = store
            .update("missing", ProcessPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_file_and_directory_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProcessStore::new(temp_dir.path()).unwrap();
        let id = store.create("user-1", "Victim", "").await.unwrap();

        store.delete(&id).await.unwrap();

        assert!(store.get(&id).await.unwrap().is_none());
        let dir = store.subscribe_many("user-1").await.unwrap();
        assert!(dir.borrow().is_empty());
        // Deleting again is not an error.
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn directory_scan_failure_does_not_fail_a_committed_write() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProcessStore::new(temp_dir.path()).unwrap();
        let id = store.create("user-1", "Committed", "").await.unwrap();
        let process = store.get(&id).await.unwrap().unwrap();
        let mut watch = store.subscribe_one(&id).await.unwrap();

        // Break the listing scan out from under the notification path.
        std::fs::remove_dir_all(temp_dir.path().join("processes")).unwrap();
        store.notify_after_commit(&process);

        // The per-process push was still delivered.
        assert!(watch.has_changed().unwrap());
        assert_eq!(watch.borrow_and_update().as_ref().unwrap().id, id);
    }

    #[tokio::test]
    async fn subscription_sees_local_commits() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlProcessStore::new(temp_dir.path()).unwrap();
        let id = store.create("user-1", "Watched", "").await.unwrap();
        let mut watch = store.subscribe_one(&id).await.unwrap();

        store
            .update(
                &id,
                ProcessPatch {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        watch.changed().await.unwrap();
        assert_eq!(watch.borrow_and_update().as_ref().unwrap().title, "Renamed");
    }
}
