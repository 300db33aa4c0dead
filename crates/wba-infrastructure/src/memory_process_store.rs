//! In-memory ProcessStore implementation.
//!
//! The default backend for tests and ephemeral sessions. Keeps every record
//! in a map and pushes snapshots to subscribers after each committed write,
//! mirroring the push behavior of a remote document database.

use crate::subscriptions::SubscriptionHub;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use wba_core::error::{Result, WbaError};
use wba_core::process::{
    DirectoryWatch, Process, ProcessPatch, ProcessStore, ProcessSummary, ProcessWatch,
};

/// A process store backed by an in-memory map.
#[derive(Default)]
pub struct MemoryProcessStore {
    records: RwLock<HashMap<String, Process>>,
    hub: SubscriptionHub,
}

impl MemoryProcessStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            hub: SubscriptionHub::new(),
        }
    }

    fn owner_list(records: &HashMap<String, Process>, owner_id: &str) -> Vec<ProcessSummary> {
        let mut list: Vec<ProcessSummary> = records
            .values()
            .filter(|p| p.owner_id == owner_id)
            .map(Process::summary)
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }
}

#[async_trait]
impl ProcessStore for MemoryProcessStore {
    async fn create(&self, owner_id: &str, title: &str, initial_thoughts: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut process = Process::empty(&id, owner_id, title);
        process.initial_thoughts = initial_thoughts.to_string();

        let mut records = self.records.write().await;
        records.insert(id.clone(), process);
        self.hub
            .notify_directory(owner_id, Self::owner_list(&records, owner_id));
        tracing::debug!(process_id = %id, owner_id, "created process");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Process>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: ProcessPatch) -> Result<()> {
        let mut records = self.records.write().await;
        let process = records
            .get_mut(id)
            .ok_or_else(|| WbaError::not_found("process", id))?;
        patch.apply_to(process);
        process.updated_at = Utc::now();

        let snapshot = process.clone();
        let owner_id = snapshot.owner_id.clone();
        self.hub.notify_process(id, Some(snapshot));
        self.hub
            .notify_directory(&owner_id, Self::owner_list(&records, &owner_id));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(removed) = records.remove(id) {
            self.hub.notify_process(id, None);
            self.hub.notify_directory(
                &removed.owner_id,
                Self::owner_list(&records, &removed.owner_id),
            );
            tracing::debug!(process_id = %id, "deleted process");
        }
        Ok(())
    }

    async fn subscribe_one(&self, id: &str) -> Result<ProcessWatch> {
        let current = self.records.read().await.get(id).cloned();
        Ok(self.hub.watch_process(id, current))
    }

    async fn subscribe_many(&self, owner_id: &str) -> Result<DirectoryWatch> {
        let records = self.records.read().await;
        Ok(self
            .hub
            .watch_directory(owner_id, Self::owner_list(&records, owner_id)))
    }
}
