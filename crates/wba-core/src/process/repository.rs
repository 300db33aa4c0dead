//! Process store trait.
//!
//! Defines the interface for durable process persistence, decoupling the
//! synchronizer and directory from the concrete backend (in-memory, TOML
//! files, remote document database).

use super::model::{Process, ProcessPatch, ProcessSummary};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Push-style subscription to a single process record.
///
/// Holds the latest full snapshot; `None` means the record does not (or no
/// longer) exist. Dropping the receiver unsubscribes.
pub type ProcessWatch = watch::Receiver<Option<Process>>;

/// Push-style subscription to the set of processes owned by one user.
///
/// Dropping the receiver unsubscribes.
pub type DirectoryWatch = watch::Receiver<Vec<ProcessSummary>>;

/// An abstract store for process persistence.
///
/// All operations are asynchronous and may fail with a transport
/// (`WbaError::Store`) error. The store refreshes `updated_at` on every
/// committed update and is the durable owner of process data across
/// sessions; the in-memory field store owns working data while a process is
/// open.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Allocates a new process id and writes an empty snapshot with the
    /// given title and initial thoughts. Returns the new id.
    async fn create(&self, owner_id: &str, title: &str, initial_thoughts: &str) -> Result<String>;

    /// Fetches a process by id.
    ///
    /// Returns `Ok(None)` when the id does not resolve.
    async fn get(&self, id: &str) -> Result<Option<Process>>;

    /// Applies a partial update to an existing process and refreshes its
    /// `updated_at` timestamp.
    ///
    /// Fails with a not-found error if the id does not resolve.
    async fn update(&self, id: &str, patch: ProcessPatch) -> Result<()>;

    /// Removes the durable record. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Subscribes to a single process. The returned watch holds the current
    /// snapshot immediately and receives one update per committed write.
    async fn subscribe_one(&self, id: &str) -> Result<ProcessWatch>;

    /// Subscribes to the directory of processes owned by `owner_id`,
    /// seeded with the current membership.
    async fn subscribe_many(&self, owner_id: &str) -> Result<DirectoryWatch>;
}
