//! The process directory: enumerates the current user's processes,
//! supports creation and deletion, and tracks which one is open.
//!
//! The "current" id lives in the synchronizer (single source of truth);
//! the directory performs the authorization checks and drives the
//! synchronizer's load protocol.

use crate::synchronizer::Synchronizer;
use std::sync::Arc;
use tokio::sync::Mutex;
use wba_core::error::{Result, WbaError};
use wba_core::process::{DirectoryWatch, ProcessStore, ProcessSummary};
use wba_core::user::IdentityProvider;

/// Ordering of the directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectorySort {
    /// Most recently updated first.
    #[default]
    UpdatedDesc,
    /// Oldest updated first.
    UpdatedAsc,
    /// By title, case-insensitive.
    Title,
}

/// Listing parameters: optional case-insensitive title filter plus sort.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub sort: DirectorySort,
}

/// Directory of processes owned by the current user.
pub struct ProcessDirectory {
    store: Arc<dyn ProcessStore>,
    identity: Arc<dyn IdentityProvider>,
    synchronizer: Synchronizer,
    /// Live membership subscription, keyed by the owner it was opened for.
    directory_watch: Mutex<Option<(String, DirectoryWatch)>>,
}

impl ProcessDirectory {
    pub fn new(
        store: Arc<dyn ProcessStore>,
        identity: Arc<dyn IdentityProvider>,
        synchronizer: Synchronizer,
    ) -> Self {
        Self {
            store,
            identity,
            synchronizer,
            directory_watch: Mutex::new(None),
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    /// Creates a new empty process with the given title, opens it, and
    /// returns its id.
    ///
    /// Requires an authenticated user; a blank title is rejected before
    /// any store write occurs.
    pub async fn create(&self, title: &str) -> Result<String> {
        let user = self.identity.current_user().ok_or(WbaError::Unauthorized)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(WbaError::validation("a process title is required"));
        }

        let id = self.store.create(&user.user_id, title, "").await?;
        // The load protocol delivers the empty snapshot, which clears the
        // field store and sets state Clean.
        self.synchronizer.open(&id).await?;
        tracing::info!(process_id = %id, "created process");
        Ok(id)
    }

    /// Opens an existing process after checking ownership.
    ///
    /// Fails with a not-found error if the id does not resolve and a
    /// permission error if the process belongs to another user; neither
    /// failure touches the field store.
    pub async fn open(&self, id: &str) -> Result<()> {
        let user = self.identity.current_user().ok_or(WbaError::Unauthorized)?;
        let process = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| WbaError::not_found("process", id))?;
        if process.owner_id != user.user_id {
            return Err(WbaError::permission_denied("process", id));
        }
        self.synchronizer.open(id).await
    }

    /// Removes the durable record.
    ///
    /// If it was the current process, clears the current id and cancels
    /// the pending debounce; the field store contents stay in place until
    /// the user navigates away.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let user = self.identity.current_user().ok_or(WbaError::Unauthorized)?;
        match self.store.get(id).await? {
            None => return Ok(()),
            Some(process) if process.owner_id != user.user_id => {
                return Err(WbaError::permission_denied("process", id));
            }
            Some(_) => {}
        }

        self.store.delete(id).await?;
        if self.synchronizer.open_process_id().await.as_deref() == Some(id) {
            self.synchronizer.close().await;
        }
        tracing::info!(process_id = %id, "deleted process");
        Ok(())
    }

    /// Returns the current user's processes, filtered and sorted.
    ///
    /// Backed by a live push-updated subscription; membership updates
    /// arrive asynchronously and never disturb the open editing session.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<ProcessSummary>> {
        let user = self.identity.current_user().ok_or(WbaError::Unauthorized)?;

        let mut list = {
            let mut guard = self.directory_watch.lock().await;
            let stale = !matches!(&*guard, Some((owner, _)) if *owner == user.user_id);
            if stale {
                let watch = self.store.subscribe_many(&user.user_id).await?;
                *guard = Some((user.user_id.clone(), watch));
            }
            match guard.as_mut() {
                Some((_, watch)) => watch.borrow_and_update().clone(),
                None => Vec::new(),
            }
        };

        if let Some(filter) = &query.filter {
            let needle = filter.to_lowercase();
            list.retain(|summary| summary.title.to_lowercase().contains(&needle));
        }
        match query.sort {
            DirectorySort::UpdatedDesc => list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            DirectorySort::UpdatedAsc => list.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
            DirectorySort::Title => {
                list.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
        }
        Ok(list)
    }
}
