//! Watch-channel plumbing shared by the store implementations.
//!
//! Each store keeps one `watch` sender per subscribed process id and per
//! subscribed owner directory, and pushes a fresh snapshot after every
//! committed write. Receivers unsubscribe by being dropped; closed senders
//! are pruned on the next notification.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use wba_core::process::{DirectoryWatch, Process, ProcessSummary, ProcessWatch};

#[derive(Default)]
pub(crate) struct SubscriptionHub {
    processes: Mutex<HashMap<String, watch::Sender<Option<Process>>>>,
    directories: Mutex<HashMap<String, watch::Sender<Vec<ProcessSummary>>>>,
}

impl SubscriptionHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Subscribes to one process, seeding the watch with `current`.
    pub(crate) fn watch_process(&self, id: &str, current: Option<Process>) -> ProcessWatch {
        let mut processes = self.processes.lock().expect("subscription hub poisoned");
        match processes.get(id) {
            Some(sender) if !sender.is_closed() => {
                // Re-seed so a late subscriber sees the latest snapshot.
                sender.send_replace(current);
                sender.subscribe()
            }
            _ => {
                let (sender, receiver) = watch::channel(current);
                processes.insert(id.to_string(), sender);
                receiver
            }
        }
    }

    /// Subscribes to an owner's directory, seeding the watch with `current`.
    pub(crate) fn watch_directory(
        &self,
        owner_id: &str,
        current: Vec<ProcessSummary>,
    ) -> DirectoryWatch {
        let mut directories = self.directories.lock().expect("subscription hub poisoned");
        match directories.get(owner_id) {
            Some(sender) if !sender.is_closed() => {
                sender.send_replace(current);
                sender.subscribe()
            }
            _ => {
                let (sender, receiver) = watch::channel(current);
                directories.insert(owner_id.to_string(), sender);
                receiver
            }
        }
    }

    /// Pushes a new snapshot (or `None` after deletion) to process watchers.
    pub(crate) fn notify_process(&self, id: &str, value: Option<Process>) {
        let mut processes = self.processes.lock().expect("subscription hub poisoned");
        if let Some(sender) = processes.get(id) {
            if sender.is_closed() {
                processes.remove(id);
            } else {
                sender.send_replace(value);
            }
        }
    }

    /// Pushes a refreshed membership list to directory watchers.
    pub(crate) fn notify_directory(&self, owner_id: &str, list: Vec<ProcessSummary>) {
        let mut directories = self.directories.lock().expect("subscription hub poisoned");
        if let Some(sender) = directories.get(owner_id) {
            if sender.is_closed() {
                directories.remove(owner_id);
            } else {
                sender.send_replace(list);
            }
        }
    }
}
