//! Concrete storage backends for the Working Backwards Assistant.
//!
//! Two `ProcessStore` implementations share one subscription layer: an
//! in-memory store (tests, ephemeral sessions) and a TOML file-per-process
//! store (durable local backend).

pub mod dto;
pub mod memory_process_store;
mod subscriptions;
pub mod toml_process_store;

pub use memory_process_store::MemoryProcessStore;
pub use toml_process_store::TomlProcessStore;
