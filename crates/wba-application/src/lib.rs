//! Application layer: the synchronizer (autosave state machine), the
//! process directory and the suggestion service, wired together over the
//! core traits.

pub mod directory;
pub mod suggestion;
pub mod synchronizer;

pub use directory::{DirectorySort, ListQuery, ProcessDirectory};
pub use suggestion::{SuggestionService, SUGGESTION_UNAVAILABLE};
pub use synchronizer::{SaveState, SyncStatus, Synchronizer, DEFAULT_DEBOUNCE};
