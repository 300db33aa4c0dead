//! Core domain layer of the Working Backwards Assistant.
//!
//! Holds the process model, the field store (the single authoritative
//! in-memory copy of the process being edited), the store and identity
//! traits, and the shared error type. Everything here is backend-agnostic;
//! concrete storage and HTTP live in the infrastructure and server crates.

pub mod error;
pub mod field_store;
pub mod process;
pub mod user;

pub use error::{Result, WbaError};
pub use field_store::{FaqAudience, FieldStore};
pub use process::{
    Assumption, DirectoryWatch, Experiment, ExperimentStatus, FaqEntry, PrfaqDocument, Process,
    ProcessPatch, ProcessStore, ProcessSummary, ProcessWatch, QuestionKey, Rating,
    WorkingBackwards,
};
pub use user::{AuthenticatedUser, IdentityProvider, NoIdentity, StaticIdentityProvider, Tier};
