//! Process domain: model, store trait and subscription handles.

pub mod model;
pub mod repository;

pub use model::{
    Assumption, Experiment, ExperimentStatus, FaqEntry, PrfaqDocument, Process, ProcessPatch,
    ProcessSummary, QuestionKey, Rating, WorkingBackwards,
};
pub use repository::{DirectoryWatch, ProcessStore, ProcessWatch};
