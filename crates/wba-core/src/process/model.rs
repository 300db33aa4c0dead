//! Process domain model.
//!
//! A `Process` is one complete Working Backwards session: initial thoughts,
//! the five structured question answers, the press-release/FAQ draft, the
//! assumption list and the validation experiments, persisted as a single
//! record owned by one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// The five fixed Working Backwards questions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestionKey {
    /// Who is the customer?
    Customer,
    /// What is the customer problem or opportunity?
    Problem,
    /// What is the most important customer benefit?
    Solution,
    /// What does the customer experience look like?
    Experience,
    /// How will you measure success?
    Measurement,
}

/// Answers to the structured questions plus the cached AI suggestions.
///
/// The suggestion map is a cache keyed by question, not authoritative data;
/// losing it costs a re-fetch, nothing more.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingBackwards {
    /// Question key -> answer text.
    #[serde(default)]
    pub answers: HashMap<QuestionKey, String>,
    /// Question key -> last AI-generated suggestion text.
    #[serde(default)]
    pub suggestions: HashMap<QuestionKey, String>,
}

/// One question/answer pair in a FAQ list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// The press-release/FAQ draft.
///
/// Six narrative fields plus two ordered FAQ lists (customer-facing and
/// stakeholder-facing). Absent sub-objects default to their empty shape on
/// load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrfaqDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub leader_quote: String,
    #[serde(default)]
    pub customer_quote: String,
    #[serde(default)]
    pub call_to_action: String,
    #[serde(default)]
    pub customer_faqs: Vec<FaqEntry>,
    #[serde(default)]
    pub stakeholder_faqs: Vec<FaqEntry>,
}

/// Impact or likelihood rating used on assumptions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rating {
    High,
    #[default]
    Medium,
    Low,
}

/// A belief that must hold for the proposed product to succeed.
///
/// `priority` is used only for relative ordering among assumptions; ties are
/// tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub id: String,
    pub statement: String,
    pub impact: Rating,
    pub confidence: Rating,
    pub priority: i32,
}

/// Lifecycle status of an experiment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExperimentStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

/// A planned or executed test designed to validate one or more assumptions.
///
/// `related_assumption_ids` should reference existing assumptions, but
/// dangling references are tolerated and rendered as "unknown assumption".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hypothesis: String,
    #[serde(default)]
    pub methodology: String,
    #[serde(default)]
    pub success_criteria: String,
    #[serde(default)]
    pub status: ExperimentStatus,
    #[serde(default)]
    pub related_assumption_ids: Vec<String>,
}

/// The top-level persisted entity: one Working Backwards session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Unique process identifier (UUID format), assigned at creation.
    pub id: String,
    /// Identifier of the owning user; immutable after creation.
    pub owner_id: String,
    /// Human-readable label.
    pub title: String,
    /// Timestamp when the process was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed by the store on every successful save.
    pub updated_at: DateTime<Utc>,
    /// Free-form capture of initial thoughts.
    #[serde(default)]
    pub initial_thoughts: String,
    /// Structured question answers and the suggestion cache.
    #[serde(default)]
    pub working_backwards: WorkingBackwards,
    /// The press-release/FAQ draft.
    #[serde(default)]
    pub document: PrfaqDocument,
    /// Ordered assumption list.
    #[serde(default)]
    pub assumptions: Vec<Assumption>,
    /// Ordered experiment list.
    #[serde(default)]
    pub experiments: Vec<Experiment>,
}

impl Process {
    /// Creates an empty process with the given identity fields.
    ///
    /// All text fields start blank; timestamps are set to now.
    pub fn empty(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            initial_thoughts: String::new(),
            working_backwards: WorkingBackwards::default(),
            document: PrfaqDocument::default(),
            assumptions: Vec::new(),
            experiments: Vec::new(),
        }
    }

    /// Condenses this process into its directory listing form.
    pub fn summary(&self) -> ProcessSummary {
        ProcessSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Lightweight listing entry for the process directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update payload for `ProcessStore::update`.
///
/// Every mutable field is optional; a full autosave snapshot fills all of
/// them, while targeted operations (e.g. a title rename) fill one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessPatch {
    pub title: Option<String>,
    pub initial_thoughts: Option<String>,
    pub working_backwards: Option<WorkingBackwards>,
    pub document: Option<PrfaqDocument>,
    pub assumptions: Option<Vec<Assumption>>,
    pub experiments: Option<Vec<Experiment>>,
}

impl ProcessPatch {
    /// Applies the present fields onto `process`, leaving absent ones intact.
    ///
    /// Does not touch `id`, `owner_id` or timestamps; refreshing
    /// `updated_at` is the store's responsibility on commit.
    pub fn apply_to(&self, process: &mut Process) {
        if let Some(title) = &self.title {
            process.title = title.clone();
        }
        if let Some(initial_thoughts) = &self.initial_thoughts {
            process.initial_thoughts = initial_thoughts.clone();
        }
        if let Some(working_backwards) = &self.working_backwards {
            process.working_backwards = working_backwards.clone();
        }
        if let Some(document) = &self.document {
            process.document = document.clone();
        }
        if let Some(assumptions) = &self.assumptions {
            process.assumptions = assumptions.clone();
        }
        if let Some(experiments) = &self.experiments {
            process.experiments = experiments.clone();
        }
    }

    /// True if no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.initial_thoughts.is_none()
            && self.working_backwards.is_none()
            && self.document.is_none()
            && self.assumptions.is_none()
            && self.experiments.is_none()
    }
}
