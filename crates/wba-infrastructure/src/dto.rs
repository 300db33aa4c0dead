//! Persistence DTO for the TOML process store.
//!
//! The on-disk shape differs from the domain model in one way: the question
//! maps are keyed by plain strings so the files stay hand-readable and
//! forward-tolerant. Unknown question keys found on disk are dropped with a
//! warning rather than failing the load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use wba_core::process::{
    Assumption, Experiment, PrfaqDocument, Process, QuestionKey, WorkingBackwards,
};

/// On-disk representation of a process record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDoc {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub initial_thoughts: String,
    #[serde(default)]
    pub answers: HashMap<String, String>,
    #[serde(default)]
    pub suggestions: HashMap<String, String>,
    #[serde(default)]
    pub document: PrfaqDocument,
    #[serde(default)]
    pub assumptions: Vec<Assumption>,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
}

impl ProcessDoc {
    pub fn from_domain(process: &Process) -> Self {
        Self {
            id: process.id.clone(),
            owner_id: process.owner_id.clone(),
            title: process.title.clone(),
            created_at: process.created_at,
            updated_at: process.updated_at,
            initial_thoughts: process.initial_thoughts.clone(),
            answers: process
                .working_backwards
                .answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            suggestions: process
                .working_backwards
                .suggestions
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            document: process.document.clone(),
            assumptions: process.assumptions.clone(),
            experiments: process.experiments.clone(),
        }
    }

    pub fn into_domain(self) -> Process {
        Process {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
            initial_thoughts: self.initial_thoughts,
            working_backwards: WorkingBackwards {
                answers: parse_question_map(self.answers),
                suggestions: parse_question_map(self.suggestions),
            },
            document: self.document,
            assumptions: self.assumptions,
            experiments: self.experiments,
        }
    }
}

fn parse_question_map(raw: HashMap<String, String>) -> HashMap<QuestionKey, String> {
    let mut parsed = HashMap::new();
    for (key, value) in raw {
        match QuestionKey::from_str(&key) {
            Ok(question) => {
                parsed.insert(question, value);
            }
            Err(_) => {
                tracing::warn!(key, "dropping unknown question key from stored process");
            }
        }
    }
    parsed
}
