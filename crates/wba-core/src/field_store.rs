//! The field store: the single authoritative in-memory model of the
//! process currently being edited.
//!
//! UI input handlers mutate it synchronously through typed accessors; the
//! synchronizer snapshots it for autosaves and overwrites it wholesale when
//! a process is (re)loaded.

use crate::process::{
    Assumption, Experiment, FaqEntry, PrfaqDocument, Process, ProcessPatch, QuestionKey, Rating,
    WorkingBackwards,
};
use uuid::Uuid;

/// Which of the two FAQ lists an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqAudience {
    Customer,
    Stakeholder,
}

/// In-memory holder of the process's current editable values.
///
/// Holds everything mutable on a [`Process`] except identity and timestamps.
/// `load` fully overwrites all contents, `snapshot` serializes them for a
/// save, `clear` resets to the empty shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    title: String,
    initial_thoughts: String,
    working_backwards: WorkingBackwards,
    document: PrfaqDocument,
    assumptions: Vec<Assumption>,
    experiments: Vec<Experiment>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Overwrites all contents from a fetched snapshot.
    ///
    /// Absent sub-objects already default to their empty shape during
    /// deserialization, so a plain field copy is a full reset.
    pub fn load(&mut self, process: &Process) {
        self.title = process.title.clone();
        self.initial_thoughts = process.initial_thoughts.clone();
        self.working_backwards = process.working_backwards.clone();
        self.document = process.document.clone();
        self.assumptions = process.assumptions.clone();
        self.experiments = process.experiments.clone();
    }

    /// Resets every field to the empty shape, keeping the given title.
    pub fn clear_with_title(&mut self, title: impl Into<String>) {
        *self = Self::default();
        self.title = title.into();
    }

    /// Resets every field to the empty shape.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Serializes the full current contents as a save payload.
    pub fn snapshot(&self) -> ProcessPatch {
        ProcessPatch {
            title: Some(self.title.clone()),
            initial_thoughts: Some(self.initial_thoughts.clone()),
            working_backwards: Some(self.working_backwards.clone()),
            document: Some(self.document.clone()),
            assumptions: Some(self.assumptions.clone()),
            experiments: Some(self.experiments.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Text fields
    // ------------------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn initial_thoughts(&self) -> &str {
        &self.initial_thoughts
    }

    pub fn set_initial_thoughts(&mut self, text: impl Into<String>) {
        self.initial_thoughts = text.into();
    }

    pub fn answer(&self, key: QuestionKey) -> &str {
        self.working_backwards
            .answers
            .get(&key)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_answer(&mut self, key: QuestionKey, text: impl Into<String>) {
        self.working_backwards.answers.insert(key, text.into());
    }

    /// Cached AI suggestion for a question, if one has been fetched.
    pub fn suggestion(&self, key: QuestionKey) -> Option<&str> {
        self.working_backwards
            .suggestions
            .get(&key)
            .map(String::as_str)
    }

    /// Stores a fetched AI suggestion. Suggestion text counts as a field
    /// edit, so callers route this through the synchronizer.
    pub fn set_suggestion(&mut self, key: QuestionKey, text: impl Into<String>) {
        self.working_backwards.suggestions.insert(key, text.into());
    }

    // ------------------------------------------------------------------
    // Document
    // ------------------------------------------------------------------

    pub fn document(&self) -> &PrfaqDocument {
        &self.document
    }

    /// Applies an in-place edit to the press-release/FAQ draft.
    pub fn edit_document(&mut self, f: impl FnOnce(&mut PrfaqDocument)) {
        f(&mut self.document);
    }

    /// Appends a question/answer pair to one of the FAQ lists.
    pub fn add_faq(&mut self, audience: FaqAudience, question: String, answer: String) {
        let entry = FaqEntry { question, answer };
        match audience {
            FaqAudience::Customer => self.document.customer_faqs.push(entry),
            FaqAudience::Stakeholder => self.document.stakeholder_faqs.push(entry),
        }
    }

    /// Replaces a FAQ entry in place. Returns false for an out-of-range
    /// index.
    pub fn update_faq(
        &mut self,
        audience: FaqAudience,
        index: usize,
        question: String,
        answer: String,
    ) -> bool {
        let list = match audience {
            FaqAudience::Customer => &mut self.document.customer_faqs,
            FaqAudience::Stakeholder => &mut self.document.stakeholder_faqs,
        };
        match list.get_mut(index) {
            Some(entry) => {
                entry.question = question;
                entry.answer = answer;
                true
            }
            None => false,
        }
    }

    /// Removes a FAQ entry by position. Out-of-range indexes are ignored.
    pub fn remove_faq(&mut self, audience: FaqAudience, index: usize) {
        let list = match audience {
            FaqAudience::Customer => &mut self.document.customer_faqs,
            FaqAudience::Stakeholder => &mut self.document.stakeholder_faqs,
        };
        if index < list.len() {
            list.remove(index);
        }
    }

    // ------------------------------------------------------------------
    // Assumptions
    // ------------------------------------------------------------------

    pub fn assumptions(&self) -> &[Assumption] {
        &self.assumptions
    }

    /// Assumptions ordered by priority (ascending). Ties keep insertion
    /// order.
    pub fn assumptions_by_priority(&self) -> Vec<&Assumption> {
        let mut ordered: Vec<&Assumption> = self.assumptions.iter().collect();
        ordered.sort_by_key(|a| a.priority);
        ordered
    }

    /// Adds an assumption at the end of the priority order and returns its
    /// id.
    pub fn add_assumption(&mut self, statement: String, impact: Rating, confidence: Rating) -> String {
        let id = Uuid::new_v4().to_string();
        let priority = self
            .assumptions
            .iter()
            .map(|a| a.priority)
            .max()
            .map_or(0, |p| p + 1);
        self.assumptions.push(Assumption {
            id: id.clone(),
            statement,
            impact,
            confidence,
            priority,
        });
        id
    }

    /// Applies an in-place edit to the assumption with the given id.
    /// Returns false if the id is unknown.
    pub fn update_assumption(&mut self, id: &str, f: impl FnOnce(&mut Assumption)) -> bool {
        match self.assumptions.iter_mut().find(|a| a.id == id) {
            Some(assumption) => {
                f(assumption);
                true
            }
            None => false,
        }
    }

    /// Removes an assumption by id. Experiments referencing it keep their
    /// reference; lookups render it as "unknown assumption".
    pub fn remove_assumption(&mut self, id: &str) {
        self.assumptions.retain(|a| a.id != id);
    }

    /// Moves an assumption one step up the priority order by swapping the
    /// two `priority` values; all other fields stay untouched. A no-op for
    /// the top entry or an unknown id.
    pub fn move_assumption_up(&mut self, id: &str) {
        let ordered: Vec<String> = self
            .assumptions_by_priority()
            .iter()
            .map(|a| a.id.clone())
            .collect();
        if let Some(pos) = ordered.iter().position(|x| x == id) {
            if pos > 0 {
                self.swap_priorities(&ordered[pos - 1], &ordered[pos]);
            }
        }
    }

    /// Moves an assumption one step down the priority order. A no-op for
    /// the bottom entry or an unknown id.
    pub fn move_assumption_down(&mut self, id: &str) {
        let ordered: Vec<String> = self
            .assumptions_by_priority()
            .iter()
            .map(|a| a.id.clone())
            .collect();
        if let Some(pos) = ordered.iter().position(|x| x == id) {
            if pos + 1 < ordered.len() {
                self.swap_priorities(&ordered[pos], &ordered[pos + 1]);
            }
        }
    }

    fn swap_priorities(&mut self, first_id: &str, second_id: &str) {
        let first = self
            .assumptions
            .iter()
            .find(|a| a.id == first_id)
            .map(|a| a.priority);
        let second = self
            .assumptions
            .iter()
            .find(|a| a.id == second_id)
            .map(|a| a.priority);
        if let (Some(first), Some(second)) = (first, second) {
            for assumption in &mut self.assumptions {
                if assumption.id == first_id {
                    assumption.priority = second;
                } else if assumption.id == second_id {
                    assumption.priority = first;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Adds an experiment and returns its id.
    pub fn add_experiment(&mut self, name: String, hypothesis: String) -> String {
        let id = Uuid::new_v4().to_string();
        self.experiments.push(Experiment {
            id: id.clone(),
            name,
            hypothesis,
            methodology: String::new(),
            success_criteria: String::new(),
            status: Default::default(),
            related_assumption_ids: Vec::new(),
        });
        id
    }

    /// Applies an in-place edit to the experiment with the given id.
    /// Returns false if the id is unknown.
    pub fn update_experiment(&mut self, id: &str, f: impl FnOnce(&mut Experiment)) -> bool {
        match self.experiments.iter_mut().find(|e| e.id == id) {
            Some(experiment) => {
                f(experiment);
                true
            }
            None => false,
        }
    }

    pub fn remove_experiment(&mut self, id: &str) {
        self.experiments.retain(|e| e.id != id);
    }

    /// Display label for an assumption referenced from an experiment.
    ///
    /// Dangling references are tolerated, not rejected: they render as
    /// "unknown assumption".
    pub fn assumption_label(&self, id: &str) -> String {
        self.assumptions
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.statement.clone())
            .unwrap_or_else(|| "unknown assumption".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ExperimentStatus;

    #[test]
    fn move_up_swaps_priorities_and_keeps_other_fields() {
        let mut fields = FieldStore::new();
        let first = fields.add_assumption(
            "Customers will pay $10/mo".to_string(),
            Rating::High,
            Rating::Medium,
        );
        let second = fields.add_assumption(
            "Setup takes under five minutes".to_string(),
            Rating::Medium,
            Rating::Low,
        );

        let before: Vec<Assumption> = fields.assumptions().to_vec();
        assert_eq!(before[0].priority, 0);
        assert_eq!(before[1].priority, 1);

        fields.move_assumption_up(&second);

        let ordered = fields.assumptions_by_priority();
        assert_eq!(ordered[0].id, second);
        assert_eq!(ordered[0].priority, 0);
        assert_eq!(ordered[1].id, first);
        assert_eq!(ordered[1].priority, 1);

        // Everything except priority is unchanged.
        for old in &before {
            let new = fields.assumptions().iter().find(|a| a.id == old.id).unwrap();
            assert_eq!(new.statement, old.statement);
            assert_eq!(new.impact, old.impact);
            assert_eq!(new.confidence, old.confidence);
        }
    }

    #[test]
    fn move_up_on_top_entry_is_a_noop() {
        let mut fields = FieldStore::new();
        let only = fields.add_assumption("solo".to_string(), Rating::Low, Rating::Low);
        fields.move_assumption_up(&only);
        assert_eq!(fields.assumptions()[0].priority, 0);
    }

    #[test]
    fn move_down_swaps_priorities() {
        let mut fields = FieldStore::new();
        let first = fields.add_assumption("a".to_string(), Rating::High, Rating::High);
        let _second = fields.add_assumption("b".to_string(), Rating::High, Rating::High);
        fields.move_assumption_down(&first);
        assert_eq!(fields.assumptions_by_priority()[1].id, first);
    }

    #[test]
    fn dangling_assumption_reference_renders_unknown() {
        let mut fields = FieldStore::new();
        let experiment = fields.add_experiment("Landing page".to_string(), "People sign up".to_string());
        fields.update_experiment(&experiment, |e| {
            e.related_assumption_ids.push("gone".to_string());
            e.status = ExperimentStatus::InProgress;
        });
        assert_eq!(fields.assumption_label("gone"), "unknown assumption");
    }

    #[test]
    fn faq_entries_update_and_remove_by_position() {
        let mut fields = FieldStore::new();
        fields.add_faq(
            FaqAudience::Stakeholder,
            "Cost?".to_string(),
            "TBD".to_string(),
        );

        assert!(fields.update_faq(
            FaqAudience::Stakeholder,
            0,
            "Cost?".to_string(),
            "$50k".to_string(),
        ));
        assert_eq!(fields.document().stakeholder_faqs[0].answer, "$50k");
        assert!(!fields.update_faq(
            FaqAudience::Stakeholder,
            5,
            "x".to_string(),
            "y".to_string(),
        ));

        fields.remove_faq(FaqAudience::Stakeholder, 0);
        assert!(fields.document().stakeholder_faqs.is_empty());
        // Out of range is ignored.
        fields.remove_faq(FaqAudience::Stakeholder, 0);
    }

    #[test]
    fn load_overwrites_all_contents() {
        let mut fields = FieldStore::new();
        fields.set_initial_thoughts("local unsaved edit");
        fields.add_assumption("stale".to_string(), Rating::Low, Rating::Low);

        let mut process = Process::empty("p1", "user-1", "Fetched");
        process.initial_thoughts = "server copy".to_string();
        fields.load(&process);

        assert_eq!(fields.title(), "Fetched");
        assert_eq!(fields.initial_thoughts(), "server copy");
        assert!(fields.assumptions().is_empty());
    }

    #[test]
    fn snapshot_carries_every_field() {
        let mut fields = FieldStore::new();
        fields.set_title("T");
        fields.set_answer(QuestionKey::Customer, "Small teams");
        fields.set_suggestion(QuestionKey::Customer, "Consider startups");
        fields.add_faq(
            FaqAudience::Customer,
            "How much?".to_string(),
            "$10/mo".to_string(),
        );

        let snapshot = fields.snapshot();
        assert_eq!(snapshot.title.as_deref(), Some("T"));
        let wb = snapshot.working_backwards.unwrap();
        assert_eq!(wb.answers[&QuestionKey::Customer], "Small teams");
        assert_eq!(wb.suggestions[&QuestionKey::Customer], "Consider startups");
        assert_eq!(snapshot.document.unwrap().customer_faqs.len(), 1);
    }
}
