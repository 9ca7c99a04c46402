use crate::domain::opportunity::{format_close_date, format_currency, Opportunity, OpportunityId};
use crate::errors::{RemoteFailure, ValidationError};
use crate::wizard::events::PanelEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed { message: String },
}

/// Candidate as displayed in the list.
#[derive(Clone, Debug, PartialEq)]
pub struct OpportunityRow {
    pub opportunity: Opportunity,
    pub is_selected: bool,
    pub formatted_amount: String,
    pub formatted_close_date: String,
}

/// Searchable, toggle-selectable list of candidate opportunities.
#[derive(Clone, Debug)]
pub struct SelectionPanel {
    candidates: Vec<Opportunity>,
    selected: Vec<OpportunityId>,
    search_term: String,
    displayed: Vec<OpportunityRow>,
    load_state: LoadState,
    max_selection: usize,
    show_validation_error: bool,
}

impl SelectionPanel {
    pub fn new(max_selection: usize) -> Self {
        Self {
            candidates: Vec::new(),
            selected: Vec::new(),
            search_term: String::new(),
            displayed: Vec::new(),
            load_state: LoadState::Loading,
            max_selection,
            show_validation_error: false,
        }
    }

    pub fn load_candidates(&mut self, candidates: Vec<Opportunity>) {
        self.candidates = candidates;
        self.load_state = LoadState::Ready;
        self.refilter();
    }

    pub fn load_failed(&mut self, failure: &RemoteFailure) {
        self.candidates.clear();
        self.load_state = LoadState::Failed { message: failure.load_message() };
        self.refilter();
    }

    /// Pushes the controller's selection back into the panel.
    pub fn on_input(&mut self, selected: &[OpportunityId]) {
        if self.selected != selected {
            self.selected = selected.to_vec();
            self.refilter();
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.refilter();
    }

    pub fn toggle(&mut self, id: &OpportunityId) -> PanelEvent {
        if let Some(position) = self.selected.iter().position(|selected| selected == id) {
            self.selected.remove(position);
        } else {
            self.selected.push(id.clone());
        }
        self.show_validation_error = false;
        self.changed()
    }

    pub fn select_all(&mut self) -> PanelEvent {
        self.selected = self.candidates.iter().map(|candidate| candidate.id.clone()).collect();
        self.show_validation_error = false;
        self.changed()
    }

    pub fn deselect_all(&mut self) -> PanelEvent {
        self.selected.clear();
        self.changed()
    }

    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let result = if self.selected.is_empty() {
            Err(ValidationError::EmptySelection)
        } else if self.selected.len() > self.max_selection {
            Err(ValidationError::TooManyOpportunities {
                max: self.max_selection,
                selected: self.selected.len(),
            })
        } else {
            Ok(())
        };
        self.show_validation_error = result.is_err();
        result
    }

    pub fn selected_ids(&self) -> &[OpportunityId] {
        &self.selected
    }

    /// Selected candidates in list order.
    pub fn selected_records(&self) -> Vec<Opportunity> {
        self.candidates
            .iter()
            .filter(|candidate| self.selected.contains(&candidate.id))
            .cloned()
            .collect()
    }

    pub fn displayed(&self) -> &[OpportunityRow] {
        &self.displayed
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn total_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn all_selected(&self) -> bool {
        self.total_count() > 0 && self.selected_count() == self.total_count()
    }

    pub fn has_no_candidates(&self) -> bool {
        self.load_state == LoadState::Ready && self.candidates.is_empty()
    }

    pub fn show_validation_error(&self) -> bool {
        self.show_validation_error
    }

    pub fn without_quotes(&self) -> Vec<&Opportunity> {
        self.candidates.iter().filter(|candidate| !candidate.has_quote()).collect()
    }

    fn changed(&mut self) -> PanelEvent {
        self.refilter();
        PanelEvent::SelectionChanged { ids: self.selected.clone(), records: self.selected_records() }
    }

    fn refilter(&mut self) {
        let needle = self.search_term.trim().to_lowercase();
        self.displayed = self
            .candidates
            .iter()
            .filter(|candidate| needle.is_empty() || candidate.matches_search(&needle))
            .map(|candidate| OpportunityRow {
                opportunity: candidate.clone(),
                is_selected: self.selected.contains(&candidate.id),
                formatted_amount: format_currency(candidate.amount),
                formatted_close_date: format_close_date(candidate.close_date),
            })
            .collect();
    }
}
