use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeTypeFlags, ChangeValues};
use crate::domain::draft::Draft;
use crate::domain::line_item::LineItemChange;
use crate::domain::opportunity::{Opportunity, OpportunityId};
use crate::flows::{FlowContext, WizardStep};

/// Composite state owned by the controller and mutated only through panel events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub selection: Vec<OpportunityId>,
    pub selected_records: Vec<Opportunity>,
    pub flags: ChangeTypeFlags,
    pub values: ChangeValues,
    pub line_item_changes: Vec<LineItemChange>,
    pub is_confirmed: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::SelectRecords,
            selection: Vec::new(),
            selected_records: Vec::new(),
            flags: ChangeTypeFlags::default(),
            values: ChangeValues::default(),
            line_item_changes: Vec::new(),
            is_confirmed: false,
        }
    }
}

impl WizardState {
    pub fn flow_context(&self, line_item_step_applies: bool) -> FlowContext {
        FlowContext {
            has_selection: !self.selection.is_empty(),
            has_change_type: self.flags.any(),
            line_item_step_applies,
        }
    }

    pub fn to_draft(&self) -> Draft {
        Draft {
            selected_opportunities: Some(self.selection.clone()),
            selected_change_types: Some(self.flags.clone()),
            change_values: Some(self.values.clone()),
            product_changes: Some(self.line_item_changes.clone()),
            current_step: Some(self.current_step.number()),
        }
    }

    /// Restores draft slices. The selection is kept when `keep_selection` is set.
    /// Returns the step the draft was saved on.
    pub fn restore_draft(&mut self, draft: Draft, keep_selection: bool) -> WizardStep {
        if !keep_selection {
            self.selection = dedup_ids(draft.selected_opportunities.unwrap_or_default());
        }
        self.flags = draft.selected_change_types.unwrap_or_default();
        self.values = draft.change_values.unwrap_or_default();
        self.line_item_changes = draft.product_changes.unwrap_or_default();
        draft.current_step.and_then(WizardStep::from_number).unwrap_or(WizardStep::SelectRecords)
    }
}

pub(crate) fn dedup_ids(ids: Vec<OpportunityId>) -> Vec<OpportunityId> {
    let mut unique: Vec<OpportunityId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
