use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeTypeFlags, ChangeValues};
use crate::domain::line_item::LineItemChange;
use crate::domain::opportunity::{Opportunity, OpportunityId};

/// A panel's complete replacement for the slice of wizard state it owns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelEvent {
    SelectionChanged { ids: Vec<OpportunityId>, records: Vec<Opportunity> },
    OptionsChanged { flags: ChangeTypeFlags, values: ChangeValues },
    GridChanged { rows: Vec<LineItemChange> },
    ConfirmationChanged { confirmed: bool },
}

impl PanelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectionChanged { .. } => "selection_changed",
            Self::OptionsChanged { .. } => "options_changed",
            Self::GridChanged { .. } => "grid_changed",
            Self::ConfirmationChanged { .. } => "confirmation_changed",
        }
    }
}
