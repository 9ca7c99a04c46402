use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeTypeFlags, ChangeValues};
use crate::domain::line_item::LineItemChange;
use crate::domain::opportunity::OpportunityId;

/// In-progress wizard state persisted as an opaque JSON blob keyed by account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
    pub selected_opportunities: Option<Vec<OpportunityId>>,
    pub selected_change_types: Option<ChangeTypeFlags>,
    pub change_values: Option<ChangeValues>,
    pub product_changes: Option<Vec<LineItemChange>>,
    pub current_step: Option<u8>,
}

impl Draft {
    pub fn decode(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
