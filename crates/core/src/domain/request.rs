use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeTypeFlags, ChangeValues};
use crate::domain::line_item::LineItemChange;
use crate::domain::opportunity::OpportunityId;

/// Flattened, validated projection of the wizard state handed to the processor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub opportunity_ids: Vec<OpportunityId>,
    pub change_types: ChangeTypeFlags,
    pub change_values: ChangeValues,
    pub product_changes: Vec<LineItemChange>,
    pub effective_date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionResult {
    pub success: bool,
    pub contract_id: Option<String>,
    pub errors: Vec<String>,
}

impl SubmissionResult {
    pub fn created(contract_id: impl Into<String>) -> Self {
        Self { success: true, contract_id: Some(contract_id.into()), errors: Vec::new() }
    }

    pub fn rejected<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { success: false, contract_id: None, errors: errors.into_iter().map(Into::into).collect() }
    }

    /// The created contract id when the call succeeded and returned one.
    pub fn created_id(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.contract_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
}

/// Structured error body returned by the processor when a call is rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteErrorBody {
    pub message: Option<String>,
    pub page_errors: Vec<ErrorEntry>,
    pub field_errors: std::collections::BTreeMap<String, Vec<ErrorEntry>>,
}

impl RemoteErrorBody {
    /// Most specific message: body message, then first page error, then first field error.
    pub fn most_specific_message(&self) -> Option<&str> {
        let non_blank = |value: &&str| !value.trim().is_empty();

        self.message
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.page_errors.first().map(|entry| entry.message.as_str()).filter(non_blank))
            .or_else(|| {
                self.field_errors
                    .values()
                    .next()
                    .and_then(|entries| entries.first())
                    .map(|entry| entry.message.as_str())
                    .filter(non_blank)
            })
    }
}
