use thiserror::Error;

use crate::domain::line_item::LineItemId;
use crate::domain::opportunity::OpportunityId;
use crate::domain::request::RemoteErrorBody;
use crate::flows::FlowTransitionError;

pub const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to submit change order. Please try again.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Local, pre-submission failures. Display text is shown to the user verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one opportunity.")]
    EmptySelection,
    #[error("Please select at least one change type.")]
    NoChangeType,
    #[error("Invalid opportunity ID: {0}")]
    MalformedOpportunityId(String),
    #[error("Please select no more than {max} opportunities ({selected} selected).")]
    TooManyOpportunities { max: usize, selected: usize },
    #[error("{}", .0.join(" "))]
    MissingRequiredFields(Vec<String>),
    #[error("Each product change must have both new product and new price")]
    PartialLineItemChange { line_item_ids: Vec<LineItemId> },
    #[error("Please review and confirm the change order before submitting.")]
    NotConfirmed,
}

/// A rejected or failed call to the remote processor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteFailure {
    pub body: Option<RemoteErrorBody>,
    pub message: Option<String>,
}

impl RemoteFailure {
    pub fn with_body(body: RemoteErrorBody) -> Self {
        Self { body: Some(body), message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self { body: None, message: Some(message.into()) }
    }

    /// Message priority: body message, first page error, first field error, the
    /// failure's own message, then a fixed fallback.
    pub fn user_message(&self) -> String {
        self.body
            .as_ref()
            .and_then(RemoteErrorBody::most_specific_message)
            .or_else(|| self.message.as_deref().filter(|message| !message.trim().is_empty()))
            .unwrap_or(SUBMIT_FALLBACK_MESSAGE)
            .to_owned()
    }

    /// Message for non-submission loads, which fall back to a generic label.
    pub fn load_message(&self) -> String {
        self.body
            .as_ref()
            .and_then(|body| body.message.as_deref())
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(UNKNOWN_ERROR_MESSAGE)
            .to_owned()
    }
}

impl std::fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for RemoteFailure {}

/// A substitute-product load that failed for one opportunity. Never fatal.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Could not load available products for {opportunity_id}")]
pub struct PartialLoadError {
    pub opportunity_id: OpportunityId,
    #[source]
    pub source: RemoteFailure,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DraftStoreError {
    #[error("draft storage failure: {0}")]
    Storage(String),
    #[error("draft decode failure: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
    #[error("{message}")]
    SubmissionFailed { message: String },
    #[error(transparent)]
    Transition(#[from] FlowTransitionError),
    #[error(transparent)]
    Draft(#[from] DraftStoreError),
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("the wizard has already been submitted or cancelled")]
    Closed,
}

impl WizardError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Remote(failure) => failure.user_message(),
            Self::SubmissionFailed { message } => message.clone(),
            Self::Transition(_) => {
                "That step is not available yet. Complete the current step first.".to_owned()
            }
            Self::Draft(_) => "The draft could not be saved. Please try again.".to_owned(),
            Self::SubmissionInFlight => "The change order is already being submitted.".to_owned(),
            Self::Closed => "This change order wizard is no longer active.".to_owned(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
