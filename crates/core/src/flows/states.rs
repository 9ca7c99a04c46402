use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    SelectRecords,
    EditLineItems,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] =
        [WizardStep::SelectRecords, WizardStep::EditLineItems, WizardStep::Review];

    pub fn number(self) -> u8 {
        match self {
            Self::SelectRecords => 1,
            Self::EditLineItems => 2,
            Self::Review => 3,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::SelectRecords),
            2 => Some(Self::EditLineItems),
            3 => Some(Self::Review),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SelectRecords => "Select Opportunities & Changes",
            Self::EditLineItems => "Edit Products",
            Self::Review => "Review & Submit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    Next,
    Previous,
    GoTo(WizardStep),
}

/// Cross-cutting facts the flow needs to gate transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowContext {
    pub has_selection: bool,
    pub has_change_type: bool,
    pub line_item_step_applies: bool,
}

impl FlowContext {
    pub fn selections_complete(&self) -> bool {
        self.has_selection && self.has_change_type
    }

    pub fn missing_selections(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.has_selection {
            missing.push("opportunities".to_owned());
        }
        if !self.has_change_type {
            missing.push("change types".to_owned());
        }
        missing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub event: FlowEvent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepIndicator {
    pub step: WizardStep,
    pub position: usize,
    pub status: StepStatus,
}
