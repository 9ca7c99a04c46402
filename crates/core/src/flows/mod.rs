pub mod engine;
pub mod states;

pub use engine::{
    is_navigable, next_enabled, step_indicators, ChangeOrderFlow, FlowDefinition, FlowEngine,
    FlowTransitionError,
};
pub use states::{
    FlowContext, FlowEvent, StepIndicator, StepStatus, TransitionOutcome, WizardStep,
};
