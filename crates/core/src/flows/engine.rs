use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{
    FlowContext, FlowEvent, StepIndicator, StepStatus, TransitionOutcome, WizardStep,
};

pub trait FlowDefinition {
    fn initial_step(&self) -> WizardStep;
    fn transition(
        &self,
        current: WizardStep,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Select → (Edit line items) → Review, with the middle step skipped when it does not apply.
#[derive(Clone, Debug, Default)]
pub struct ChangeOrderFlow;

impl FlowDefinition for ChangeOrderFlow {
    fn initial_step(&self) -> WizardStep {
        WizardStep::SelectRecords
    }

    fn transition(
        &self,
        current: WizardStep,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_change_order(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_step(&self) -> WizardStep {
        self.flow.initial_step()
    }

    pub fn apply(
        &self,
        current: WizardStep,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WizardStep,
        event: FlowEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    audit
                        .event(
                            "wizard.transition_applied",
                            AuditCategory::Navigation,
                            AuditOutcome::Success,
                        )
                        .with_metadata("from", format!("{:?}", outcome.from))
                        .with_metadata("to", format!("{:?}", outcome.to))
                        .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    audit
                        .event(
                            "wizard.transition_rejected",
                            AuditCategory::Navigation,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("from", format!("{current:?}"))
                        .with_metadata("event", format!("{event:?}"))
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<ChangeOrderFlow> {
    fn default() -> Self {
        Self::new(ChangeOrderFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("cannot leave {step:?} before selecting: {missing:?}")]
    MissingSelections { step: WizardStep, missing: Vec<String> },
    #[error("{step:?} has no next step")]
    NoNextStep { step: WizardStep },
    #[error("{step:?} has no previous step")]
    NoPreviousStep { step: WizardStep },
    #[error("cannot jump from {from:?} to {to:?}")]
    StepNotNavigable { from: WizardStep, to: WizardStep },
}

/// Whether `next` is enabled while sitting on `current`.
pub fn next_enabled(current: WizardStep, context: &FlowContext) -> bool {
    match current {
        WizardStep::SelectRecords => context.selections_complete(),
        WizardStep::EditLineItems => true,
        WizardStep::Review => false,
    }
}

/// Per-step predicate for forward jumps.
pub fn is_navigable(step: WizardStep, context: &FlowContext) -> bool {
    match step {
        WizardStep::SelectRecords => true,
        WizardStep::EditLineItems => {
            context.line_item_step_applies && context.selections_complete()
        }
        WizardStep::Review => context.selections_complete(),
    }
}

/// Steps on the current path with their progress status.
pub fn step_indicators(current: WizardStep, context: &FlowContext) -> Vec<StepIndicator> {
    WizardStep::ALL
        .into_iter()
        .filter(|step| *step != WizardStep::EditLineItems || context.line_item_step_applies)
        .enumerate()
        .map(|(index, step)| StepIndicator {
            step,
            position: index + 1,
            status: match step.cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Active,
                std::cmp::Ordering::Greater => StepStatus::Upcoming,
            },
        })
        .collect()
}

fn transition_change_order(
    current: WizardStep,
    event: FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use WizardStep::{EditLineItems, Review, SelectRecords};

    let to = match (current, event) {
        (SelectRecords, FlowEvent::Next) => {
            if !context.selections_complete() {
                return Err(FlowTransitionError::MissingSelections {
                    step: current,
                    missing: context.missing_selections(),
                });
            }
            if context.line_item_step_applies {
                EditLineItems
            } else {
                Review
            }
        }
        (EditLineItems, FlowEvent::Next) => Review,
        (Review, FlowEvent::Next) => return Err(FlowTransitionError::NoNextStep { step: current }),
        (Review, FlowEvent::Previous) => {
            if context.line_item_step_applies {
                EditLineItems
            } else {
                SelectRecords
            }
        }
        (EditLineItems, FlowEvent::Previous) => SelectRecords,
        (SelectRecords, FlowEvent::Previous) => {
            return Err(FlowTransitionError::NoPreviousStep { step: current });
        }
        (_, FlowEvent::GoTo(target)) => {
            if target <= current || is_navigable(target, context) {
                target
            } else {
                return Err(FlowTransitionError::StepNotNavigable { from: current, to: target });
            }
        }
    };

    Ok(TransitionOutcome { from: current, to, event })
}
