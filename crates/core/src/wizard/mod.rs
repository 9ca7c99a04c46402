pub mod controller;
pub mod events;
pub mod gate;
pub mod state;

pub use controller::{WizardController, WizardServices, WizardSetup, WizardStatus};
pub use events::PanelEvent;
pub use gate::{SubmissionGate, SubmissionGuard};
pub use state::WizardState;
