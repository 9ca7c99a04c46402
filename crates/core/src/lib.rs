pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod gateway;
pub mod panels;
pub mod signals;
pub mod summary;
pub mod wizard;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use config::{AppConfig, ConfigError, LoadOptions, WizardConfig};
pub use domain::change::{ChangeField, ChangeType, ChangeTypeFlags, ChangeValue, ChangeValues};
pub use domain::dates::{Clock, FixedClock, SystemClock};
pub use domain::draft::Draft;
pub use domain::line_item::{LineItem, LineItemChange, LineItemId, PicklistOptions, SubstituteProduct};
pub use domain::opportunity::{Opportunity, OpportunityId};
pub use domain::request::{SubmissionRequest, SubmissionResult};
pub use errors::{DraftStoreError, RemoteFailure, ValidationError, WizardError};
pub use flows::{FlowEngine, FlowEvent, WizardStep};
pub use gateway::{ChangeOrderService, DraftStore, InMemoryChangeOrderService, InMemoryDraftStore, ServiceFixture};
pub use signals::{InMemorySignalSink, NavigationIntent, Notification, Severity, SignalSink};
pub use summary::{Summary, SummaryEngine};
pub use wizard::{PanelEvent, WizardController, WizardServices, WizardSetup, WizardState, WizardStatus};
