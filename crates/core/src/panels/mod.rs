pub mod grid;
pub mod options;
pub mod selection;

pub use grid::{BulkApplied, BulkEditError, GridField, GridRow, LineItemGridEditor};
pub use options::{missing_required_fields, OptionPanel, EFFECTIVE_DATE_REQUIRED};
pub use selection::{LoadState, OpportunityRow, SelectionPanel};
