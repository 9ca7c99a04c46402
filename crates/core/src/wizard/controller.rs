use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, NoopAuditSink};
use crate::config::WizardConfig;
use crate::domain::change::{ChangeField, ChangeType, ChangeValue};
use crate::domain::dates::{normalize_effective_date, Clock, SystemClock};
use crate::domain::draft::Draft;
use crate::domain::line_item::LineItemId;
use crate::domain::opportunity::OpportunityId;
use crate::domain::request::SubmissionRequest;
use crate::errors::{
    DraftStoreError, PartialLoadError, ValidationError, WizardError, UNKNOWN_ERROR_MESSAGE,
};
use crate::flows::{
    is_navigable, next_enabled, step_indicators, ChangeOrderFlow, FlowContext, FlowEngine,
    FlowEvent, StepIndicator, WizardStep,
};
use crate::gateway::{ChangeOrderService, DraftStore};
use crate::panels::{
    missing_required_fields, BulkApplied, BulkEditError, GridField, LineItemGridEditor, OptionPanel,
    SelectionPanel,
};
use crate::signals::{NavigationIntent, Notification, SignalSink};
use crate::summary::{Summary, SummaryEngine};
use crate::wizard::events::PanelEvent;
use crate::wizard::gate::SubmissionGate;
use crate::wizard::state::{dedup_ids, WizardState};

const ACTOR: &str = "change_order_wizard";

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct WizardServices {
    pub service: Arc<dyn ChangeOrderService>,
    pub drafts: Arc<dyn DraftStore>,
    pub signals: Arc<dyn SignalSink>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
}

impl WizardServices {
    pub fn new(
        service: Arc<dyn ChangeOrderService>,
        drafts: Arc<dyn DraftStore>,
        signals: Arc<dyn SignalSink>,
    ) -> Self {
        Self { service, drafts, signals, audit: Arc::new(NoopAuditSink), clock: Arc::new(SystemClock) }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Host-provided inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardSetup {
    pub record_id: Option<String>,
    pub account_id: Option<String>,
    pub preselected: Vec<OpportunityId>,
    pub correlation_id: Option<String>,
}

impl WizardSetup {
    /// Explicit account id, falling back to the host record id.
    pub fn account_key(&self) -> Option<&str> {
        let non_blank = |value: &&str| !value.trim().is_empty();
        self.account_id
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.record_id.as_deref().filter(non_blank))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStatus {
    Active,
    Submitted,
    Cancelled,
}

pub struct WizardController {
    config: WizardConfig,
    setup: WizardSetup,
    services: WizardServices,
    audit: AuditContext,
    engine: FlowEngine<ChangeOrderFlow>,
    state: WizardState,
    selection: SelectionPanel,
    options: OptionPanel,
    grid: LineItemGridEditor,
    summary: SummaryEngine,
    line_item_step_applies: bool,
    gate: SubmissionGate,
    status: WizardStatus,
    contract_id: Option<String>,
}

impl WizardController {
    pub fn new(config: WizardConfig, setup: WizardSetup, services: WizardServices) -> Self {
        let correlation_id =
            setup.correlation_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let audit = AuditContext::new(setup.account_key().map(str::to_owned), correlation_id, ACTOR);
        let state =
            WizardState { selection: dedup_ids(setup.preselected.clone()), ..WizardState::default() };

        let mut controller = Self {
            selection: SelectionPanel::new(config.max_opportunities),
            options: OptionPanel::new(config.line_item_change_types.clone()),
            grid: LineItemGridEditor::new(),
            summary: SummaryEngine::new(config.price_change_warning_pct),
            engine: FlowEngine::default(),
            config,
            setup,
            services,
            audit,
            state,
            line_item_step_applies: false,
            gate: SubmissionGate::default(),
            status: WizardStatus::Active,
            contract_id: None,
        };
        controller.recompute();
        controller.sync_panels();
        controller
    }

    /// Restores any draft, loads reference data and settles on a reachable step.
    pub async fn initialize(&mut self) {
        info!(
            event_name = "wizard.initialize.start",
            correlation_id = %self.audit.correlation_id,
            account_id = self.setup.account_key().unwrap_or("unknown"),
            preselected = self.setup.preselected.len(),
            "initializing change order wizard"
        );

        let restored_step = self.restore_draft().await;
        self.load_candidates().await;
        self.load_picklists().await;

        if let Some(event) = self.options.initialize(self.services.clock.today()) {
            self.handle_event(event);
        }

        let context = self.flow_context();
        let step = if is_navigable(restored_step, &context) {
            restored_step
        } else {
            WizardStep::SelectRecords
        };
        self.state.current_step = step;
        if step == WizardStep::EditLineItems {
            self.ensure_line_items_loaded().await;
        }

        info!(
            event_name = "wizard.initialize.ready",
            correlation_id = %self.audit.correlation_id,
            step = ?step,
            selected = self.state.selection.len(),
            "change order wizard ready"
        );
    }

    /// Stores a panel's slice verbatim, re-derives cross-cutting flags and pushes
    /// the merged state back into every panel.
    pub fn handle_event(&mut self, event: PanelEvent) {
        if self.status != WizardStatus::Active {
            debug!(
                event_name = "wizard.panel_event.ignored",
                correlation_id = %self.audit.correlation_id,
                event = event.name(),
                "ignoring panel event on a closed wizard"
            );
            return;
        }

        debug!(
            event_name = "wizard.panel_event",
            correlation_id = %self.audit.correlation_id,
            event = event.name(),
            "panel event received"
        );
        match event {
            PanelEvent::SelectionChanged { ids, records } => {
                // Line-item changes are left alone; only the grid replaces them.
                self.state.selection = ids;
                self.state.selected_records = records;
            }
            PanelEvent::OptionsChanged { flags, values } => {
                self.state.flags = flags;
                self.state.values = values;
            }
            PanelEvent::GridChanged { rows } => {
                self.state.line_item_changes = rows;
            }
            PanelEvent::ConfirmationChanged { confirmed } => {
                self.state.is_confirmed = confirmed;
            }
        }

        self.recompute();
        self.sync_panels();
    }

    pub fn toggle_opportunity(&mut self, id: &OpportunityId) {
        let event = self.selection.toggle(id);
        self.handle_event(event);
    }

    pub fn select_all(&mut self) {
        let event = self.selection.select_all();
        self.handle_event(event);
    }

    pub fn deselect_all(&mut self) {
        let event = self.selection.deselect_all();
        self.handle_event(event);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.selection.set_search_term(term);
    }

    pub fn toggle_change_type(&mut self, change_type: ChangeType) {
        let event = self.options.toggle(change_type);
        self.handle_event(event);
    }

    pub fn set_change_flag(&mut self, change_type: ChangeType, enabled: bool) {
        let event = self.options.set_flag(change_type, enabled);
        self.handle_event(event);
    }

    pub fn set_change_value(&mut self, field: ChangeField, value: ChangeValue) {
        let event = self.options.set_value(field, value);
        self.handle_event(event);
    }

    pub fn set_line_item_field(&mut self, row_id: &LineItemId, field: GridField, value: &str) -> bool {
        match self.grid.set_field(row_id, field, value) {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn set_row_checked(&mut self, row_id: &LineItemId, checked: bool) -> bool {
        self.grid.set_checked(row_id, checked)
    }

    pub fn check_all_rows(&mut self, checked: bool) {
        self.grid.check_all(checked);
    }

    pub fn apply_bulk_to_selected(
        &mut self,
        new_product: &str,
        new_price: &str,
    ) -> Result<usize, BulkEditError> {
        let result = self.grid.apply_to_selected(new_product, new_price);
        self.finish_bulk(result, |affected| format!("Bulk changes applied to {affected} product(s)"))
    }

    pub fn apply_bulk_to_all(
        &mut self,
        new_product: &str,
        new_price: &str,
    ) -> Result<usize, BulkEditError> {
        let result = self.grid.apply_to_all(new_product, new_price);
        self.finish_bulk(result, |affected| {
            format!("Bulk changes applied to all {affected} product(s)")
        })
    }

    pub fn reset_all_line_items(&mut self) {
        let event = self.grid.reset_all();
        self.handle_event(event);
        self.services
            .signals
            .notify(Notification::success("Success", "All products reset to original values"));
    }

    pub fn reset_line_item(&mut self, row_id: &LineItemId) -> bool {
        match self.grid.reset_row(row_id) {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn set_confirmed(&mut self, confirmed: bool) {
        let event = self.summary.set_confirmed(confirmed);
        self.handle_event(event);
    }

    /// Gated only by the transition table; field and grid checks wait for `submit`.
    pub async fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_active()?;
        self.transition(FlowEvent::Next).await
    }

    pub async fn previous(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_active()?;
        self.transition(FlowEvent::Previous).await
    }

    pub async fn go_to_step(&mut self, step: WizardStep) -> Result<WizardStep, WizardError> {
        self.ensure_active()?;
        self.transition(FlowEvent::GoTo(step)).await
    }

    /// Validates, submits and classifies the outcome. Returns the created contract id.
    pub async fn submit(&mut self) -> Result<String, WizardError> {
        let Some(_guard) = self.gate.try_acquire() else {
            debug!(
                event_name = "wizard.submission.in_flight",
                correlation_id = %self.audit.correlation_id,
                "submission already in progress"
            );
            return Err(WizardError::SubmissionInFlight);
        };

        match self.submit_inner().await {
            Ok(contract_id) => Ok(contract_id),
            Err(error) => {
                let (event_type, outcome) = if error.is_validation() {
                    ("wizard.submission_rejected", AuditOutcome::Rejected)
                } else {
                    ("wizard.submission_failed", AuditOutcome::Failed)
                };
                self.services.audit.emit(
                    self.audit
                        .event(event_type, AuditCategory::Submission, outcome)
                        .with_metadata("error", error.user_message()),
                );
                Err(self.fail(error))
            }
        }
    }

    pub async fn save_draft(&mut self) -> Result<(), WizardError> {
        match self.save_draft_inner().await {
            Ok(()) => {
                self.services.signals.notify(Notification::success("Success", "Draft saved"));
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Leaves without sending anything, returning to the host record when one is known.
    pub fn cancel(&mut self) {
        if self.status != WizardStatus::Active {
            return;
        }

        if let Some(record_id) =
            self.setup.record_id.as_deref().filter(|value| !value.trim().is_empty())
        {
            self.services
                .signals
                .navigate(NavigationIntent::ViewRecord { record_id: record_id.to_owned() });
        }
        self.services.audit.emit(self.audit.event(
            "wizard.cancelled",
            AuditCategory::Navigation,
            AuditOutcome::Success,
        ));
        info!(
            event_name = "wizard.cancelled",
            correlation_id = %self.audit.correlation_id,
            "change order wizard cancelled"
        );
        self.status = WizardStatus::Cancelled;
        self.discard_state();
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    /// Output of a successful submission.
    pub fn contract_id(&self) -> Option<&str> {
        self.contract_id.as_deref()
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn account_key(&self) -> Option<&str> {
        self.setup.account_key()
    }

    pub fn selection(&self) -> &SelectionPanel {
        &self.selection
    }

    pub fn options(&self) -> &OptionPanel {
        &self.options
    }

    pub fn grid(&self) -> &LineItemGridEditor {
        &self.grid
    }

    pub fn summary_engine(&self) -> &SummaryEngine {
        &self.summary
    }

    pub fn line_item_step_applies(&self) -> bool {
        self.line_item_step_applies
    }

    pub fn flow_context(&self) -> FlowContext {
        self.state.flow_context(self.line_item_step_applies)
    }

    pub fn next_enabled(&self) -> bool {
        self.status == WizardStatus::Active
            && next_enabled(self.state.current_step, &self.flow_context())
    }

    pub fn submit_enabled(&self) -> bool {
        self.status == WizardStatus::Active && self.state.is_confirmed && !self.gate.is_in_flight()
    }

    pub fn submission_gate(&self) -> SubmissionGate {
        self.gate.clone()
    }

    pub fn submit_label(&self) -> &'static str {
        self.config.submit_label()
    }

    pub fn header_text(&self) -> &str {
        &self.config.header_text
    }

    pub fn steps(&self) -> Vec<StepIndicator> {
        step_indicators(self.state.current_step, &self.flow_context())
    }

    pub fn summary(&self) -> Summary {
        self.summary.summary(&self.state, self.services.clock.as_ref())
    }

    pub fn draft(&self) -> Draft {
        self.state.to_draft()
    }

    async fn transition(&mut self, event: FlowEvent) -> Result<WizardStep, WizardError> {
        let context = self.flow_context();
        let result = self.engine.apply_with_audit(
            self.state.current_step,
            event,
            &context,
            self.services.audit.as_ref(),
            &self.audit,
        );

        match result {
            Ok(outcome) => {
                info!(
                    event_name = "wizard.transition.applied",
                    correlation_id = %self.audit.correlation_id,
                    from = ?outcome.from,
                    to = ?outcome.to,
                    "wizard step changed"
                );
                self.state.current_step = outcome.to;
                if outcome.to == WizardStep::EditLineItems {
                    self.ensure_line_items_loaded().await;
                }
                Ok(outcome.to)
            }
            Err(error) => {
                debug!(
                    event_name = "wizard.transition.rejected",
                    correlation_id = %self.audit.correlation_id,
                    error = %error,
                    "wizard transition rejected"
                );
                Err(WizardError::Transition(error))
            }
        }
    }

    async fn submit_inner(&mut self) -> Result<String, WizardError> {
        self.ensure_active()?;
        self.validate_for_submission()?;

        let effective_date = normalize_effective_date(
            self.state.values.get(ChangeField::EffectiveDate),
            self.services.clock.as_ref(),
        );
        let request = SubmissionRequest {
            opportunity_ids: self.state.selection.clone(),
            change_types: self.state.flags.clone(),
            change_values: self.state.values.clone(),
            product_changes: self.state.line_item_changes.clone(),
            effective_date,
        };

        info!(
            event_name = "wizard.submission.start",
            correlation_id = %self.audit.correlation_id,
            opportunity_count = request.opportunity_ids.len(),
            product_change_count = request.product_changes.len(),
            effective_date = %request.effective_date,
            "submitting change order"
        );
        let result = self.services.service.submit(request).await?;

        let Some(contract_id) = result.created_id().map(str::to_owned) else {
            let message = if result.errors.is_empty() {
                UNKNOWN_ERROR_MESSAGE.to_owned()
            } else {
                result.errors.join(", ")
            };
            return Err(WizardError::SubmissionFailed { message });
        };

        self.complete_submission(&contract_id).await;
        Ok(contract_id)
    }

    fn validate_for_submission(&self) -> Result<(), ValidationError> {
        if self.state.selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        if !self.state.flags.any() {
            return Err(ValidationError::NoChangeType);
        }
        if let Some(malformed) = self.state.selection.iter().find(|id| !id.is_well_formed()) {
            return Err(ValidationError::MalformedOpportunityId(malformed.to_string()));
        }
        if self.state.selection.len() > self.config.max_opportunities {
            return Err(ValidationError::TooManyOpportunities {
                max: self.config.max_opportunities,
                selected: self.state.selection.len(),
            });
        }

        let missing = missing_required_fields(&self.state.flags, &self.state.values);
        if !missing.is_empty() {
            return Err(ValidationError::MissingRequiredFields(missing));
        }

        let line_item_ids: Vec<LineItemId> = self
            .state
            .line_item_changes
            .iter()
            .filter(|change| change.is_partial())
            .map(|change| change.line_item_id.clone())
            .collect();
        if !line_item_ids.is_empty() {
            return Err(ValidationError::PartialLineItemChange { line_item_ids });
        }

        if !self.state.is_confirmed {
            return Err(ValidationError::NotConfirmed);
        }
        Ok(())
    }

    async fn complete_submission(&mut self, contract_id: &str) {
        self.contract_id = Some(contract_id.to_owned());
        self.services
            .signals
            .notify(Notification::success("Success", "Change order created successfully"));

        let intent = if self.config.embedded_in_host {
            NavigationIntent::ContinueHost
        } else {
            NavigationIntent::ViewRecord { record_id: contract_id.to_owned() }
        };
        self.services.signals.navigate(intent);

        self.services.audit.emit(
            self.audit
                .event("wizard.submission_succeeded", AuditCategory::Submission, AuditOutcome::Success)
                .with_metadata("contract_id", contract_id),
        );
        info!(
            event_name = "wizard.submission.succeeded",
            correlation_id = %self.audit.correlation_id,
            contract_id = %contract_id,
            "change order created"
        );

        self.status = WizardStatus::Submitted;
        self.discard_draft().await;
        self.discard_state();
    }

    async fn save_draft_inner(&mut self) -> Result<(), WizardError> {
        self.ensure_active()?;
        let key = self.setup.account_key().map(str::to_owned).ok_or_else(|| {
            DraftStoreError::Storage("no account or record id to key the draft".to_owned())
        })?;
        let blob = self
            .state
            .to_draft()
            .encode()
            .map_err(|error| DraftStoreError::Decode(error.to_string()))?;

        self.services.drafts.save(&key, &blob).await?;
        self.services.audit.emit(
            self.audit
                .event("wizard.draft_saved", AuditCategory::Draft, AuditOutcome::Success)
                .with_metadata("step", self.state.current_step.number().to_string()),
        );
        info!(
            event_name = "wizard.draft.saved",
            correlation_id = %self.audit.correlation_id,
            account_id = %key,
            "change order draft saved"
        );
        Ok(())
    }

    async fn restore_draft(&mut self) -> WizardStep {
        let Some(key) = self.setup.account_key().map(str::to_owned) else {
            return WizardStep::SelectRecords;
        };

        let blob = match self.services.drafts.load(&key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return WizardStep::SelectRecords,
            Err(error) => {
                warn!(
                    event_name = "wizard.draft.load_failed",
                    correlation_id = %self.audit.correlation_id,
                    account_id = %key,
                    error = %error,
                    "could not load change order draft"
                );
                return WizardStep::SelectRecords;
            }
        };

        match Draft::decode(&blob) {
            Ok(draft) => {
                let keep_selection = !self.setup.preselected.is_empty();
                let step = self.state.restore_draft(draft, keep_selection);
                self.recompute();
                self.sync_panels();
                self.services.audit.emit(
                    self.audit
                        .event("wizard.draft_restored", AuditCategory::Draft, AuditOutcome::Success)
                        .with_metadata("step", step.number().to_string()),
                );
                info!(
                    event_name = "wizard.draft.restored",
                    correlation_id = %self.audit.correlation_id,
                    account_id = %key,
                    step = ?step,
                    "change order draft restored"
                );
                step
            }
            Err(error) => {
                warn!(
                    event_name = "wizard.draft.decode_failed",
                    correlation_id = %self.audit.correlation_id,
                    account_id = %key,
                    error = %error,
                    "ignoring undecodable change order draft"
                );
                WizardStep::SelectRecords
            }
        }
    }

    async fn discard_draft(&self) {
        let Some(key) = self.setup.account_key() else {
            return;
        };
        match self.services.drafts.discard(key).await {
            Ok(()) => self.services.audit.emit(self.audit.event(
                "wizard.draft_discarded",
                AuditCategory::Draft,
                AuditOutcome::Success,
            )),
            Err(error) => warn!(
                event_name = "wizard.draft.discard_failed",
                correlation_id = %self.audit.correlation_id,
                account_id = %key,
                error = %error,
                "could not discard change order draft"
            ),
        }
    }

    async fn load_candidates(&mut self) {
        let key = self.setup.account_key().unwrap_or_default().to_owned();
        match self.services.service.get_candidate_records(&key).await {
            Ok(candidates) => {
                debug!(
                    event_name = "wizard.candidates.loaded",
                    correlation_id = %self.audit.correlation_id,
                    count = candidates.len(),
                    "candidate opportunities loaded"
                );
                self.selection.load_candidates(candidates);
                self.selection.on_input(&self.state.selection);
                self.state.selected_records = self.selection.selected_records();
            }
            Err(failure) => {
                warn!(
                    event_name = "wizard.candidates.load_failed",
                    correlation_id = %self.audit.correlation_id,
                    error = %failure,
                    "could not load candidate opportunities"
                );
                self.selection.load_failed(&failure);
            }
        }
    }

    async fn load_picklists(&mut self) {
        match self.services.service.get_picklist_options().await {
            Ok(picklists) => {
                self.options.set_picklists(&picklists);
                self.grid.set_machine_types(picklists.machine_types);
            }
            Err(failure) => {
                warn!(
                    event_name = "wizard.picklists.load_failed",
                    correlation_id = %self.audit.correlation_id,
                    error = %failure,
                    "could not load picklist values"
                );
                self.services
                    .signals
                    .notify(Notification::error("Error", "Failed to load picklist values"));
            }
        }
    }

    async fn ensure_line_items_loaded(&mut self) {
        if !self.grid.needs_reload(&self.state.selection) {
            return;
        }

        let selection = self.state.selection.clone();
        match self.services.service.get_line_items(&selection).await {
            Ok(items) => {
                info!(
                    event_name = "wizard.line_items.loaded",
                    correlation_id = %self.audit.correlation_id,
                    count = items.len(),
                    opportunities = selection.len(),
                    "line items loaded"
                );
                self.grid.load_rows(items, &self.state.line_item_changes, &selection);
                self.load_substitute_products().await;
                let rows = self.grid.changes();
                self.handle_event(PanelEvent::GridChanged { rows });
            }
            Err(failure) => {
                error!(
                    event_name = "wizard.line_items.load_failed",
                    correlation_id = %self.audit.correlation_id,
                    error = %failure,
                    "could not load line items"
                );
                self.services.signals.notify(Notification::error("Error", "Failed to load products"));
            }
        }
    }

    /// One opportunity at a time; a failure is reported and loading moves on.
    async fn load_substitute_products(&mut self) {
        for opportunity_id in self.grid.opportunity_groups() {
            match self.services.service.get_substitute_products(&opportunity_id).await {
                Ok(products) => self.grid.set_substitute_products(&opportunity_id, products),
                Err(source) => {
                    let failure = PartialLoadError { opportunity_id, source };
                    warn!(
                        event_name = "wizard.line_items.substitutes_failed",
                        correlation_id = %self.audit.correlation_id,
                        opportunity_id = %failure.opportunity_id,
                        error = %failure.source,
                        "could not load substitute products"
                    );
                    self.services
                        .signals
                        .notify(Notification::warning("Warning", failure.to_string()));
                }
            }
        }
    }

    fn finish_bulk(
        &mut self,
        result: Result<BulkApplied, BulkEditError>,
        message: impl FnOnce(usize) -> String,
    ) -> Result<usize, BulkEditError> {
        match result {
            Ok(applied) => {
                self.handle_event(applied.event);
                self.services.signals.notify(Notification::success("Success", message(applied.affected)));
                Ok(applied.affected)
            }
            Err(error) => {
                self.services.signals.notify(Notification::warning("Warning", error.to_string()));
                Err(error)
            }
        }
    }

    fn fail(&self, error: WizardError) -> WizardError {
        warn!(
            event_name = "wizard.action_failed",
            correlation_id = %self.audit.correlation_id,
            error = %error,
            "wizard action failed"
        );
        self.services.signals.notify(Notification::error("Error", error.user_message()));
        error
    }

    fn ensure_active(&self) -> Result<(), WizardError> {
        if self.status == WizardStatus::Active {
            Ok(())
        } else {
            Err(WizardError::Closed)
        }
    }

    fn recompute(&mut self) {
        self.line_item_step_applies = self.config.product_grid_enabled
            && self.state.flags.any_of(&self.config.line_item_change_types);
    }

    fn sync_panels(&mut self) {
        self.selection.on_input(&self.state.selection);
        self.options.on_input(&self.state.flags, &self.state.values);
        self.grid.on_input(&self.state.line_item_changes);
        self.summary.on_input(self.state.is_confirmed);
    }

    fn discard_state(&mut self) {
        self.state = WizardState::default();
        self.recompute();
        self.sync_panels();
    }
}
