use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use changeorder_core::audit::InMemoryAuditSink;
use changeorder_core::config::WizardConfig;
use changeorder_core::domain::change::{ChangeField, ChangeType, ChangeValue};
use changeorder_core::domain::dates::FixedClock;
use changeorder_core::domain::draft::Draft;
use changeorder_core::domain::line_item::{
    LineItem, LineItemId, PicklistOption, PicklistOptions, SubstituteProduct,
};
use changeorder_core::domain::opportunity::{Opportunity, OpportunityId};
use changeorder_core::domain::request::{ErrorEntry, RemoteErrorBody, SubmissionResult};
use changeorder_core::errors::{ValidationError, WizardError};
use changeorder_core::flows::{StepStatus, WizardStep};
use changeorder_core::gateway::{
    FixtureFailures, InMemoryChangeOrderService, InMemoryDraftStore, ServiceFixture,
    SubmissionReply,
};
use changeorder_core::panels::GridField;
use changeorder_core::signals::{InMemorySignalSink, NavigationIntent, Severity};
use changeorder_core::wizard::{WizardController, WizardServices, WizardSetup, WizardStatus};

const ACCOUNT: &str = "001000000000001AAA";
const OPP_ONE: &str = "006000000000001AAA";
const OPP_TWO: &str = "006000000000002AAA";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

fn opportunity(id: &str, name: &str, amount: Option<i64>) -> Opportunity {
    Opportunity {
        id: OpportunityId::new(id),
        name: name.to_owned(),
        stage: "Closed Won".to_owned(),
        amount: amount.map(|value| Decimal::new(value, 0)),
        close_date: Some(today()),
        quote_number: None,
    }
}

fn line_item(id: &str, opportunity_id: &str, recurring: bool) -> LineItem {
    LineItem {
        id: LineItemId::new(id),
        opportunity_id: OpportunityId::new(opportunity_id),
        opportunity_name: format!("Opportunity {opportunity_id}"),
        product_id: format!("01t-{id}"),
        product_name: format!("Copier {id}"),
        unit_price: Decimal::new(100, 0),
        lease_rate: recurring.then(|| Decimal::new(100, 0)),
        is_recurring_revenue: recurring,
    }
}

fn fixture() -> ServiceFixture {
    let mut substitute_products = BTreeMap::new();
    substitute_products.insert(
        OpportunityId::new(OPP_ONE),
        vec![SubstituteProduct { id: "01t-sub-1".to_owned(), name: "Copier XL".to_owned() }],
    );
    substitute_products.insert(
        OpportunityId::new(OPP_TWO),
        vec![SubstituteProduct { id: "01t-sub-2".to_owned(), name: "Copier XS".to_owned() }],
    );

    ServiceFixture {
        account_key: Some(ACCOUNT.to_owned()),
        candidates: vec![
            opportunity(OPP_ONE, "Acme Renewal", Some(12_000)),
            opportunity(OPP_TWO, "Globex Expansion", None),
        ],
        picklists: PicklistOptions {
            service_models: vec![PicklistOption {
                label: "Full Service".to_owned(),
                value: "Full Service".to_owned(),
            }],
            pricing_models: Vec::new(),
            machine_types: Vec::new(),
        },
        line_items: vec![line_item("LI-1", OPP_ONE, false), line_item("LI-2", OPP_TWO, true)],
        substitute_products,
        submission: SubmissionReply::Result(SubmissionResult::created("a00000000000001AAA")),
        failures: FixtureFailures::default(),
    }
}

struct Harness {
    controller: WizardController,
    service: Arc<InMemoryChangeOrderService>,
    drafts: Arc<InMemoryDraftStore>,
    signals: InMemorySignalSink,
    audit: InMemoryAuditSink,
}

fn harness(config: WizardConfig, setup: WizardSetup, fixture: ServiceFixture) -> Harness {
    harness_with_drafts(config, setup, fixture, Arc::new(InMemoryDraftStore::default()))
}

fn harness_with_drafts(
    config: WizardConfig,
    setup: WizardSetup,
    fixture: ServiceFixture,
    drafts: Arc<InMemoryDraftStore>,
) -> Harness {
    let service = Arc::new(InMemoryChangeOrderService::new(fixture));
    let signals = InMemorySignalSink::default();
    let audit = InMemoryAuditSink::default();
    let services = WizardServices::new(service.clone(), drafts.clone(), Arc::new(signals.clone()))
        .with_audit(Arc::new(audit.clone()))
        .with_clock(Arc::new(FixedClock(today())));
    Harness { controller: WizardController::new(config, setup, services), service, drafts, signals, audit }
}

fn setup() -> WizardSetup {
    WizardSetup { record_id: Some(ACCOUNT.to_owned()), ..WizardSetup::default() }
}

async fn ready() -> Harness {
    let mut harness = harness(WizardConfig::default(), setup(), fixture());
    harness.controller.initialize().await;
    harness
}

#[tokio::test]
async fn empty_wizard_blocks_next_and_submission() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;

    assert!(!controller.next_enabled());
    assert!(!controller.submit_enabled());

    let error = controller.submit().await.expect_err("nothing selected");
    assert_eq!(error, WizardError::Validation(ValidationError::EmptySelection));
    assert!(error.user_message().contains("select at least one opportunity"));
    assert!(harness.service.submissions().await.is_empty());
    assert!(!controller.submission_gate().is_in_flight());
}

#[tokio::test]
async fn change_term_without_term_length_is_rejected_at_submit() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangeTerm);
    assert!(controller.next_enabled());

    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    assert_eq!(controller.previous().await, Ok(WizardStep::SelectRecords));
    assert_eq!(controller.next().await, Ok(WizardStep::Review));

    controller.set_confirmed(true);
    let error = controller.submit().await.expect_err("term length missing");
    assert!(error.user_message().contains("Term Length is required"));
    assert_eq!(controller.current_step(), WizardStep::Review);
    assert!(harness.service.submissions().await.is_empty());

    let last = harness.signals.last_notification().expect("error notification");
    assert_eq!(last.severity, Severity::Error);
    assert!(last.message.contains("Term Length is required"));

    controller.set_change_value(ChangeField::TermLength, ChangeValue::text("12"));
    assert!(controller.submit().await.is_ok());
}

#[tokio::test]
async fn partial_price_edit_is_rejected_at_submit() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangePrice);

    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.grid().total_count(), 1);
    assert_eq!(controller.grid().products_for(&OpportunityId::new(OPP_ONE)).len(), 1);

    let row = LineItemId::new("LI-1");
    assert!(controller.set_line_item_field(&row, GridField::NewPrice, "500"));
    assert!(controller.next_enabled());
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    assert_eq!(controller.previous().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.next().await, Ok(WizardStep::Review));

    controller.set_confirmed(true);
    let error = controller.submit().await.expect_err("partial edit");
    assert!(matches!(
        error,
        WizardError::Validation(ValidationError::PartialLineItemChange { ref line_item_ids })
            if line_item_ids == &vec![row.clone()]
    ));
    assert!(harness.service.submissions().await.is_empty());

    assert!(controller.set_line_item_field(&row, GridField::NewProduct, "01t-sub-1"));
    assert_eq!(controller.state().line_item_changes.len(), 1);
    assert!(controller.submit().await.is_ok());
}

#[tokio::test]
async fn line_item_changes_outlive_deselecting_their_opportunity() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.select_all();
    controller.toggle_change_type(ChangeType::ChangePrice);
    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));

    let row = LineItemId::new("LI-2");
    controller.set_line_item_field(&row, GridField::NewProduct, "01t-sub-2");
    controller.set_line_item_field(&row, GridField::NewPrice, "120");
    assert_eq!(controller.previous().await, Ok(WizardStep::SelectRecords));

    controller.toggle_opportunity(&OpportunityId::new(OPP_TWO));
    assert_eq!(controller.go_to_step(WizardStep::Review).await, Ok(WizardStep::Review));
    controller.set_confirmed(true);
    assert!(controller.submit().await.is_ok());

    let submissions = harness.service.submissions().await;
    assert_eq!(submissions[0].opportunity_ids, vec![OpportunityId::new(OPP_ONE)]);
    let changed: Vec<&LineItemId> =
        submissions[0].product_changes.iter().map(|change| &change.line_item_id).collect();
    assert_eq!(changed, vec![&row]);
}

#[tokio::test]
async fn successful_submission_exposes_contract_and_navigates_once() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    controller.set_confirmed(true);
    assert!(controller.submit_enabled());

    let contract_id = controller.submit().await.expect("created");
    assert_eq!(contract_id, "a00000000000001AAA");
    assert_eq!(controller.contract_id(), Some("a00000000000001AAA"));
    assert_eq!(controller.status(), WizardStatus::Submitted);
    assert!(!controller.submission_gate().is_in_flight());

    assert_eq!(
        harness.signals.navigations(),
        vec![NavigationIntent::ViewRecord { record_id: "a00000000000001AAA".to_owned() }]
    );
    let successes = harness.signals.with_severity(Severity::Success);
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].message, "Change order created successfully");

    let submissions = harness.service.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].effective_date, "2026-10-19");
    assert_eq!(submissions[0].opportunity_ids, vec![OpportunityId::new(OPP_ONE)]);

    assert!(harness.audit.event_types().contains(&"wizard.submission_succeeded".to_owned()));
    assert_eq!(controller.submit().await, Err(WizardError::Closed));
}

#[tokio::test]
async fn unsuccessful_result_reports_errors_without_navigation() {
    let mut fixture = fixture();
    fixture.submission = SubmissionReply::Result(SubmissionResult::rejected(["Duplicate"]));
    let mut harness = harness(WizardConfig::default(), setup(), fixture);
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.next().await.expect("review");
    controller.set_confirmed(true);

    let error = controller.submit().await.expect_err("rejected");
    assert_eq!(error, WizardError::SubmissionFailed { message: "Duplicate".to_owned() });
    assert!(harness.signals.navigations().is_empty());
    assert!(!controller.submission_gate().is_in_flight());
    assert!(controller.submit_enabled());
    assert_eq!(controller.current_step(), WizardStep::Review);
    assert_eq!(controller.status(), WizardStatus::Active);

    let errors = harness.signals.with_severity(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Duplicate"));
}

#[tokio::test]
async fn success_without_contract_id_is_a_failure() {
    let mut fixture = fixture();
    fixture.submission = SubmissionReply::Result(SubmissionResult {
        success: true,
        contract_id: None,
        errors: Vec::new(),
    });
    let mut harness = harness(WizardConfig::default(), setup(), fixture);
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.set_confirmed(true);

    let error = controller.submit().await.expect_err("no id");
    assert_eq!(error.user_message(), "Unknown error occurred");
    assert!(controller.contract_id().is_none());
}

#[tokio::test]
async fn remote_rejection_uses_most_specific_message_and_allows_retry() {
    let mut harness = ready().await;
    harness
        .service
        .set_submission_reply(SubmissionReply::Reject(RemoteErrorBody {
            message: None,
            page_errors: vec![ErrorEntry { message: "Contract is locked".to_owned() }],
            field_errors: BTreeMap::new(),
        }))
        .await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.next().await.expect("review");
    controller.set_confirmed(true);

    let error = controller.submit().await.expect_err("remote failure");
    assert_eq!(error.user_message(), "Contract is locked");
    assert_eq!(controller.current_step(), WizardStep::Review);

    harness
        .service
        .set_submission_reply(SubmissionReply::Result(SubmissionResult::created("a00000000000002AAA")))
        .await;
    assert_eq!(controller.submit().await, Ok("a00000000000002AAA".to_owned()));
    assert_eq!(harness.service.submissions().await.len(), 2);
}

#[tokio::test]
async fn malformed_id_and_missing_confirmation_never_reach_the_service() {
    let mut harness = harness(
        WizardConfig::default(),
        WizardSetup { preselected: vec![OpportunityId::new("006SHORT")], ..setup() },
        fixture(),
    );
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.set_confirmed(true);

    assert_eq!(
        controller.submit().await,
        Err(WizardError::Validation(ValidationError::MalformedOpportunityId("006SHORT".to_owned())))
    );

    controller.deselect_all();
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.set_confirmed(false);
    assert_eq!(
        controller.submit().await,
        Err(WizardError::Validation(ValidationError::NotConfirmed))
    );
    assert!(harness.service.submissions().await.is_empty());
}

#[tokio::test]
async fn submission_in_flight_blocks_a_second_attempt() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.set_confirmed(true);

    let gate = controller.submission_gate();
    let guard = gate.try_acquire().expect("gate free");
    assert!(!controller.submit_enabled());
    assert_eq!(controller.submit().await, Err(WizardError::SubmissionInFlight));
    drop(guard);

    assert!(controller.submit().await.is_ok());
}

#[tokio::test]
async fn price_warnings_report_only_large_increase() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.select_all();
    controller.toggle_change_type(ChangeType::ChangePrice);
    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.grid().total_count(), 2);

    for (row, price) in [("LI-1", "130"), ("LI-2", "90")] {
        let row = LineItemId::new(row);
        controller.set_line_item_field(&row, GridField::NewProduct, "01t-sub-1");
        controller.set_line_item_field(&row, GridField::NewPrice, price);
    }
    assert_eq!(controller.next().await, Ok(WizardStep::Review));

    let summary = controller.summary();
    let increases: Vec<&String> =
        summary.warnings.iter().filter(|warning| warning.contains("increases greater than 25%")).collect();
    let decreases =
        summary.warnings.iter().filter(|warning| warning.contains("decreases")).count();
    assert_eq!(increases.len(), 1);
    assert!(increases[0].starts_with("1 product(s)"));
    assert_eq!(decreases, 0);
    assert_eq!(summary.total_value_impact, Decimal::new(20, 0));
    assert_eq!(summary.product_count, 2);
    assert!(summary
        .warnings
        .contains(&"1 opportunity(ies) do not have amounts specified".to_owned()));
}

#[tokio::test]
async fn next_then_previous_returns_to_the_same_step() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangeProduct);

    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.previous().await, Ok(WizardStep::SelectRecords));
    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    assert_eq!(controller.previous().await, Ok(WizardStep::EditLineItems));

    controller.toggle_change_type(ChangeType::ChangeProduct);
    controller.toggle_change_type(ChangeType::CoTermContracts);
    assert_eq!(controller.go_to_step(WizardStep::SelectRecords).await, Ok(WizardStep::SelectRecords));
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    assert_eq!(controller.previous().await, Ok(WizardStep::SelectRecords));
}

#[tokio::test]
async fn line_item_step_is_skipped_when_the_grid_is_disabled() {
    let config = WizardConfig { product_grid_enabled: false, ..WizardConfig::default() };
    let mut harness = harness(config, setup(), fixture());
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangePrice);

    assert!(!controller.line_item_step_applies());
    let steps: Vec<WizardStep> = controller.steps().into_iter().map(|indicator| indicator.step).collect();
    assert_eq!(steps, vec![WizardStep::SelectRecords, WizardStep::Review]);
    assert!(matches!(
        controller.go_to_step(WizardStep::EditLineItems).await,
        Err(WizardError::Transition(_))
    ));
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
    assert!(harness.service.line_item_requests().await.is_empty());
}

#[tokio::test]
async fn go_to_step_requires_navigability_for_forward_jumps() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    assert!(controller.go_to_step(WizardStep::Review).await.is_err());

    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangePrice);
    assert_eq!(controller.go_to_step(WizardStep::Review).await, Ok(WizardStep::Review));

    let statuses: Vec<StepStatus> =
        controller.steps().into_iter().map(|indicator| indicator.status).collect();
    assert_eq!(statuses, vec![StepStatus::Completed, StepStatus::Completed, StepStatus::Active]);
    assert_eq!(controller.go_to_step(WizardStep::EditLineItems).await, Ok(WizardStep::EditLineItems));
    assert_eq!(harness.service.line_item_requests().await.len(), 1);
}

#[tokio::test]
async fn substitute_failure_warns_and_keeps_loading() {
    let mut fixture = fixture();
    fixture.failures.substitute_products = vec![OpportunityId::new(OPP_ONE)];
    let mut harness = harness(WizardConfig::default(), setup(), fixture);
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.select_all();
    controller.toggle_change_type(ChangeType::ChangeProduct);

    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(
        harness.service.substitute_requests().await,
        vec![OpportunityId::new(OPP_ONE), OpportunityId::new(OPP_TWO)]
    );
    assert!(controller.grid().products_for(&OpportunityId::new(OPP_ONE)).is_empty());
    assert_eq!(controller.grid().products_for(&OpportunityId::new(OPP_TWO)).len(), 1);

    let warnings = harness.signals.with_severity(Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, format!("Could not load available products for {OPP_ONE}"));
}

#[tokio::test]
async fn line_item_load_failure_notifies_without_blocking() {
    let mut fixture = fixture();
    fixture.failures.line_items = Some(RemoteErrorBody::default());
    let mut harness = harness(WizardConfig::default(), setup(), fixture);
    let controller = &mut harness.controller;
    controller.initialize().await;
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::ChangeProduct);

    assert_eq!(controller.next().await, Ok(WizardStep::EditLineItems));
    assert_eq!(controller.grid().total_count(), 0);
    let last = harness.signals.last_notification().expect("notification");
    assert_eq!(last.message, "Failed to load products");
    assert_eq!(controller.next().await, Ok(WizardStep::Review));
}

#[tokio::test]
async fn bulk_edits_notify_and_empty_bulk_is_a_no_op() {
    let mut harness = ready().await;
    let controller = &mut harness.controller;
    controller.select_all();
    controller.toggle_change_type(ChangeType::ChangePrice);
    controller.next().await.expect("line items");

    let before = controller.state().line_item_changes.clone();
    assert!(controller.apply_bulk_to_all("", "").is_err());
    assert_eq!(controller.state().line_item_changes, before);
    assert!(controller.apply_bulk_to_selected("01t-sub-1", "").is_err());

    controller.set_row_checked(&LineItemId::new("LI-2"), true);
    assert_eq!(controller.apply_bulk_to_selected("01t-sub-2", "75"), Ok(1));
    assert_eq!(controller.state().line_item_changes.len(), 1);
    assert_eq!(controller.apply_bulk_to_all("01t-sub-1", "110"), Ok(2));
    assert_eq!(controller.state().line_item_changes.len(), 2);

    controller.reset_all_line_items();
    assert!(controller.state().line_item_changes.is_empty());

    let messages: Vec<String> =
        harness.signals.notifications().into_iter().map(|notification| notification.message).collect();
    assert!(messages.contains(&"Please select at least one product to apply bulk changes".to_owned()));
    assert!(messages.contains(&"Bulk changes applied to 1 product(s)".to_owned()));
    assert!(messages.contains(&"Bulk changes applied to all 2 product(s)".to_owned()));
    assert!(messages.contains(&"All products reset to original values".to_owned()));
}

#[tokio::test]
async fn embedded_host_receives_continue_signal() {
    let config = WizardConfig { embedded_in_host: true, ..WizardConfig::default() };
    let mut harness = harness(config, setup(), fixture());
    let controller = &mut harness.controller;
    controller.initialize().await;
    assert_eq!(controller.submit_label(), "Create & Continue");
    controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    controller.toggle_change_type(ChangeType::CoTermContracts);
    controller.set_confirmed(true);

    controller.submit().await.expect("created");
    assert_eq!(harness.signals.navigations(), vec![NavigationIntent::ContinueHost]);
    assert_eq!(controller.contract_id(), Some("a00000000000001AAA"));
}

#[tokio::test]
async fn saved_draft_restores_in_a_new_session() {
    let mut first = ready().await;
    first.controller.toggle_opportunity(&OpportunityId::new(OPP_TWO));
    first.controller.toggle_change_type(ChangeType::ChangeTerm);
    first.controller.set_change_value(ChangeField::TermLength, ChangeValue::text("12"));
    first.controller.next().await.expect("review");
    first.controller.save_draft().await.expect("saved");
    assert!(first.drafts.get(ACCOUNT).await.is_some());

    let mut second =
        harness_with_drafts(WizardConfig::default(), setup(), fixture(), first.drafts.clone());
    second.controller.initialize().await;
    assert_eq!(second.controller.current_step(), WizardStep::Review);
    assert_eq!(second.controller.state().selection, vec![OpportunityId::new(OPP_TWO)]);
    assert_eq!(second.controller.state().selected_records.len(), 1);
    assert!(second.controller.state().flags.is_set(ChangeType::ChangeTerm));
    assert!(second.audit.event_types().contains(&"wizard.draft_restored".to_owned()));

    second.controller.set_confirmed(true);
    second.controller.submit().await.expect("created");
    assert!(second.drafts.get(ACCOUNT).await.is_none());
}

#[tokio::test]
async fn preselection_wins_over_draft_selection() {
    let drafts = Arc::new(InMemoryDraftStore::default());
    let draft = Draft {
        selected_opportunities: Some(vec![OpportunityId::new(OPP_TWO)]),
        selected_change_types: None,
        change_values: None,
        product_changes: None,
        current_step: Some(3),
    };
    drafts.seed(ACCOUNT, &draft.encode().expect("encode")).await;

    let mut harness = harness_with_drafts(
        WizardConfig::default(),
        WizardSetup { preselected: vec![OpportunityId::new(OPP_ONE)], ..setup() },
        fixture(),
        drafts,
    );
    harness.controller.initialize().await;

    assert_eq!(harness.controller.state().selection, vec![OpportunityId::new(OPP_ONE)]);
    // No change type in the draft, so the review step is not reachable.
    assert_eq!(harness.controller.current_step(), WizardStep::SelectRecords);
    assert_eq!(
        harness.controller.state().values.get(ChangeField::EffectiveDate),
        Some(&ChangeValue::Date(today()))
    );
}

#[tokio::test]
async fn unreadable_drafts_are_ignored() {
    let drafts = Arc::new(InMemoryDraftStore::default());
    drafts.seed(ACCOUNT, "{not json").await;
    let mut harness = harness_with_drafts(WizardConfig::default(), setup(), fixture(), drafts);
    harness.controller.initialize().await;
    assert_eq!(harness.controller.current_step(), WizardStep::SelectRecords);
    assert!(harness.controller.state().selection.is_empty());

    let mut unavailable = harness_with_drafts(
        WizardConfig::default(),
        setup(),
        fixture(),
        Arc::new(InMemoryDraftStore::unavailable()),
    );
    unavailable.controller.initialize().await;
    assert_eq!(unavailable.controller.selection().total_count(), 2);
    assert!(unavailable.controller.save_draft().await.is_err());
}

#[tokio::test]
async fn cancel_returns_to_host_record_without_submitting() {
    let mut harness = ready().await;
    harness.controller.toggle_opportunity(&OpportunityId::new(OPP_ONE));
    harness.controller.cancel();

    assert_eq!(harness.controller.status(), WizardStatus::Cancelled);
    assert_eq!(
        harness.signals.navigations(),
        vec![NavigationIntent::ViewRecord { record_id: ACCOUNT.to_owned() }]
    );
    assert!(harness.service.submissions().await.is_empty());
    assert!(harness.controller.state().selection.is_empty());
}
