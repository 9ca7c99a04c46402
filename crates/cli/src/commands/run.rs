use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use changeorder_core::audit::InMemoryAuditSink;
use changeorder_core::config::{AppConfig, LoadOptions};
use changeorder_core::domain::change::{ChangeField, ChangeType, ChangeValue};
use changeorder_core::domain::line_item::LineItemId;
use changeorder_core::domain::opportunity::OpportunityId;
use changeorder_core::flows::WizardStep;
use changeorder_core::gateway::{InMemoryChangeOrderService, ServiceFixture};
use changeorder_core::panels::GridField;
use changeorder_core::signals::{InMemorySignalSink, NavigationIntent, Notification};
use changeorder_core::summary::Summary;
use changeorder_core::wizard::{WizardController, WizardServices, WizardSetup, WizardStatus};
use changeorder_db::{connect_for_drafts, migrations, SqlDraftStore};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::commands::{
    CommandResult, EXIT_CONFIG, EXIT_DB_CONNECTIVITY, EXIT_INPUT, EXIT_MIGRATION, EXIT_RUNTIME,
    EXIT_WIZARD,
};

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, help = "JSON service fixture (candidates, picklists, line items, submission reply)")]
    pub fixture: PathBuf,
    #[arg(long, help = "JSON array of scripted wizard actions")]
    pub script: Option<PathBuf>,
    #[arg(long, help = "Host record id (cancel returns here; fallback draft key)")]
    pub record_id: Option<String>,
    #[arg(long, help = "Account id used to key drafts (defaults to the fixture account key)")]
    pub account_id: Option<String>,
    #[arg(long = "preselect", help = "Opportunity id to preselect; repeatable")]
    pub preselected: Vec<String>,
}

/// One scripted user interaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScriptAction {
    ToggleOpportunity {
        id: OpportunityId,
    },
    SelectAll,
    DeselectAll,
    Search {
        term: String,
    },
    ToggleChangeType {
        change_type: ChangeType,
    },
    SetValue {
        field: ChangeField,
        value: ChangeValue,
    },
    SetLineItem {
        line_item_id: LineItemId,
        #[serde(default)]
        new_product: Option<String>,
        #[serde(default)]
        new_price: Option<String>,
    },
    CheckRow {
        line_item_id: LineItemId,
        #[serde(default = "checked_by_default")]
        checked: bool,
    },
    ApplyToSelected {
        #[serde(default)]
        new_product: String,
        #[serde(default)]
        new_price: String,
    },
    ApplyToAll {
        #[serde(default)]
        new_product: String,
        #[serde(default)]
        new_price: String,
    },
    ResetAll,
    Next,
    Previous,
    GoTo {
        step: u8,
    },
    Confirm {
        #[serde(default = "checked_by_default")]
        confirmed: bool,
    },
    SaveDraft,
    Submit,
    Cancel,
}

fn checked_by_default() -> bool {
    true
}

impl ScriptAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleOpportunity { .. } => "toggleOpportunity",
            Self::SelectAll => "selectAll",
            Self::DeselectAll => "deselectAll",
            Self::Search { .. } => "search",
            Self::ToggleChangeType { .. } => "toggleChangeType",
            Self::SetValue { .. } => "setValue",
            Self::SetLineItem { .. } => "setLineItem",
            Self::CheckRow { .. } => "checkRow",
            Self::ApplyToSelected { .. } => "applyToSelected",
            Self::ApplyToAll { .. } => "applyToAll",
            Self::ResetAll => "resetAll",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::GoTo { .. } => "goTo",
            Self::Confirm { .. } => "confirm",
            Self::SaveDraft => "saveDraft",
            Self::Submit => "submit",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub index: usize,
    pub action: &'static str,
    pub ok: bool,
    pub step: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub command: &'static str,
    pub status: &'static str,
    pub final_step: u8,
    pub wizard_status: WizardStatus,
    pub contract_id: Option<String>,
    pub actions: Vec<ActionOutcome>,
    pub notifications: Vec<Notification>,
    pub navigations: Vec<NavigationIntent>,
    pub summary: Summary,
    pub audit_events: Vec<String>,
}

pub fn run(options: &LoadOptions, args: &RunArgs) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "run",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let (fixture, actions) = match load_inputs(&args.fixture, args.script.as_deref()) {
        Ok(inputs) => inputs,
        Err(error) => {
            return CommandResult::failure("run", "input", format!("{error:#}"), EXIT_INPUT);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "run",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect_for_drafts(&config.drafts).await {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure(
                    "run",
                    "db_connectivity",
                    error.to_string(),
                    EXIT_DB_CONNECTIVITY,
                );
            }
        };
        if let Err(error) = migrations::run_pending(&pool).await {
            return CommandResult::failure("run", "migration", error.to_string(), EXIT_MIGRATION);
        }

        let setup = WizardSetup {
            record_id: args.record_id.clone(),
            account_id: args.account_id.clone().or_else(|| fixture.account_key.clone()),
            preselected: args.preselected.iter().map(OpportunityId::new).collect(),
            correlation_id: None,
        };
        let signals = InMemorySignalSink::default();
        let audit = InMemoryAuditSink::default();
        let services = WizardServices::new(
            Arc::new(InMemoryChangeOrderService::new(fixture)),
            Arc::new(SqlDraftStore::new(pool.clone())),
            Arc::new(signals.clone()),
        )
        .with_audit(Arc::new(audit.clone()));

        let mut controller = WizardController::new(config.wizard.clone(), setup, services);
        controller.initialize().await;
        let outcomes = replay(&mut controller, actions).await;
        pool.close().await;

        let failed = outcomes.iter().any(|outcome| !outcome.ok);
        let report = RunReport {
            command: "run",
            status: if failed { "error" } else { "ok" },
            final_step: controller.current_step().number(),
            wizard_status: controller.status(),
            contract_id: controller.contract_id().map(str::to_owned),
            actions: outcomes,
            notifications: signals.notifications(),
            navigations: signals.navigations(),
            summary: controller.summary(),
            audit_events: audit.event_types(),
        };
        CommandResult::report(&report, if failed { EXIT_WIZARD } else { 0 })
    })
}

fn load_inputs(fixture: &Path, script: Option<&Path>) -> Result<(ServiceFixture, Vec<ScriptAction>)> {
    let raw = fs::read_to_string(fixture)
        .with_context(|| format!("could not read fixture `{}`", fixture.display()))?;
    let fixture = ServiceFixture::from_json(&raw)
        .with_context(|| format!("could not parse fixture `{}`", fixture.display()))?;

    let actions = match script {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read script `{}`", path.display()))?;
            serde_json::from_str::<Vec<ScriptAction>>(&raw)
                .with_context(|| format!("could not parse script `{}`", path.display()))?
        }
        None => Vec::new(),
    };
    Ok((fixture, actions))
}

/// Applies every action in order; failures are recorded and the replay continues.
pub async fn replay(controller: &mut WizardController, actions: Vec<ScriptAction>) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());
    for (index, action) in actions.into_iter().enumerate() {
        let name = action.name();
        let result = apply(controller, action).await;
        if let Err(message) = &result {
            tracing::warn!(
                event_name = "cli.run.action_failed",
                index,
                action = name,
                error = %message,
                "scripted action failed"
            );
        }
        outcomes.push(ActionOutcome {
            index,
            action: name,
            ok: result.is_ok(),
            step: controller.current_step().number(),
            message: result.err(),
        });
    }
    outcomes
}

async fn apply(controller: &mut WizardController, action: ScriptAction) -> Result<(), String> {
    match action {
        ScriptAction::ToggleOpportunity { id } => controller.toggle_opportunity(&id),
        ScriptAction::SelectAll => controller.select_all(),
        ScriptAction::DeselectAll => controller.deselect_all(),
        ScriptAction::Search { term } => controller.set_search_term(term),
        ScriptAction::ToggleChangeType { change_type } => controller.toggle_change_type(change_type),
        ScriptAction::SetValue { field, value } => controller.set_change_value(field, value),
        ScriptAction::SetLineItem { line_item_id, new_product, new_price } => {
            let edits = [(GridField::NewProduct, new_product), (GridField::NewPrice, new_price)];
            for (field, value) in edits {
                if let Some(value) = value {
                    if !controller.set_line_item_field(&line_item_id, field, &value) {
                        return Err(format!("unknown line item `{line_item_id}`"));
                    }
                }
            }
        }
        ScriptAction::CheckRow { line_item_id, checked } => {
            if !controller.set_row_checked(&line_item_id, checked) {
                return Err(format!("unknown line item `{line_item_id}`"));
            }
        }
        ScriptAction::ApplyToSelected { new_product, new_price } => {
            controller
                .apply_bulk_to_selected(&new_product, &new_price)
                .map_err(|error| error.to_string())?;
        }
        ScriptAction::ApplyToAll { new_product, new_price } => {
            controller.apply_bulk_to_all(&new_product, &new_price).map_err(|error| error.to_string())?;
        }
        ScriptAction::ResetAll => controller.reset_all_line_items(),
        ScriptAction::Next => {
            controller.next().await.map_err(|error| error.to_string())?;
        }
        ScriptAction::Previous => {
            controller.previous().await.map_err(|error| error.to_string())?;
        }
        ScriptAction::GoTo { step } => {
            let step = WizardStep::from_number(step).ok_or_else(|| format!("unknown step {step}"))?;
            controller.go_to_step(step).await.map_err(|error| error.to_string())?;
        }
        ScriptAction::Confirm { confirmed } => controller.set_confirmed(confirmed),
        ScriptAction::SaveDraft => {
            controller.save_draft().await.map_err(|error| error.to_string())?;
        }
        ScriptAction::Submit => {
            controller.submit().await.map_err(|error| error.user_message())?;
        }
        ScriptAction::Cancel => controller.cancel(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use changeorder_core::domain::change::{ChangeField, ChangeType, ChangeValue};
    use changeorder_core::domain::line_item::LineItemId;

    use super::ScriptAction;

    #[test]
    fn script_actions_use_camel_case_tags_and_fields() {
        let raw = r#"[
            {"action": "toggleChangeType", "changeType": "changeTerm"},
            {"action": "setValue", "field": "termLength", "value": "12"},
            {"action": "setLineItem", "lineItemId": "00k1", "newPrice": "90"},
            {"action": "checkRow", "lineItemId": "00k1"},
            {"action": "goTo", "step": 3},
            {"action": "confirm"},
            {"action": "submit"}
        ]"#;
        let actions: Vec<ScriptAction> = serde_json::from_str(raw).expect("script");

        assert_eq!(actions[0], ScriptAction::ToggleChangeType { change_type: ChangeType::ChangeTerm });
        assert!(matches!(
            &actions[1],
            ScriptAction::SetValue { field: ChangeField::TermLength, value }
                if !matches!(value, ChangeValue::Date(_))
        ));
        assert_eq!(
            actions[2],
            ScriptAction::SetLineItem {
                line_item_id: LineItemId::new("00k1"),
                new_product: None,
                new_price: Some("90".to_owned()),
            }
        );
        assert_eq!(actions[3], ScriptAction::CheckRow { line_item_id: LineItemId::new("00k1"), checked: true });
        assert_eq!(actions[5], ScriptAction::Confirm { confirmed: true });
        assert_eq!(actions.iter().map(ScriptAction::name).last(), Some("submit"));
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert!(serde_json::from_str::<Vec<ScriptAction>>(r#"[{"action": "explode"}]"#).is_err());
    }
}
