use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeField, ChangeType, ChangeValues};
use crate::domain::dates::{normalize_effective_date, parse_calendar_date, Clock};
use crate::domain::line_item::{sum_impacts, LineItemChange};
use crate::wizard::events::PanelEvent;
use crate::wizard::state::WizardState;

pub const EFFECTIVE_DATE_IN_PAST: &str = "Effective date is in the past";
const NOT_SPECIFIED: &str = "Not specified";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTypeDetail {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDetail {
    pub change: LineItemChange,
    pub impact: Decimal,
    pub revenue_type_label: String,
    pub new_product_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub opportunity_count: usize,
    pub product_count: usize,
    pub change_type_count: usize,
    pub total_value_impact: Decimal,
    pub warnings: Vec<String>,
    pub has_warnings: bool,
}

/// Read-only derivations over the composite state. Only the confirmation toggle mutates.
#[derive(Clone, Debug)]
pub struct SummaryEngine {
    warning_pct: u32,
    confirmed: bool,
}

impl SummaryEngine {
    pub fn new(warning_pct: u32) -> Self {
        Self { warning_pct, confirmed: false }
    }

    pub fn on_input(&mut self, confirmed: bool) {
        self.confirmed = confirmed;
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn set_confirmed(&mut self, confirmed: bool) -> PanelEvent {
        self.confirmed = confirmed;
        PanelEvent::ConfirmationChanged { confirmed }
    }

    pub fn opportunity_count(&self, state: &WizardState) -> usize {
        state.selection.len()
    }

    pub fn product_count(&self, state: &WizardState) -> usize {
        state.line_item_changes.len()
    }

    pub fn change_type_count(&self, state: &WizardState) -> usize {
        state.flags.count()
    }

    /// Sum of `new - original` over changes that carry a new price. Unparseable prices read as 0.
    pub fn total_value_impact(&self, state: &WizardState) -> Decimal {
        sum_impacts(priced_changes(&state.line_item_changes).map(LineItemChange::impact))
    }

    pub fn change_type_details(&self, state: &WizardState) -> Vec<ChangeTypeDetail> {
        ChangeType::ALL
            .into_iter()
            .filter(|change_type| state.flags.is_set(*change_type))
            .map(|change_type| ChangeTypeDetail {
                label: change_type.label().to_owned(),
                value: detail_value(change_type, &state.values),
            })
            .collect()
    }

    pub fn line_item_details(&self, state: &WizardState) -> Vec<LineItemDetail> {
        state
            .line_item_changes
            .iter()
            .map(|change| LineItemDetail {
                change: change.clone(),
                impact: change.impact(),
                revenue_type_label: revenue_type_label(change.is_recurring_revenue).to_owned(),
                new_product_name: if change.has_new_product() {
                    change.new_product.clone()
                } else {
                    "Product Name Not Available".to_owned()
                },
            })
            .collect()
    }

    /// Recomputed on every call.
    pub fn warnings(&self, state: &WizardState, clock: &dyn Clock) -> Vec<String> {
        let mut warnings = Vec::new();

        let without_amount =
            state.selected_records.iter().filter(|record| !record.has_positive_amount()).count();
        if without_amount > 0 {
            warnings.push(format!("{without_amount} opportunity(ies) do not have amounts specified"));
        }

        let (mut increases, mut decreases) = (0usize, 0usize);
        for change in priced_changes(&state.line_item_changes) {
            let original = change.original_price;
            if original <= Decimal::ZERO {
                continue;
            }
            let impact = change.impact();
            if !exceeds_pct(impact.abs(), original, self.warning_pct) {
                continue;
            }
            if impact > Decimal::ZERO {
                increases += 1;
            } else {
                decreases += 1;
            }
        }
        if increases > 0 {
            warnings.push(format!(
                "{increases} product(s) have price increases greater than {}%",
                self.warning_pct
            ));
        }
        if decreases > 0 {
            warnings.push(format!(
                "{decreases} product(s) have price decreases greater than {}%",
                self.warning_pct
            ));
        }

        let normalized = normalize_effective_date(state.values.get(ChangeField::EffectiveDate), clock);
        if parse_calendar_date(&normalized).is_some_and(|date| date < clock.today()) {
            warnings.push(EFFECTIVE_DATE_IN_PAST.to_owned());
        }

        warnings
    }

    pub fn summary(&self, state: &WizardState, clock: &dyn Clock) -> Summary {
        let warnings = self.warnings(state, clock);
        Summary {
            opportunity_count: self.opportunity_count(state),
            product_count: self.product_count(state),
            change_type_count: self.change_type_count(state),
            total_value_impact: self.total_value_impact(state),
            has_warnings: !warnings.is_empty(),
            warnings,
        }
    }
}

/// `delta * 100 > pct * original`. An overflowing delta side always exceeds.
fn exceeds_pct(delta: Decimal, original: Decimal, pct: u32) -> bool {
    match (delta.checked_mul(Decimal::ONE_HUNDRED), Decimal::from(pct).checked_mul(original)) {
        (Some(scaled), Some(limit)) => scaled > limit,
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

fn revenue_type_label(is_recurring_revenue: bool) -> &'static str {
    if is_recurring_revenue {
        "Recurring"
    } else {
        "One-Time"
    }
}

fn priced_changes(changes: &[LineItemChange]) -> impl Iterator<Item = &LineItemChange> {
    changes.iter().filter(|change| change.has_new_price())
}

fn detail_value(change_type: ChangeType, values: &ChangeValues) -> String {
    let text = |field: ChangeField| {
        values.get(field).filter(|value| !value.is_empty()).map(|value| value.display())
    };

    match change_type {
        ChangeType::ChangeServiceModel => {
            text(ChangeField::ServiceModel).unwrap_or_else(|| NOT_SPECIFIED.to_owned())
        }
        ChangeType::ChangePricingModel => {
            text(ChangeField::PricingModel).unwrap_or_else(|| NOT_SPECIFIED.to_owned())
        }
        ChangeType::ChangeTerm => {
            let parts: Vec<String> = [
                text(ChangeField::TermLength).map(|value| format!("{value} months")),
                text(ChangeField::OptOutDays).map(|value| format!("{value} opt-out days")),
                text(ChangeField::RenewalTerm).map(|value| format!("{value} months renewal")),
            ]
            .into_iter()
            .flatten()
            .collect();
            if parts.is_empty() {
                NOT_SPECIFIED.to_owned()
            } else {
                parts.join(", ")
            }
        }
        ChangeType::ChangePrice => "Price modifications specified in product grid".to_owned(),
        ChangeType::ChangeProduct => "Product modifications specified in product grid".to_owned(),
        ChangeType::AddAbatement => text(ChangeField::AbatementPeriod)
            .map(|value| format!("{value} days"))
            .unwrap_or_else(|| NOT_SPECIFIED.to_owned()),
        ChangeType::CoTermContracts => "Contracts will be co-termed".to_owned(),
    }
}
