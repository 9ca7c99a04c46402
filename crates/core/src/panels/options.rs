use chrono::NaiveDate;

use crate::domain::change::{ChangeField, ChangeType, ChangeTypeFlags, ChangeValue, ChangeValues};
use crate::domain::line_item::{PicklistOption, PicklistOptions};
use crate::errors::ValidationError;
use crate::wizard::events::PanelEvent;

pub const EFFECTIVE_DATE_REQUIRED: &str = "Effective Date is required.";

const REQUIRED_BY_FLAG: [(ChangeType, ChangeField, &str); 4] = [
    (
        ChangeType::ChangeServiceModel,
        ChangeField::ServiceModel,
        "Service Model is required when Change Service Model is selected.",
    ),
    (
        ChangeType::ChangePricingModel,
        ChangeField::PricingModel,
        "Pricing Model is required when Change Pricing Model is selected.",
    ),
    (
        ChangeType::ChangeTerm,
        ChangeField::TermLength,
        "Term Length is required when Change Term is selected.",
    ),
    (
        ChangeType::AddAbatement,
        ChangeField::AbatementPeriod,
        "Abatement Period is required when Add Abatement is selected.",
    ),
];

/// Messages for every set flag whose required value is blank.
pub fn missing_required_fields(flags: &ChangeTypeFlags, values: &ChangeValues) -> Vec<String> {
    REQUIRED_BY_FLAG
        .iter()
        .filter(|(flag, field, _)| flags.is_set(*flag) && values.is_blank(*field))
        .map(|(_, _, message)| (*message).to_owned())
        .collect()
}

/// Change-type toggles plus the values each toggle needs.
#[derive(Clone, Debug)]
pub struct OptionPanel {
    flags: ChangeTypeFlags,
    values: ChangeValues,
    service_models: Vec<PicklistOption>,
    pricing_models: Vec<PicklistOption>,
    line_item_change_types: Vec<ChangeType>,
    validation_message: Option<String>,
}

impl OptionPanel {
    pub fn new(line_item_change_types: Vec<ChangeType>) -> Self {
        Self {
            flags: ChangeTypeFlags::default(),
            values: ChangeValues::default(),
            service_models: Vec::new(),
            pricing_models: Vec::new(),
            line_item_change_types,
            validation_message: None,
        }
    }

    /// Seeds the effective date with `today` when absent.
    pub fn initialize(&mut self, today: NaiveDate) -> Option<PanelEvent> {
        if !self.values.is_blank(ChangeField::EffectiveDate) {
            return None;
        }
        self.values.set(ChangeField::EffectiveDate, ChangeValue::Date(today));
        Some(self.changed())
    }

    pub fn on_input(&mut self, flags: &ChangeTypeFlags, values: &ChangeValues) {
        self.flags = flags.clone();
        self.values = values.clone();
    }

    pub fn set_picklists(&mut self, picklists: &PicklistOptions) {
        self.service_models = picklists.service_models.clone();
        self.pricing_models = picklists.pricing_models.clone();
    }

    pub fn toggle(&mut self, change_type: ChangeType) -> PanelEvent {
        let next = !self.flags.is_set(change_type);
        self.set_flag(change_type, next)
    }

    /// Sets a flag explicitly. Switching a flag off drops its dependent values.
    pub fn set_flag(&mut self, change_type: ChangeType, enabled: bool) -> PanelEvent {
        self.flags.set(change_type, enabled);
        if !enabled {
            for field in change_type.dependent_fields() {
                self.values.remove(*field);
            }
        }
        self.validation_message = None;
        self.changed()
    }

    pub fn set_value(&mut self, field: ChangeField, value: ChangeValue) -> PanelEvent {
        self.values.set(field, value);
        self.changed()
    }

    /// Collects every violation rather than stopping at the first.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        let no_flag = !self.flags.any();
        if no_flag {
            messages.push(ValidationError::NoChangeType.to_string());
        }
        messages.extend(missing_required_fields(&self.flags, &self.values));
        if self.values.is_blank(ChangeField::EffectiveDate) {
            messages.push(EFFECTIVE_DATE_REQUIRED.to_owned());
        }

        if messages.is_empty() {
            self.validation_message = None;
            return Ok(());
        }

        self.validation_message = Some(messages.join(" "));
        if no_flag && messages.len() == 1 {
            Err(ValidationError::NoChangeType)
        } else {
            Err(ValidationError::MissingRequiredFields(messages))
        }
    }

    pub fn reset_validation(&mut self) {
        self.validation_message = None;
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn selected_change_types(&self) -> Vec<ChangeType> {
        self.flags.selected()
    }

    pub fn has_line_item_changes(&self) -> bool {
        self.flags.any_of(&self.line_item_change_types)
    }

    pub fn flags(&self) -> &ChangeTypeFlags {
        &self.flags
    }

    pub fn values(&self) -> &ChangeValues {
        &self.values
    }

    pub fn service_models(&self) -> &[PicklistOption] {
        &self.service_models
    }

    pub fn pricing_models(&self) -> &[PicklistOption] {
        &self.pricing_models
    }

    fn changed(&self) -> PanelEvent {
        PanelEvent::OptionsChanged { flags: self.flags.clone(), values: self.values.clone() }
    }
}
