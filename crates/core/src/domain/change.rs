use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    ChangeServiceModel,
    ChangePricingModel,
    ChangeTerm,
    ChangePrice,
    ChangeProduct,
    AddAbatement,
    CoTermContracts,
}

impl ChangeType {
    pub const ALL: [ChangeType; 7] = [
        ChangeType::ChangeServiceModel,
        ChangeType::ChangePricingModel,
        ChangeType::ChangeTerm,
        ChangeType::ChangePrice,
        ChangeType::ChangeProduct,
        ChangeType::AddAbatement,
        ChangeType::CoTermContracts,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ChangeServiceModel => "changeServiceModel",
            Self::ChangePricingModel => "changePricingModel",
            Self::ChangeTerm => "changeTerm",
            Self::ChangePrice => "changePrice",
            Self::ChangeProduct => "changeProduct",
            Self::AddAbatement => "addAbatement",
            Self::CoTermContracts => "coTermContracts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ChangeServiceModel => "Change Service Model",
            Self::ChangePricingModel => "Change Pricing Model",
            Self::ChangeTerm => "Change Term",
            Self::ChangePrice => "Change Price",
            Self::ChangeProduct => "Change Product",
            Self::AddAbatement => "Add Abatement",
            Self::CoTermContracts => "Co-Term Contracts",
        }
    }

    /// Value fields owned by this change type; cleared when the flag is switched off.
    pub fn dependent_fields(self) -> &'static [ChangeField] {
        match self {
            Self::ChangeServiceModel => &[ChangeField::ServiceModel],
            Self::ChangePricingModel => &[ChangeField::PricingModel],
            Self::ChangeTerm => {
                &[ChangeField::TermLength, ChangeField::OptOutDays, ChangeField::RenewalTerm]
            }
            Self::AddAbatement => &[ChangeField::AbatementPeriod],
            Self::ChangePrice | Self::ChangeProduct | Self::CoTermContracts => &[],
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|change_type| change_type.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown change type `{trimmed}`"))
    }
}

/// Boolean toggles keyed by change type. Absent keys read as false.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeTypeFlags(BTreeMap<ChangeType, bool>);

impl ChangeTypeFlags {
    pub fn is_set(&self, change_type: ChangeType) -> bool {
        self.0.get(&change_type).copied().unwrap_or(false)
    }

    pub fn set(&mut self, change_type: ChangeType, value: bool) {
        self.0.insert(change_type, value);
    }

    pub fn with(mut self, change_type: ChangeType, value: bool) -> Self {
        self.set(change_type, value);
        self
    }

    pub fn any(&self) -> bool {
        self.0.values().any(|value| *value)
    }

    pub fn any_of(&self, change_types: &[ChangeType]) -> bool {
        change_types.iter().any(|change_type| self.is_set(*change_type))
    }

    pub fn selected(&self) -> Vec<ChangeType> {
        self.0.iter().filter(|(_, value)| **value).map(|(key, _)| *key).collect()
    }

    pub fn count(&self) -> usize {
        self.0.values().filter(|value| **value).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeField {
    ServiceModel,
    PricingModel,
    TermLength,
    OptOutDays,
    RenewalTerm,
    AbatementPeriod,
    EffectiveDate,
}

impl ChangeField {
    pub const ALL: [ChangeField; 7] = [
        ChangeField::ServiceModel,
        ChangeField::PricingModel,
        ChangeField::TermLength,
        ChangeField::OptOutDays,
        ChangeField::RenewalTerm,
        ChangeField::AbatementPeriod,
        ChangeField::EffectiveDate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ServiceModel => "serviceModel",
            Self::PricingModel => "pricingModel",
            Self::TermLength => "termLength",
            Self::OptOutDays => "optOutDays",
            Self::RenewalTerm => "renewalTerm",
            Self::AbatementPeriod => "abatementPeriod",
            Self::EffectiveDate => "effectiveDate",
        }
    }
}

impl std::str::FromStr for ChangeField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown change field `{trimmed}`"))
    }
}

/// A scalar entered on the options panel.
///
/// Variant order matters for untagged decoding: `YYYY-MM-DD` strings decode as
/// [`ChangeValue::Date`], other strings fall through to [`ChangeValue::Text`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeValue {
    Number(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl ChangeValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) | Self::Date(_) | Self::Timestamp(_) => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.normalize().to_string(),
            Self::Date(value) => value.format("%Y-%m-%d").to_string(),
            Self::Timestamp(value) => value.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeValues(BTreeMap<ChangeField, ChangeValue>);

impl ChangeValues {
    pub fn get(&self, field: ChangeField) -> Option<&ChangeValue> {
        self.0.get(&field)
    }

    /// True when the field is absent or holds blank text.
    pub fn is_blank(&self, field: ChangeField) -> bool {
        self.0.get(&field).map(ChangeValue::is_empty).unwrap_or(true)
    }

    pub fn set(&mut self, field: ChangeField, value: ChangeValue) {
        self.0.insert(field, value);
    }

    pub fn with(mut self, field: ChangeField, value: ChangeValue) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: ChangeField) -> Option<ChangeValue> {
        self.0.remove(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = ChangeField> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
