use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::opportunity::OpportunityId;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub String);

impl LineItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product line on one of the selected opportunities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub opportunity_id: OpportunityId,
    pub opportunity_name: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub lease_rate: Option<Decimal>,
    #[serde(default)]
    pub is_recurring_revenue: bool,
}

impl LineItem {
    /// Recurring-revenue lines are priced by lease rate, everything else by unit price.
    pub fn original_price(&self) -> Decimal {
        if self.is_recurring_revenue {
            self.lease_rate.unwrap_or(Decimal::ZERO)
        } else {
            self.unit_price
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstituteProduct {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PicklistOptions {
    pub service_models: Vec<PicklistOption>,
    pub pricing_models: Vec<PicklistOption>,
    pub machine_types: Vec<PicklistOption>,
}

/// Outgoing projection of one modified grid row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemChange {
    pub line_item_id: LineItemId,
    #[serde(default)]
    pub opportunity_name: String,
    #[serde(default)]
    pub original_product: String,
    #[serde(default)]
    pub original_price: Decimal,
    #[serde(default)]
    pub original_unit_price: Decimal,
    #[serde(default)]
    pub original_lease_rate: Option<Decimal>,
    #[serde(default)]
    pub is_recurring_revenue: bool,
    #[serde(default)]
    pub new_product: String,
    #[serde(default)]
    pub new_price: String,
}

impl LineItemChange {
    pub fn has_new_product(&self) -> bool {
        !self.new_product.trim().is_empty()
    }

    pub fn has_new_price(&self) -> bool {
        !self.new_price.trim().is_empty()
    }

    /// Exactly one of product or price set.
    pub fn is_partial(&self) -> bool {
        self.has_new_product() != self.has_new_price()
    }

    /// Lenient price parse: blank or malformed input reads as zero.
    pub fn parsed_new_price(&self) -> Decimal {
        parse_price(&self.new_price)
    }

    pub fn impact(&self) -> Decimal {
        price_delta(self.parsed_new_price(), self.original_price)
    }
}

/// Largest magnitude accepted from a typed price; anything beyond reads as zero.
const MAX_PRICE_MAGNITUDE: i64 = 1_000_000_000_000_000;

pub fn parse_price(raw: &str) -> Decimal {
    raw.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .ok()
        .filter(|price| price.abs() <= Decimal::from(MAX_PRICE_MAGNITUDE))
        .unwrap_or(Decimal::ZERO)
}

/// `new - original`, saturating at the representable range.
pub fn price_delta(new_price: Decimal, original_price: Decimal) -> Decimal {
    new_price.saturating_sub(original_price)
}

pub fn sum_impacts(impacts: impl IntoIterator<Item = Decimal>) -> Decimal {
    impacts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}
