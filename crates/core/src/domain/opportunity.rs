use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Platform record ids are 15 or 18 characters; anything shorter is rejected.
pub const MIN_RECORD_ID_LEN: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(pub String);

impl OpportunityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_well_formed(&self) -> bool {
        !self.0.trim().is_empty() && self.0.chars().count() >= MIN_RECORD_ID_LEN
    }
}

impl std::fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate record the user can fold into a change order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: OpportunityId,
    pub name: String,
    pub stage: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub quote_number: Option<String>,
}

impl Opportunity {
    pub fn has_positive_amount(&self) -> bool {
        self.amount.map(|amount| amount > Decimal::ZERO).unwrap_or(false)
    }

    pub fn has_quote(&self) -> bool {
        self.quote_number.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false)
    }

    /// Case-insensitive substring match on name and stage.
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.stage.to_lowercase().contains(needle_lower)
    }
}

/// Formats an amount as US dollars, e.g. `$1,234.50`. Missing amounts render as `$0.00`.
pub fn format_currency(amount: Option<Decimal>) -> String {
    let amount = amount.unwrap_or(Decimal::ZERO);
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// Formats a close date as `Oct 19, 2026`. Missing dates render as an empty string.
pub fn format_close_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%b %-d, %Y").to_string()).unwrap_or_default()
}
