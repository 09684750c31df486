use serde::{Deserialize, Serialize};
use strum::Display;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotationType {
    Sample,
    Bulk,
}

/// One quantity tier of an operator's quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationItem {
    #[serde(rename = "type")]
    pub quotation_type: QuotationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub price: Money,
    /// Minimum order quantity for this tier. A tier without one applies from
    /// the first unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl QuotationItem {
    pub fn new(quotation_type: QuotationType, quantity: i64, price: Money) -> Self {
        Self {
            quotation_type,
            sku: None,
            style: None,
            price,
            quantity: Some(quantity),
            lead_time_days: None,
            accepted: None,
            note: None,
        }
    }

    fn threshold(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }
}

/// Picks the tier of `kind` that applies to `quantity`.
///
/// Tiers are ordered by threshold (stable, so equal thresholds keep their
/// listed order) and the last tier whose threshold is `<= quantity` wins.
pub fn select_quoted_tier(
    quotations: &[QuotationItem],
    kind: QuotationType,
    quantity: i64,
) -> Option<&QuotationItem> {
    let mut tiers: Vec<&QuotationItem> = quotations
        .iter()
        .filter(|item| item.quotation_type == kind)
        .collect();
    tiers.sort_by_key(|item| item.threshold());

    tiers
        .into_iter()
        .filter(|item| item.threshold() <= quantity)
        .last()
}
