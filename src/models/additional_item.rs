use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::PricingError;
use crate::money::Money;

fn default_quantity() -> i64 {
    1
}

/// An ad-hoc billable line attached to a bulk order (extra trims, labels,
/// express packaging, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AdditionalItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Money,
    /// Derived from `unit_price × quantity` on every pricing pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Money>,
}

impl AdditionalItem {
    pub fn new(description: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            sku: None,
            description: Some(description.into()),
            quantity,
            unit_price,
            total_price: None,
        }
    }

    pub fn computed_total(&self) -> Result<Money, PricingError> {
        self.unit_price.multiply_by_int(self.quantity).ok_or_else(|| {
            PricingError::InvalidInput(format!(
                "additional item total overflows: {} × {}",
                self.unit_price, self.quantity
            ))
        })
    }
}
