use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{Money, OptionalMoney};

/// Price breakdown shared by sample and bulk orders.
///
/// Every amount is optional: `None` means the field has not been computed
/// yet, which is different from a computed zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_total_after_deduction: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Money>,
    /// Tax rate in percent, e.g. `8` for 8%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percentage: Option<Decimal>,
}

impl Pricing {
    /// Field-wise sum used when several orders are paid in one checkout.
    ///
    /// Tax percentages are per order and are not carried into the sum.
    pub fn combined_with(&self, other: &Pricing) -> Pricing {
        Pricing {
            sub_total: self.sub_total.combine(other.sub_total),
            sub_total_after_deduction: self
                .sub_total_after_deduction
                .combine(other.sub_total_after_deduction),
            shipping_fee: self.shipping_fee.combine(other.shipping_fee),
            transaction_fee: self.transaction_fee.combine(other.transaction_fee),
            tax: self.tax.combine(other.tax),
            total_price: self.total_price.combine(other.total_price),
            tax_percentage: None,
        }
    }
}
