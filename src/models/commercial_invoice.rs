use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
}

/// One shipped line of a commercial invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommercialInvoiceItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hs_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_name: Option<String>,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub total_quantity: i64,
    #[serde(default)]
    pub actual_quantity: i64,
    #[serde(default)]
    pub total_amount: Money,
}

/// Invoice issued for what was actually shipped.
///
/// When attached to a bulk order its totals replace the order's own
/// sub-total and shipping fee for the final payment. The order's quoted
/// sub-total is never rewritten from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommercialInvoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<CommercialInvoiceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percentage: Option<Decimal>,
}

impl CommercialInvoice {
    /// The invoice's own sub-total when positive, otherwise the sum of its
    /// line amounts.
    pub fn effective_sub_total(&self) -> Money {
        match self.sub_total {
            Some(sub_total) if sub_total.is_positive() => sub_total,
            _ => self.items.iter().map(|item| item.total_amount).sum(),
        }
    }
}
