use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;
use super::payment::MilestonePayment;
use super::pricing::Pricing;
use super::quotation::{select_quoted_tier, QuotationItem, QuotationType};
use crate::money::Money;

/// Sample order: a single payment covering the sample goods and shipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub quotations: Vec<QuotationItem>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub payment: MilestonePayment,
}

impl PurchaseOrder {
    pub fn new(currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference_id: None,
            currency,
            quantity: 0,
            quotations: Vec::new(),
            pricing: Pricing::default(),
            payment: MilestonePayment::default(),
        }
    }

    /// Sample tier that applies to the ordered quantity.
    pub fn quoted_price(&self) -> Option<Money> {
        select_quoted_tier(&self.quotations, QuotationType::Sample, self.quantity)
            .map(|tier| tier.price)
    }

    /// Sub-total spread over the ordered pieces; `None` without a sub-total
    /// or quantity.
    pub fn sample_unit_price(&self) -> Option<Money> {
        self.pricing.sub_total?.divide_by_int(self.quantity)
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_paid()
    }
}
