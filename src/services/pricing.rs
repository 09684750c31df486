use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::bulk_pricing::{compute_bulk_pricing, BulkPricing};
use super::sample_pricing::{compute_sample_pricing, SamplePricing};
use crate::errors::PricingError;
use crate::fees::FeeScheduleLookup;
use crate::models::{BulkPurchaseOrder, PurchaseOrder};
use crate::money::Money;

/// Card charge for a deposit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub amount: Money,
    pub transaction_fee: Money,
    pub total: Money,
    /// `total` in the provider's smallest unit
    pub total_minor_units: i64,
    pub fee_minor_units: i64,
}

/// Entry point for pricing orders against the configured fee schedules.
#[derive(Clone)]
pub struct PricingService {
    fees: Arc<dyn FeeScheduleLookup>,
}

impl PricingService {
    pub fn new(fees: Arc<dyn FeeScheduleLookup>) -> Self {
        Self { fees }
    }

    pub fn fees(&self) -> &dyn FeeScheduleLookup {
        self.fees.as_ref()
    }

    pub fn quote_sample_order(&self, order: &PurchaseOrder) -> Result<SamplePricing, PricingError> {
        compute_sample_pricing(order, self.fees())
    }

    /// Recomputes and writes the derived fields; `order` is untouched on error.
    pub fn update_sample_prices(&self, order: &mut PurchaseOrder) -> Result<(), PricingError> {
        let pricing = self.quote_sample_order(order)?;
        pricing.apply_to(order);
        Ok(())
    }

    pub fn quote_bulk_order(&self, order: &BulkPurchaseOrder) -> Result<BulkPricing, PricingError> {
        compute_bulk_pricing(order, self.fees())
    }

    /// Recomputes and writes the derived fields; `order` is untouched on error.
    pub fn update_bulk_prices(&self, order: &mut BulkPurchaseOrder) -> Result<(), PricingError> {
        let pricing = self.quote_bulk_order(order)?;
        pricing.apply_to(order);
        Ok(())
    }

    /// Prices a card-paid deposit of `amount` for `order`.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn quote_deposit(
        &self,
        order: &BulkPurchaseOrder,
        amount: Money,
    ) -> Result<DepositQuote, PricingError> {
        if order.deposit.is_paid() {
            return Err(PricingError::DepositAlreadyPaid(order.id));
        }
        if !amount.is_positive() {
            return Err(PricingError::InvalidDepositAmount(amount));
        }

        let schedule = self.fees.require(order.currency)?;
        let transaction_fee = schedule.card_fee(amount);
        let total = amount + transaction_fee;
        let to_minor = |value: Money| {
            value
                .to_minor_units(schedule.smallest_unit_factor)
                .ok_or_else(|| PricingError::InvalidInput(format!("{} overflows minor units", value)))
        };

        let quote = DepositQuote {
            amount,
            transaction_fee,
            total,
            total_minor_units: to_minor(total)?,
            fee_minor_units: to_minor(transaction_fee)?,
        };
        info!(%amount, fee = %transaction_fee, "deposit quoted");
        Ok(quote)
    }
}
