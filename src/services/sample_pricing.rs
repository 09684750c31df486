use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::PricingError;
use crate::fees::FeeScheduleLookup;
use crate::models::PurchaseOrder;
use crate::money::{Money, OptionalMoney};

/// Derived pricing of a sample order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePricing {
    pub sub_total_after_deduction: Option<Money>,
    pub transaction_fee: Money,
    pub tax: Money,
    pub total_price: Money,
}

impl SamplePricing {
    /// Overwrites the derived fields of `order`.
    pub fn apply_to(&self, order: &mut PurchaseOrder) {
        order.pricing.sub_total_after_deduction = self.sub_total_after_deduction;
        order.pricing.transaction_fee = Some(self.transaction_fee);
        order.pricing.tax = Some(self.tax);
        order.pricing.total_price = Some(self.total_price);
    }
}

/// Prices a sample order: one payment of goods, shipping, tax and card fee.
#[instrument(skip_all, fields(order_id = %order.id, currency = %order.currency))]
pub fn compute_sample_pricing(
    order: &PurchaseOrder,
    fees: &dyn FeeScheduleLookup,
) -> Result<SamplePricing, PricingError> {
    let schedule = fees.require(order.currency)?;
    let pricing = &order.pricing;

    // no deduction at sample granularity
    let sub_total_after_deduction = pricing.sub_total;
    let shipping_fee = pricing.shipping_fee.or_zero();
    let chargeable = sub_total_after_deduction.or_zero() + shipping_fee;

    let transaction_fee = if order.payment.payment_type.is_bank_transfer() {
        Money::ZERO
    } else {
        schedule.card_fee(chargeable)
    };
    let tax = chargeable.apply_percentage(pricing.tax_percentage.unwrap_or(Decimal::ZERO));
    let total_price = tax + transaction_fee + pricing.sub_total.or_zero() + shipping_fee;

    debug!(
        %transaction_fee,
        %tax,
        %total_price,
        payment_type = %order.payment.payment_type,
        "sample order priced"
    );

    Ok(SamplePricing {
        sub_total_after_deduction,
        transaction_fee,
        tax,
        total_price,
    })
}
