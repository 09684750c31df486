//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sourcing_pricing::{
    models::{BulkPurchaseOrder, Currency, PaymentMilestone, PaymentType, PurchaseOrder},
    services::{CheckoutService, PricingService},
    FeeSchedule, Money, StaticFeeSchedules,
};

/// USD at 2.9% + 0.30 and VND at 3.2% + 2,000.
pub fn fee_schedules() -> StaticFeeSchedules {
    StaticFeeSchedules::new()
        .with_schedule(
            Currency::Usd,
            FeeSchedule::new(dec!(0.029), Money::new(dec!(0.30))),
        )
        .with_schedule(
            Currency::Vnd,
            FeeSchedule::new(dec!(0.032), Money::new(dec!(2000))).with_smallest_unit_factor(1),
        )
}

pub fn pricing_service() -> PricingService {
    PricingService::new(Arc::new(fee_schedules()))
}

pub fn checkout_service() -> CheckoutService {
    CheckoutService::new(pricing_service())
}

pub fn money(amount: Decimal) -> Money {
    Money::new(amount)
}

pub fn sample_order(sub_total: Decimal, shipping: Decimal, payment_type: PaymentType) -> PurchaseOrder {
    let mut order = PurchaseOrder::new(Currency::Usd);
    order.quantity = 3;
    order.pricing.sub_total = Some(money(sub_total));
    order.pricing.shipping_fee = Some(money(shipping));
    order.payment.payment_type = payment_type;
    order
}

/// The reference bulk order: 10,000.00 goods, 200.00 shipping, 8% tax,
/// 40% first payment, card throughout.
pub fn card_bulk_order() -> BulkPurchaseOrder {
    let mut order = BulkPurchaseOrder::new(Currency::Usd);
    order.quantity = 2000;
    order.set_quoted_sub_total(money(dec!(10000.00)));
    order.pricing.shipping_fee = Some(money(dec!(200.00)));
    order.pricing.tax_percentage = Some(dec!(8));
    order.first_payment = PaymentMilestone::with_percentage(dec!(40));
    order.first_payment.payment.payment_type = PaymentType::Card;
    order.final_payment.payment.payment_type = PaymentType::Card;
    order
}
