//! Milestone ladder of a bulk order.
//!
//! The pass reads the order snapshot and returns a [`BulkPricing`]; nothing is
//! written until [`BulkPricing::apply_to`] is called, so a failed pass never
//! leaves a half-priced order behind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use validator::Validate;

use crate::errors::PricingError;
use crate::fees::{FeeSchedule, FeeScheduleLookup};
use crate::models::bulk_purchase_order::clamped_percentage;
use crate::models::{AdditionalItem, BulkPurchaseOrder, Milestone, PaymentType};
use crate::money::{Money, OptionalMoney};

/// Computed amounts of one milestone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MilestoneAmounts {
    pub sub_total: Money,
    pub tax: Money,
    pub transaction_fee: Money,
    pub total: Money,
}

/// Result of a bulk pricing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPricing {
    /// Goods sub-total the additional items were added to
    pub base_sub_total: Money,
    /// Recomputed `unit_price × quantity` of every additional item, in order
    pub additional_item_totals: Vec<Money>,
    pub additional_items_total: Money,
    pub sub_total: Money,
    pub sub_total_after_deduction: Money,
    pub shipping_fee: Option<Money>,
    pub first_payment: MilestoneAmounts,
    pub final_payment: MilestoneAmounts,
    pub final_payment_deduction_amount: Money,
    pub transaction_fee: Money,
    pub tax: Money,
    pub total_price: Money,
}

impl BulkPricing {
    /// Overwrites every derived field of `order`.
    ///
    /// The items total is recorded so the next pass can take it back out of
    /// `pricing.sub_total` instead of adding the items twice.
    pub fn apply_to(&self, order: &mut BulkPurchaseOrder) {
        order.additional_items_total = Some(self.additional_items_total);
        for (item, total) in order
            .additional_items
            .iter_mut()
            .zip(&self.additional_item_totals)
        {
            item.total_price = Some(*total);
        }

        order.pricing.sub_total = Some(self.sub_total);
        order.pricing.sub_total_after_deduction = Some(self.sub_total_after_deduction);
        order.pricing.shipping_fee = self.shipping_fee;
        order.pricing.transaction_fee = Some(self.transaction_fee);
        order.pricing.tax = Some(self.tax);
        order.pricing.total_price = Some(self.total_price);

        let first = &mut order.first_payment;
        first.sub_total = Some(self.first_payment.sub_total);
        first.tax = Some(self.first_payment.tax);
        first.transaction_fee = Some(self.first_payment.transaction_fee);
        first.total = Some(self.first_payment.total);

        let last = &mut order.final_payment;
        last.sub_total = Some(self.final_payment.sub_total);
        last.tax = Some(self.final_payment.tax);
        last.transaction_fee = Some(self.final_payment.transaction_fee);
        last.total = Some(self.final_payment.total);

        order.final_payment_deduction_amount = Some(self.final_payment_deduction_amount);
    }
}

fn card_fee(schedule: &FeeSchedule, payment_type: PaymentType, amount: Money) -> Money {
    if payment_type.is_bank_transfer() {
        Money::ZERO
    } else {
        schedule.card_fee(amount)
    }
}

/// Recomputes the full milestone ladder of `order`.
#[instrument(skip_all, fields(order_id = %order.id, currency = %order.currency))]
pub fn compute_bulk_pricing(
    order: &BulkPurchaseOrder,
    fees: &dyn FeeScheduleLookup,
) -> Result<BulkPricing, PricingError> {
    let schedule = fees.require(order.currency)?;

    for item in &order.additional_items {
        item.validate()?;
    }

    let base_sub_total = order.base_sub_total();
    let additional_item_totals = order
        .additional_items
        .iter()
        .map(AdditionalItem::computed_total)
        .collect::<Result<Vec<_>, _>>()?;
    let overflow = || PricingError::InvalidInput("bulk sub-total overflows".into());
    let additional_items_total = additional_item_totals
        .iter()
        .try_fold(Money::ZERO, |acc, total| acc.checked_add(*total))
        .ok_or_else(overflow)?;
    let sub_total = base_sub_total
        .checked_add(additional_items_total)
        .ok_or_else(overflow)?;

    // an attached invoice replaces the goods value, shipping and final tax basis
    let (sub_total_after_deduction, shipping_fee, final_tax_percentage) =
        match &order.commercial_invoice {
            Some(invoice) => (
                invoice.effective_sub_total(),
                invoice.shipping_fee,
                invoice.tax_percentage,
            ),
            None => (
                sub_total,
                order.pricing.shipping_fee,
                order.pricing.tax_percentage,
            ),
        };
    let shipping = shipping_fee.or_zero();

    let first_percentage =
        clamped_percentage(order.first_payment.percentage, Milestone::FirstPayment);
    let first_sub_total = sub_total.apply_percentage(first_percentage);
    let first_fee = card_fee(
        &schedule,
        order.first_payment.payment.payment_type,
        first_sub_total,
    );
    let first_tax = order.first_payment.tax.or_zero();
    let first_payment = MilestoneAmounts {
        sub_total: first_sub_total,
        tax: first_tax,
        transaction_fee: first_fee,
        total: first_sub_total + first_fee + first_tax,
    };

    let deposit_paid = order.deposit.paid_amount.or_zero();
    let final_sub_total = sub_total_after_deduction
        - deposit_paid
        - first_sub_total
        - order.second_payment.sub_total.or_zero();
    let final_payment_deduction_amount = sub_total - sub_total_after_deduction;
    let final_fee = card_fee(
        &schedule,
        order.final_payment.payment.payment_type,
        final_sub_total + shipping,
    );
    let final_tax = (sub_total_after_deduction + shipping)
        .apply_percentage(final_tax_percentage.unwrap_or(Decimal::ZERO))
        - first_tax;
    let final_payment = MilestoneAmounts {
        sub_total: final_sub_total,
        tax: final_tax,
        transaction_fee: final_fee,
        total: final_tax + final_fee + shipping + final_sub_total
            - order.sample_deduction_amount.or_zero(),
    };

    let total_price = first_payment.total + final_payment.total + deposit_paid;

    debug!(
        %sub_total,
        %sub_total_after_deduction,
        first_total = %first_payment.total,
        final_total = %final_payment.total,
        %deposit_paid,
        %total_price,
        "bulk milestone ladder computed"
    );

    Ok(BulkPricing {
        base_sub_total,
        additional_item_totals,
        additional_items_total,
        sub_total,
        sub_total_after_deduction,
        shipping_fee,
        first_payment,
        final_payment,
        final_payment_deduction_amount,
        transaction_fee: first_fee + final_fee,
        tax: first_tax + final_tax,
        total_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::StaticFeeSchedules;
    use crate::models::{AdditionalItem, Currency, PaymentMilestone};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    fn fees() -> StaticFeeSchedules {
        StaticFeeSchedules::new().with_schedule(
            Currency::Usd,
            FeeSchedule::new(dec!(0.029), Money::new(dec!(0.30))),
        )
    }

    fn bank_order(sub_total: Decimal) -> BulkPurchaseOrder {
        let mut order = BulkPurchaseOrder::new(Currency::Usd);
        order.pricing.sub_total = Some(Money::new(sub_total));
        order.first_payment = PaymentMilestone::with_percentage(dec!(30));
        order
    }

    #[test]
    fn bank_transfer_milestones_carry_no_fee() {
        let pricing = compute_bulk_pricing(&bank_order(dec!(1000)), &fees()).unwrap();
        assert_eq!(pricing.first_payment.transaction_fee, Money::ZERO);
        assert_eq!(pricing.final_payment.transaction_fee, Money::ZERO);
        assert_eq!(pricing.first_payment.total, Money::new(dec!(300)));
        assert_eq!(pricing.final_payment.total, Money::new(dec!(700)));
        assert_eq!(pricing.total_price, Money::new(dec!(1000)));
    }

    #[test]
    fn first_payment_tax_moves_out_of_final_tax() {
        let mut order = bank_order(dec!(1000));
        order.pricing.tax_percentage = Some(dec!(10));
        order.first_payment.tax = Some(Money::new(dec!(30)));
        let pricing = compute_bulk_pricing(&order, &fees()).unwrap();
        assert_eq!(pricing.first_payment.total, Money::new(dec!(330)));
        assert_eq!(pricing.final_payment.tax, Money::new(dec!(70)));
        assert_eq!(pricing.tax, Money::new(dec!(100)));
        assert_eq!(pricing.total_price, Money::new(dec!(1100)));
    }

    #[test]
    fn additional_items_raise_both_sub_totals() {
        let mut order = bank_order(dec!(1000));
        order.additional_items = vec![
            AdditionalItem::new("Woven labels", 100, Money::new(dec!(0.50))),
            AdditionalItem::new("Express packing", 1, Money::new(dec!(25))),
        ];
        let pricing = compute_bulk_pricing(&order, &fees()).unwrap();
        assert_eq!(pricing.additional_item_totals, vec![Money::new(dec!(50)), Money::new(dec!(25))]);
        assert_eq!(pricing.sub_total, Money::new(dec!(1075)));
        assert_eq!(pricing.sub_total_after_deduction, Money::new(dec!(1075)));
        assert_eq!(pricing.final_payment_deduction_amount, Money::ZERO);
    }

    #[test]
    fn invalid_additional_item_aborts_pass() {
        let mut order = bank_order(dec!(1000));
        order.additional_items = vec![AdditionalItem::new("Labels", -1, Money::new(dec!(1)))];
        assert_matches!(
            compute_bulk_pricing(&order, &fees()),
            Err(PricingError::ValidationError(_))
        );
    }

    #[test]
    fn sample_deduction_reduces_final_payment() {
        let mut order = bank_order(dec!(1000));
        order.sample_deduction_amount = Some(Money::new(dec!(45)));
        let pricing = compute_bulk_pricing(&order, &fees()).unwrap();
        assert_eq!(pricing.final_payment.total, Money::new(dec!(655)));
        assert_eq!(
            pricing.total_price,
            pricing.first_payment.total + pricing.final_payment.total
        );
    }

    #[test]
    fn scheduled_second_payment_comes_out_of_final() {
        let mut order = bank_order(dec!(1000));
        order.second_payment.sub_total = Some(Money::new(dec!(200)));
        let pricing = compute_bulk_pricing(&order, &fees()).unwrap();
        assert_eq!(pricing.final_payment.sub_total, Money::new(dec!(500)));
    }

    #[test]
    fn out_of_range_first_percentage_is_logged_by_the_pass_only() {
        let mut order = bank_order(dec!(1000));
        order.first_payment.percentage = Some(dec!(150));

        let logs = with_captured_logs(|| {
            let pricing = compute_bulk_pricing(&order, &fees()).unwrap();
            assert_eq!(pricing.first_payment.sub_total, Money::ZERO);
            assert_eq!(pricing.final_payment.sub_total, Money::new(dec!(1000)));
        });
        assert!(logs.contains("payment percentage out of range"), "{logs}");
        assert!(logs.contains("first_payment"), "{logs}");

        let logs = with_captured_logs(|| {
            assert_eq!(order.first_payment_amount(), Money::ZERO);
            assert_eq!(order.final_payment_percentage(), Decimal::ONE_HUNDRED);
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn in_range_percentage_logs_nothing() {
        let logs = with_captured_logs(|| {
            compute_bulk_pricing(&bank_order(dec!(1000)), &fees()).unwrap();
        });
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn apply_to_keeps_base_for_next_pass() {
        let mut order = bank_order(dec!(1000));
        order
            .additional_items
            .push(AdditionalItem::new("Hang tags", 10, Money::new(dec!(2))));

        let first = compute_bulk_pricing(&order, &fees()).unwrap();
        first.apply_to(&mut order);
        assert_eq!(order.additional_items_total, Some(Money::new(dec!(20))));
        assert_eq!(order.base_sub_total(), Money::new(dec!(1000)));
        assert_eq!(order.pricing.sub_total, Some(Money::new(dec!(1020))));
        assert_eq!(order.additional_items[0].total_price, Some(Money::new(dec!(20))));

        let second = compute_bulk_pricing(&order, &fees()).unwrap();
        assert_eq!(first, second);
    }
}
