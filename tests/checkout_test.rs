//! Integration tests for combining orders into one checkout.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{card_bulk_order, checkout_service, money, sample_order};
use rust_decimal_macros::dec;
use sourcing_pricing::{
    models::{BulkPurchaseOrder, Currency, Milestone, PaymentType, PurchaseOrder},
    services::OrderKind,
    PricingError,
};

#[test]
fn sample_and_first_milestone_are_due_together() {
    let sample = sample_order(dec!(100), dec!(20), PaymentType::Card);
    let bulk = card_bulk_order();

    let summary = checkout_service()
        .summarize(Currency::Usd, &[sample.clone()], &[bulk.clone()])
        .unwrap();

    assert_eq!(summary.lines.len(), 2);
    assert_eq!(summary.lines[0].kind, OrderKind::Sample);
    assert_eq!(summary.lines[0].order_id, sample.id);
    assert_eq!(summary.lines[0].amount, money(dec!(123.78)));
    assert_eq!(summary.lines[1].kind, OrderKind::Bulk);
    assert_eq!(summary.lines[1].milestone, Some(Milestone::FirstPayment));
    assert_eq!(summary.lines[1].amount, money(dec!(4116.30)));

    assert_eq!(summary.amount_due, money(dec!(4240.08)));
    assert_eq!(summary.amount_due_minor_units, 424_008);
    assert_eq!(summary.pricing.sub_total, Some(money(dec!(10100))));
    assert_eq!(summary.pricing.shipping_fee, Some(money(dec!(220))));
    assert_eq!(summary.pricing.total_price, Some(money(dec!(11436.18))));
}

#[test]
fn paid_first_payment_moves_to_final() {
    let mut bulk = card_bulk_order();
    bulk.first_payment.payment.payment_intent_id = Some("pi_first".into());

    let summary = checkout_service()
        .summarize(Currency::Usd, &[], &[bulk])
        .unwrap();
    assert_eq!(summary.lines[0].milestone, Some(Milestone::FinalPayment));
    assert_eq!(summary.amount_due, money(dec!(7196.10)));
}

#[test]
fn card_second_payment_needs_a_priced_total() {
    let mut bulk = card_bulk_order();
    bulk.first_payment.payment.payment_intent_id = Some("pi_first".into());
    bulk.second_payment.sub_total = Some(money(dec!(1500)));
    bulk.second_payment.payment.payment_type = PaymentType::Card;

    assert_matches!(
        checkout_service().summarize(Currency::Usd, &[], &[bulk.clone()]),
        Err(PricingError::InvalidOperation(message)) if message.contains("second payment")
    );

    bulk.second_payment.total = Some(money(dec!(1543.80)));
    let summary = checkout_service()
        .summarize(Currency::Usd, &[], &[bulk.clone()])
        .unwrap();
    assert_eq!(summary.lines[0].milestone, Some(Milestone::SecondPayment));
    assert_eq!(summary.amount_due, money(dec!(1543.80)));

    bulk.second_payment.total = None;
    bulk.second_payment.payment.payment_type = PaymentType::BankTransfer;
    let summary = checkout_service()
        .summarize(Currency::Usd, &[], &[bulk])
        .unwrap();
    assert_eq!(summary.amount_due, money(dec!(1500)));
}

#[test]
fn fully_paid_bulk_order_is_rejected() {
    let mut bulk = card_bulk_order();
    let now = Utc::now();
    for milestone in [Milestone::FirstPayment, Milestone::FinalPayment] {
        bulk.milestone_payment_mut(milestone)
            .record_bank_transfer(milestone, "TRX-PAID", now)
            .unwrap();
    }

    assert_matches!(
        checkout_service().summarize(Currency::Usd, &[], &[bulk]),
        Err(PricingError::InvalidOperation(_))
    );
}

#[test]
fn mixed_currencies_are_rejected() {
    let usd = sample_order(dec!(50), dec!(5), PaymentType::Card);
    let mut vnd = PurchaseOrder::new(Currency::Vnd);
    vnd.pricing.sub_total = Some(money(dec!(1000000)));

    assert_matches!(
        checkout_service().summarize(Currency::Usd, &[usd, vnd], &[]),
        Err(PricingError::CurrencyMismatch {
            expected: Currency::Usd,
            found: Currency::Vnd,
        })
    );
}

#[test]
fn empty_checkout_is_invalid() {
    let bulks: [BulkPurchaseOrder; 0] = [];
    assert_matches!(
        checkout_service().summarize(Currency::Usd, &[], &bulks),
        Err(PricingError::InvalidInput(_))
    );
}

#[test]
fn vnd_amount_due_in_whole_units() {
    let mut sample = PurchaseOrder::new(Currency::Vnd);
    sample.pricing.sub_total = Some(money(dec!(999999.6)));
    sample.payment.payment_type = PaymentType::BankTransfer;

    let summary = checkout_service()
        .summarize(Currency::Vnd, &[sample], &[])
        .unwrap();
    assert_eq!(summary.amount_due_minor_units, 1_000_000);
}
