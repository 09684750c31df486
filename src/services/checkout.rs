use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, instrument};
use uuid::Uuid;

use super::pricing::PricingService;
use crate::errors::PricingError;
use crate::models::{BulkPurchaseOrder, Currency, Milestone, Pricing, PurchaseOrder};
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderKind {
    Sample,
    Bulk,
}

/// What one order contributes to a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub order_id: Uuid,
    pub kind: OrderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub currency: Currency,
    /// Field-wise sum of every order's recomputed pricing
    pub pricing: Pricing,
    pub amount_due: Money,
    pub amount_due_minor_units: i64,
    pub lines: Vec<CheckoutLine>,
}

/// Combines several orders of one currency into a single charge.
#[derive(Clone)]
pub struct CheckoutService {
    pricing: PricingService,
}

impl CheckoutService {
    pub fn new(pricing: PricingService) -> Self {
        Self { pricing }
    }

    /// Reprices every order and sums what is due now: the whole total of a
    /// sample order, the next unpaid milestone of a bulk order.
    #[instrument(skip_all, fields(currency = %currency, samples = samples.len(), bulks = bulks.len()))]
    pub fn summarize(
        &self,
        currency: Currency,
        samples: &[PurchaseOrder],
        bulks: &[BulkPurchaseOrder],
    ) -> Result<CheckoutSummary, PricingError> {
        if samples.is_empty() && bulks.is_empty() {
            return Err(PricingError::InvalidInput("checkout has no orders".into()));
        }
        let schedule = self.pricing.fees().require(currency)?;

        let mut pricing = Pricing::default();
        let mut lines = Vec::with_capacity(samples.len() + bulks.len());

        for order in samples {
            ensure_currency(currency, order.currency)?;
            if order.is_paid() {
                return Err(PricingError::InvalidOperation(format!(
                    "sample order {} is already paid",
                    order.id
                )));
            }
            let mut priced = order.clone();
            self.pricing.update_sample_prices(&mut priced)?;
            pricing = pricing.combined_with(&priced.pricing);
            lines.push(CheckoutLine {
                order_id: order.id,
                kind: OrderKind::Sample,
                milestone: None,
                amount: priced.pricing.total_price.unwrap_or(Money::ZERO),
            });
        }

        for order in bulks {
            ensure_currency(currency, order.currency)?;
            let mut priced = order.clone();
            self.pricing.update_bulk_prices(&mut priced)?;
            let milestone = priced.next_payable_milestone().ok_or_else(|| {
                PricingError::InvalidOperation(format!("bulk order {} is fully paid", order.id))
            })?;
            // the ladder never prices the second payment, so a card charge
            // needs a total that already carries fee and tax
            if milestone == Milestone::SecondPayment
                && !priced.second_payment.payment.payment_type.is_bank_transfer()
                && priced.second_payment.total.is_none()
            {
                return Err(PricingError::InvalidOperation(format!(
                    "second payment of bulk order {} is paid by card but has no total",
                    order.id
                )));
            }
            pricing = pricing.combined_with(&priced.pricing);
            lines.push(CheckoutLine {
                order_id: order.id,
                kind: OrderKind::Bulk,
                milestone: Some(milestone),
                amount: priced.milestone_total(milestone).unwrap_or(Money::ZERO),
            });
        }

        let amount_due: Money = lines.iter().map(|line| line.amount).sum();
        let amount_due_minor_units = amount_due
            .to_minor_units(schedule.smallest_unit_factor)
            .ok_or_else(|| {
                PricingError::InvalidInput(format!("{} overflows minor units", amount_due))
            })?;

        info!(%amount_due, lines = lines.len(), "checkout summarized");
        Ok(CheckoutSummary {
            currency,
            pricing,
            amount_due,
            amount_due_minor_units,
            lines,
        })
    }
}

fn ensure_currency(expected: Currency, found: Currency) -> Result<(), PricingError> {
    if expected == found {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch { expected, found })
    }
}
