use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::additional_item::AdditionalItem;
use super::commercial_invoice::CommercialInvoice;
use super::currency::Currency;
use super::payment::{Milestone, MilestonePayment};
use super::pricing::Pricing;
use super::quotation::{select_quoted_tier, QuotationItem, QuotationType};
use crate::errors::PricingError;
use crate::money::{Money, OptionalMoney};

/// One scheduled payment of a bulk order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMilestone {
    /// Share of the sub-total, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
    #[serde(default)]
    pub payment: MilestonePayment,
}

impl PaymentMilestone {
    pub fn with_percentage(percentage: Decimal) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }
}

/// Cash collected before production, outside the milestone ladder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositMilestone {
    /// Amount requested from the buyer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    /// Amount actually received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub payment: MilestonePayment,
}

impl DepositMilestone {
    pub fn is_paid(&self) -> bool {
        self.paid_amount.is_some_and(Money::is_positive)
    }
}

/// Production order paid in milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPurchaseOrder {
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
    pub additional_items: Vec<AdditionalItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_invoice: Option<CommercialInvoice>,
    /// Sum of the additional item totals the last pricing pass added to
    /// `pricing.sub_total`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_items_total: Option<Money>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub deposit: DepositMilestone,
    #[serde(default)]
    pub first_payment: PaymentMilestone,
    #[serde(default)]
    pub second_payment: PaymentMilestone,
    #[serde(default)]
    pub final_payment: PaymentMilestone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_payment_deduction_amount: Option<Money>,
    /// Sample charges credited back on the final payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_deduction_amount: Option<Money>,
}

/// Percentage used for a split, or zero when outside `(0, 100]`.
pub fn effective_percentage(percentage: Option<Decimal>) -> Decimal {
    match percentage {
        Some(pct) if pct > Decimal::ZERO && pct <= Decimal::ONE_HUNDRED => pct,
        _ => Decimal::ZERO,
    }
}

/// [`effective_percentage`] for a pricing pass; a non-zero value that gets
/// clamped is logged.
pub(crate) fn clamped_percentage(percentage: Option<Decimal>, milestone: Milestone) -> Decimal {
    let effective = effective_percentage(percentage);
    if let Some(pct) = percentage.filter(|pct| !pct.is_zero() && effective.is_zero()) {
        warn!(%milestone, percentage = %pct, "payment percentage out of range, using 0");
    }
    effective
}

impl BulkPurchaseOrder {
    pub fn new(currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference_id: None,
            currency,
            quantity: 0,
            quotations: Vec::new(),
            additional_items: Vec::new(),
            commercial_invoice: None,
            additional_items_total: None,
            pricing: Pricing::default(),
            deposit: DepositMilestone::default(),
            first_payment: PaymentMilestone::default(),
            second_payment: PaymentMilestone::default(),
            final_payment: PaymentMilestone::default(),
            final_payment_deduction_amount: None,
            sample_deduction_amount: None,
        }
    }

    /// Sets the quoted goods value, keeping the additional items already
    /// counted in `pricing.sub_total`.
    pub fn set_quoted_sub_total(&mut self, sub_total: Money) {
        self.pricing.sub_total = Some(sub_total.add_opt(self.additional_items_total));
    }

    /// Goods value before additional items: `pricing.sub_total` less what the
    /// last pass added for them. Edits to `pricing.sub_total` carry through.
    pub fn base_sub_total(&self) -> Money {
        self.pricing.sub_total.or_zero().sub_opt(self.additional_items_total)
    }

    fn quoted_tier(&self) -> Option<&QuotationItem> {
        select_quoted_tier(&self.quotations, QuotationType::Bulk, self.quantity)
    }

    pub fn quoted_price(&self) -> Option<Money> {
        self.quoted_tier().map(|tier| tier.price)
    }

    pub fn quotation_lead_time(&self) -> Option<i64> {
        self.quoted_tier().and_then(|tier| tier.lead_time_days)
    }

    /// Goods sub-total the milestone split is taken from.
    pub fn goods_sub_total(&self) -> Money {
        self.pricing.sub_total.or_zero()
    }

    pub fn first_payment_amount(&self) -> Money {
        let pct = effective_percentage(self.first_payment.percentage);
        self.goods_sub_total().apply_percentage(pct)
    }

    pub fn scheduled_second_payment_amount(&self) -> Money {
        self.second_payment.sub_total.or_zero()
    }

    /// Whatever the first and second percentages leave for the final payment.
    pub fn final_payment_percentage(&self) -> Decimal {
        let first = effective_percentage(self.first_payment.percentage);
        let second = effective_percentage(self.second_payment.percentage);
        Decimal::ONE_HUNDRED - first - second
    }

    pub fn invoice_sub_total(&self) -> Option<Money> {
        self.commercial_invoice
            .as_ref()
            .map(CommercialInvoice::effective_sub_total)
    }

    pub fn final_payment_amount(&self) -> Money {
        (self.pricing.total_price.or_zero() - self.first_payment.total.or_zero()).abs()
    }

    pub fn balance_after_first_payment(&self) -> Money {
        self.pricing.total_price.or_zero() - self.first_payment.total.or_zero()
    }

    pub fn milestone_payment(&self, milestone: Milestone) -> &MilestonePayment {
        match milestone {
            Milestone::Deposit => &self.deposit.payment,
            Milestone::FirstPayment => &self.first_payment.payment,
            Milestone::SecondPayment => &self.second_payment.payment,
            Milestone::FinalPayment => &self.final_payment.payment,
        }
    }

    pub fn milestone_payment_mut(&mut self, milestone: Milestone) -> &mut MilestonePayment {
        match milestone {
            Milestone::Deposit => &mut self.deposit.payment,
            Milestone::FirstPayment => &mut self.first_payment.payment,
            Milestone::SecondPayment => &mut self.second_payment.payment,
            Milestone::FinalPayment => &mut self.final_payment.payment,
        }
    }

    pub fn is_milestone_paid(&self, milestone: Milestone) -> bool {
        self.milestone_payment(milestone).is_paid()
    }

    /// Amount charged for a milestone, fees and tax included.
    ///
    /// The second payment is not priced by the ladder; without an explicit
    /// `total` its scheduled `sub_total` is returned as is.
    pub fn milestone_total(&self, milestone: Milestone) -> Option<Money> {
        match milestone {
            Milestone::Deposit => self
                .deposit
                .amount
                .map(|amount| amount.add_opt(self.deposit.transaction_fee)),
            Milestone::FirstPayment => self.first_payment.total,
            Milestone::SecondPayment => self.second_payment.total.or(self.second_payment.sub_total),
            Milestone::FinalPayment => self.final_payment.total,
        }
    }

    /// The next milestone the buyer owes, walking first, second (only when
    /// scheduled) then final.
    pub fn next_payable_milestone(&self) -> Option<Milestone> {
        if !self.is_milestone_paid(Milestone::FirstPayment) {
            return Some(Milestone::FirstPayment);
        }
        let second_scheduled = !self.second_payment.sub_total.is_zero_or_absent();
        if second_scheduled && !self.is_milestone_paid(Milestone::SecondPayment) {
            return Some(Milestone::SecondPayment);
        }
        if !self.is_milestone_paid(Milestone::FinalPayment) {
            return Some(Milestone::FinalPayment);
        }
        None
    }

    /// Records a deposit received by bank transfer.
    ///
    /// The order must be re-priced afterwards so the deposit flows into the
    /// final payment and the total.
    pub fn record_deposit_payment(
        &mut self,
        amount: Money,
        transaction_ref_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        if self.deposit.is_paid() {
            return Err(PricingError::DepositAlreadyPaid(self.id));
        }
        if !amount.is_positive() {
            return Err(PricingError::InvalidDepositAmount(amount));
        }
        self.deposit
            .payment
            .record_bank_transfer(Milestone::Deposit, transaction_ref_id, at)?;
        self.deposit.paid_amount = Some(amount);
        if self.deposit.amount.is_none() {
            self.deposit.amount = Some(amount);
        }
        Ok(())
    }
}
