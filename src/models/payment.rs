use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::PricingError;

/// Payment instrument chosen for an order or a milestone.
///
/// Card payments carry the currency's transaction fee; bank transfers never do.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    Card,
    #[default]
    BankTransfer,
}

impl PaymentType {
    pub fn is_bank_transfer(self) -> bool {
        matches!(self, PaymentType::BankTransfer)
    }
}

/// The separately tracked payments of a bulk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Milestone {
    Deposit,
    FirstPayment,
    SecondPayment,
    FinalPayment,
}

/// Settlement state of one payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestonePayment {
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Card payment intent created with the payment provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    /// Buyer supplied reference of a bank transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_unpaid_at: Option<DateTime<Utc>>,
}

impl MilestonePayment {
    pub fn with_payment_type(payment_type: PaymentType) -> Self {
        Self {
            payment_type,
            ..Self::default()
        }
    }

    /// Paid once the card intent exists, or once a bank transfer reference was
    /// submitted.
    pub fn is_paid(&self) -> bool {
        let has = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        has(&self.payment_intent_id)
            || (self.payment_type.is_bank_transfer() && has(&self.transaction_ref_id))
    }

    /// Records a buyer's bank transfer for `milestone`.
    pub fn record_bank_transfer(
        &mut self,
        milestone: Milestone,
        transaction_ref_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        let reference = transaction_ref_id.trim();
        if reference.is_empty() {
            return Err(PricingError::MissingTransactionReference(milestone));
        }
        self.payment_type = PaymentType::BankTransfer;
        self.transaction_ref_id = Some(reference.to_string());
        self.transferred_at = Some(at);
        Ok(())
    }

    /// Operator confirmation that the funds arrived.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.marked_paid_at = Some(at);
        self.marked_unpaid_at = None;
    }

    /// Operator rejection of a submitted payment.
    pub fn mark_unpaid(&mut self, at: DateTime<Utc>) {
        self.marked_unpaid_at = Some(at);
        self.marked_paid_at = None;
        self.transaction_ref_id = None;
    }
}
