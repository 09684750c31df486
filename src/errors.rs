use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Currency, Milestone};
use crate::money::Money;

/// Machine-readable error body, used by the CLI's `--json` output and by
/// callers that forward pricing failures to their own API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The order or request itself is wrong
    InvalidRequestError,
    /// Needs a configuration fix, retrying will not help
    ConfigurationError,
    /// General failure
    ApiError,
}

impl From<&PricingError> for ErrorResponse {
    fn from(error: &PricingError) -> Self {
        let error_type = match error {
            PricingError::UnconfiguredCurrency(_) => ErrorType::ConfigurationError,
            PricingError::SerializationError(_) => ErrorType::ApiError,
            _ => ErrorType::InvalidRequestError,
        };
        let param = match error {
            PricingError::UnconfiguredCurrency(_) | PricingError::CurrencyMismatch { .. } => {
                Some("currency".to_string())
            }
            PricingError::InvalidDepositAmount(_) => Some("amount".to_string()),
            PricingError::MissingTransactionReference(_) => Some("transaction_ref_id".to_string()),
            _ => None,
        };

        Self {
            error: ErrorDetails {
                error_type,
                code: error.code().to_string(),
                message: error.to_string(),
                param,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("No fee schedule configured for currency {0}")]
    UnconfiguredCurrency(Currency),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("Deposit already paid for order {0}")]
    DepositAlreadyPaid(Uuid),

    #[error("Invalid deposit amount: {0}")]
    InvalidDepositAmount(Money),

    #[error("Missing transaction reference for {0}")]
    MissingTransactionReference(Milestone),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<validator::ValidationErrors> for PricingError {
    fn from(err: validator::ValidationErrors) -> Self {
        PricingError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

impl PricingError {
    /// Stable snake_case code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnconfiguredCurrency(_) => "unconfigured_currency",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::CurrencyMismatch { .. } => "currency_mismatch",
            Self::DepositAlreadyPaid(_) => "deposit_already_paid",
            Self::InvalidDepositAmount(_) => "invalid_deposit_amount",
            Self::MissingTransactionReference(_) => "missing_transaction_reference",
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// Configuration errors require a config fix; everything else is caused
    /// by the order or request being priced.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::UnconfiguredCurrency(_))
    }
}
