// Pricing engines
pub mod bulk_pricing;
pub mod sample_pricing;

// Services over the engines
pub mod checkout;
pub mod pricing;

pub use bulk_pricing::{compute_bulk_pricing, BulkPricing, MilestoneAmounts};
pub use checkout::{CheckoutLine, CheckoutService, CheckoutSummary, OrderKind};
pub use pricing::{DepositQuote, PricingService};
pub use sample_pricing::{compute_sample_pricing, SamplePricing};
