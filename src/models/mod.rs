// Order aggregates
pub mod bulk_purchase_order;
pub mod purchase_order;

// Priced components
pub mod additional_item;
pub mod commercial_invoice;
pub mod pricing;
pub mod quotation;

// Shared value types
pub mod currency;
pub mod payment;

pub use additional_item::AdditionalItem;
pub use bulk_purchase_order::{BulkPurchaseOrder, DepositMilestone, PaymentMilestone};
pub use commercial_invoice::{CommercialInvoice, CommercialInvoiceItem, InvoiceStatus};
pub use currency::Currency;
pub use payment::{Milestone, MilestonePayment, PaymentType};
pub use pricing::Pricing;
pub use purchase_order::PurchaseOrder;
pub use quotation::{select_quoted_tier, QuotationItem, QuotationType};
