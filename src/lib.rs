//! Sourcing pricing library
//!
//! Pricing and payment-milestone computation for the sample (purchase) and
//! bulk (production) orders of an apparel-sourcing marketplace.
//!
//! The engines in [`services`] are pure functions of an order snapshot and an
//! injected [`FeeScheduleLookup`]; persisting the recomputed fields is left to
//! the caller.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod fees;
pub mod models;
pub mod money;
pub mod services;

pub use errors::PricingError;
pub use fees::{CachedFeeSchedules, FeeSchedule, FeeScheduleLookup, StaticFeeSchedules};
pub use money::{Money, OptionalMoney, MONEY_SCALE};
