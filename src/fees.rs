//! Per-currency card fee schedules.
//!
//! Engines receive a [`FeeScheduleLookup`] instead of reading configuration
//! themselves, so tests can inject fixed schedules.

use std::collections::HashMap;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::{AppConfig, AppConfigError};
use crate::errors::PricingError;
use crate::models::Currency;
use crate::money::Money;

/// Card fee terms of one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub transaction_fee_rate: Decimal,
    pub additional_fee: Money,
    pub smallest_unit_factor: i64,
}

impl FeeSchedule {
    pub fn new(transaction_fee_rate: Decimal, additional_fee: Money) -> Self {
        Self {
            transaction_fee_rate,
            additional_fee,
            smallest_unit_factor: 100,
        }
    }

    pub fn with_smallest_unit_factor(mut self, factor: i64) -> Self {
        self.smallest_unit_factor = factor;
        self
    }

    /// `amount × rate + fixed fee`
    pub fn card_fee(&self, amount: Money) -> Money {
        amount.multiply_by_rate(self.transaction_fee_rate) + self.additional_fee
    }
}

/// Source of fee schedules, queried once per pricing pass.
pub trait FeeScheduleLookup: Send + Sync {
    fn lookup(&self, currency: Currency) -> Option<FeeSchedule>;

    /// Like [`lookup`](Self::lookup), but a missing schedule is an error.
    fn require(&self, currency: Currency) -> Result<FeeSchedule, PricingError> {
        self.lookup(currency).ok_or_else(|| {
            warn!(%currency, "no fee schedule configured");
            PricingError::UnconfiguredCurrency(currency)
        })
    }
}

/// Fixed in-memory schedules, usually built from [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct StaticFeeSchedules {
    schedules: HashMap<Currency, FeeSchedule>,
}

impl StaticFeeSchedules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(mut self, currency: Currency, schedule: FeeSchedule) -> Self {
        self.insert(currency, schedule);
        self
    }

    pub fn insert(&mut self, currency: Currency, schedule: FeeSchedule) {
        self.schedules.insert(currency, schedule);
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppConfigError> {
        let mut schedules = Self::new();
        for (currency, entry) in config.parsed_fee_schedules()? {
            if entry.smallest_unit_factor < 1 {
                return Err(AppConfigError::InvalidFeeSchedule(format!(
                    "smallest_unit_factor for {} must be positive",
                    currency
                )));
            }
            schedules.insert(
                currency,
                FeeSchedule::new(entry.transaction_fee_rate, Money::new(entry.additional_fee))
                    .with_smallest_unit_factor(entry.smallest_unit_factor),
            );
        }
        debug!(count = schedules.len(), "fee schedules loaded");
        Ok(schedules)
    }
}

impl FeeScheduleLookup for StaticFeeSchedules {
    fn lookup(&self, currency: Currency) -> Option<FeeSchedule> {
        self.schedules.get(&currency).copied()
    }
}

/// Memoizes another lookup so repeated pricing passes stay in-process reads.
///
/// Only hits are cached; a currency configured later is picked up on the next
/// call.
pub struct CachedFeeSchedules<L> {
    inner: L,
    cache: DashMap<Currency, FeeSchedule>,
}

impl<L: FeeScheduleLookup> CachedFeeSchedules<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn invalidate(&self, currency: Currency) {
        self.cache.remove(&currency);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<L: FeeScheduleLookup> FeeScheduleLookup for CachedFeeSchedules<L> {
    fn lookup(&self, currency: Currency) -> Option<FeeSchedule> {
        if let Some(hit) = self.cache.get(&currency) {
            return Some(*hit);
        }
        let schedule = self.inner.lookup(currency)?;
        self.cache.insert(currency, schedule);
        Some(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn usd() -> FeeSchedule {
        FeeSchedule::new(dec!(0.029), Money::new(dec!(0.30)))
    }

    #[test]
    fn card_fee_is_rate_plus_fixed() {
        assert_eq!(usd().card_fee(Money::new(dec!(4000))), Money::new(dec!(116.30)));
        assert_eq!(usd().card_fee(Money::ZERO), Money::new(dec!(0.30)));
    }

    #[test]
    fn missing_currency_is_an_error() {
        let schedules = StaticFeeSchedules::new().with_schedule(Currency::Usd, usd());
        assert_eq!(schedules.require(Currency::Usd).unwrap(), usd());
        assert_matches!(
            schedules.require(Currency::Sgd),
            Err(PricingError::UnconfiguredCurrency(Currency::Sgd))
        );
    }

    struct CountingLookup {
        calls: AtomicUsize,
    }

    impl FeeScheduleLookup for CountingLookup {
        fn lookup(&self, currency: Currency) -> Option<FeeSchedule> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (currency == Currency::Usd).then(usd)
        }
    }

    #[test]
    fn cache_serves_repeated_hits() {
        let cached = CachedFeeSchedules::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });

        for _ in 0..3 {
            assert_eq!(cached.lookup(Currency::Usd), Some(usd()));
        }
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        assert_eq!(cached.lookup(Currency::Eur), None);
        assert_eq!(cached.lookup(Currency::Eur), None);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 3);

        cached.invalidate(Currency::Usd);
        cached.lookup(Currency::Usd);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn builds_from_config() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "fee_schedules": {
                "usd": { "transaction_fee_rate": "0.029", "additional_fee": "0.30" },
                "VND": { "transaction_fee_rate": "0.032", "additional_fee": "2000", "smallest_unit_factor": 1 }
            }
        }))
        .unwrap();

        let schedules = StaticFeeSchedules::from_config(&config).unwrap();
        assert_eq!(schedules.len(), 2);
        assert_eq!(schedules.lookup(Currency::Usd), Some(usd()));
        assert_eq!(
            schedules.lookup(Currency::Vnd).map(|s| s.smallest_unit_factor),
            Some(1)
        );
    }
}
