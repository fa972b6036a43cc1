//! Exchange-rate lookup with an explicit time-to-live.
//!
//! The rate provider is injected as a [`RateSource`] and the cache is an
//! ordinary owned value. Like the date functions, every lookup takes the
//! current instant as an argument instead of reading the clock.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{EngineError, Result};

/// A provider of exchange rates.
pub trait RateSource {
    /// Units of `quote` per one unit of `base`. Codes arrive upper-cased.
    fn fetch_rate(&self, base: &str, quote: &str) -> Result<f64>;
}

/// A fixed table of rates, answering inverse pairs as well.
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<(String, String), f64>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, base: &str, quote: &str, rate: f64) -> Self {
        self.rates
            .insert((base.to_uppercase(), quote.to_uppercase()), rate);
        self
    }
}

impl RateSource for FixedRates {
    fn fetch_rate(&self, base: &str, quote: &str) -> Result<f64> {
        if let Some(rate) = self.rates.get(&(base.to_string(), quote.to_string())) {
            return Ok(*rate);
        }
        if let Some(rate) = self.rates.get(&(quote.to_string(), base.to_string())) {
            if *rate != 0.0 {
                return Ok(1.0 / rate);
            }
        }
        Err(EngineError::RateLookup(format!("no rate for {base}/{quote}")))
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    fetched_at: DateTime<Utc>,
}

/// Caches rates from a [`RateSource`] for `ttl`.
#[derive(Debug)]
pub struct RateCache<S> {
    source: S,
    ttl: Duration,
    entries: HashMap<(String, String), CachedRate>,
}

impl<S: RateSource> RateCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The rate from `base` to `quote` as of `now`.
    ///
    /// Same-currency pairs are 1.0 without a lookup. A cached rate younger
    /// than the TTL is reused; anything else is fetched and stored with
    /// `now` as its fetch time.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidRequest`] for a malformed currency code, and
    /// [`EngineError::RateLookup`] when the source fails or returns a rate
    /// that is not finite and positive.
    pub fn rate(&mut self, base: &str, quote: &str, now: DateTime<Utc>) -> Result<f64> {
        let base = currency_code(base)?;
        let quote = currency_code(quote)?;
        if base == quote {
            return Ok(1.0);
        }

        let key = (base, quote);
        if let Some(cached) = self.entries.get(&key) {
            if now - cached.fetched_at < self.ttl {
                debug!(base = %key.0, quote = %key.1, "rate cache hit");
                return Ok(cached.rate);
            }
        }

        debug!(base = %key.0, quote = %key.1, "rate cache miss");
        let rate = self.source.fetch_rate(&key.0, &key.1)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::RateLookup(format!(
                "source returned unusable rate {rate} for {}/{}",
                key.0, key.1
            )));
        }
        self.entries.insert(
            key,
            CachedRate {
                rate,
                fetched_at: now,
            },
        );
        Ok(rate)
    }

    /// Convert `amount` of `base` into `quote`.
    pub fn convert(
        &mut self,
        amount: f64,
        base: &str,
        quote: &str,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        Ok(amount * self.rate(base, quote, now)?)
    }

    /// Drop every cached rate.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Three ASCII letters, upper-cased.
fn currency_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(EngineError::InvalidRequest(format!(
            "invalid currency code: '{code}'"
        )));
    }
    Ok(code.to_ascii_uppercase())
}
