//! Pluggable price models
//!
//! The feed only consumes `next_price`; models are free to compute in f64
//! internally, the feed rounds to the symbol's price precision before
//! anything is published.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Seconds in a year for annualized drift/volatility scaling
const SECONDS_PER_YEAR: f64 = 3.156e7;

/// Prices never fall below one cent
fn floor_price(value: Decimal) -> Decimal {
    let floor = Decimal::new(1, 2);
    if value < floor { floor } else { value }
}

pub trait PriceModel: Send {
    fn next_price(&mut self, current: Decimal) -> Decimal;
}

/// Geometric Brownian Motion:
/// `S_{t+dt} = S_t * exp((mu - sigma^2 / 2) * dt + sigma * sqrt(dt) * Z)`
/// with annualized `mu`/`sigma` and `dt` in years.
pub struct GbmModel {
    drift: f64,
    volatility: f64,
    dt: f64,
    rng: ChaCha8Rng,
}

impl GbmModel {
    pub fn new(drift: f64, volatility: f64, tick_interval_secs: f64, seed: Option<u64>) -> Self {
        Self {
            drift,
            volatility,
            dt: tick_interval_secs / SECONDS_PER_YEAR,
            rng: match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            },
        }
    }
}

impl PriceModel for GbmModel {
    fn next_price(&mut self, current: Decimal) -> Decimal {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        let drift_term = (self.drift - 0.5 * self.volatility * self.volatility) * self.dt;
        let shock = self.volatility * self.dt.sqrt() * z;
        let multiplier = (drift_term + shock).exp();

        let current_f = current.to_f64().unwrap_or(0.0);
        let next = Decimal::from_f64(current_f * multiplier).unwrap_or(current);
        floor_price(next)
    }
}

/// Plain random walk: additive Gaussian step scaled by a volatility fraction
/// of the current price.
pub struct RandomWalkModel {
    volatility: f64,
    rng: ChaCha8Rng,
}

impl RandomWalkModel {
    pub fn new(volatility: f64, seed: Option<u64>) -> Self {
        Self {
            volatility,
            rng: match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            },
        }
    }
}

impl PriceModel for RandomWalkModel {
    fn next_price(&mut self, current: Decimal) -> Decimal {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        let change = current.to_f64().unwrap_or(0.0) * self.volatility * z;
        let next = current + Decimal::from_f64(change).unwrap_or(Decimal::ZERO);
        floor_price(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gbm_is_deterministic_under_seed() {
        let start = Decimal::from(50_000);
        let mut a = GbmModel::new(0.05, 0.2, 0.1, Some(42));
        let mut b = GbmModel::new(0.05, 0.2, 0.1, Some(42));
        for _ in 0..100 {
            let pa = a.next_price(start);
            let pb = b.next_price(start);
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn gbm_stays_positive() {
        let mut model = GbmModel::new(0.0, 0.8, 1.0, Some(7));
        let mut price = Decimal::from(50_000);
        for _ in 0..1_000 {
            price = model.next_price(price);
            assert!(price > Decimal::ZERO);
        }
    }

    #[test]
    fn gbm_step_size_is_small_at_short_dt() {
        // At dt of 100ms and 20% annualized vol, one step moves a few bps
        let mut model = GbmModel::new(0.0, 0.2, 0.1, Some(1));
        let start = Decimal::from(50_000);
        for _ in 0..100 {
            let next = model.next_price(start);
            let rel = ((next - start) / start).abs();
            assert!(rel < Decimal::new(1, 2), "single step moved more than 1%");
        }
    }

    #[test]
    fn random_walk_floors_at_one_cent() {
        let mut model = RandomWalkModel::new(10.0, Some(3));
        let mut price = Decimal::new(2, 2);
        for _ in 0..100 {
            price = model.next_price(price);
            assert!(price >= Decimal::new(1, 2));
        }
    }
}
