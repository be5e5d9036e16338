//! Price paths that drive external trading in a simulated market.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use range_vault_domain::math::tick_math::{MAX_TICK, MIN_TICK};

/// Base of the tick grid: price = 1.0001^tick.
const TICK_BASE: f64 = 1.0001;

pub trait PricePathGenerator {
    /// Returns the starting tick followed by `steps` further ticks.
    fn generate(&mut self, steps: usize) -> Vec<i32>;
}

/// Geometric Brownian motion of the pool price, expressed on the tick grid.
pub struct GeometricBrownianMotion {
    pub initial_tick: i32,
    pub drift: f64,      // annualized drift (mu)
    pub volatility: f64, // annualized volatility (sigma)
    pub time_step: f64,  // time step in years (dt) e.g. 1/365 for daily
    rng: StdRng,
}

impl GeometricBrownianMotion {
    pub fn new(initial_tick: i32, drift: f64, volatility: f64, time_step: f64, seed: u64) -> Self {
        Self {
            initial_tick,
            drift,
            volatility,
            time_step,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate(&mut self, steps: usize) -> Vec<i32> {
        let mut ticks = Vec::with_capacity(steps + 1);
        ticks.push(self.initial_tick);

        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();
        let ln_base = TICK_BASE.ln();

        // Work in log-price so the walk stays on the tick grid.
        let mut log_price = f64::from(self.initial_tick) * ln_base;
        for _ in 0..steps {
            let z: f64 = StandardNormal.sample(&mut self.rng);
            log_price += drift_term + vol_term * z;
            let tick = (log_price / ln_base).round();
            ticks.push(tick.clamp(f64::from(MIN_TICK), f64::from(MAX_TICK)) as i32);
        }

        ticks
    }
}

/// Replays a fixed list of ticks.
pub struct DeterministicPricePath {
    pub ticks: Vec<i32>,
}

impl PricePathGenerator for DeterministicPricePath {
    fn generate(&mut self, _steps: usize) -> Vec<i32> {
        self.ticks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbm_generation() {
        let mut gbm = GeometricBrownianMotion::new(0, 0.0, 0.8, 1.0 / 365.0, 42);
        let path = gbm.generate(10);

        assert_eq!(path.len(), 11); // initial + 10 steps
        assert_eq!(path[0], 0);
        assert!(path.iter().any(|tick| *tick != 0));
    }

    #[test]
    fn test_gbm_is_reproducible_from_seed() {
        let first = GeometricBrownianMotion::new(100, 0.0, 0.5, 0.01, 7).generate(20);
        let second = GeometricBrownianMotion::new(100, 0.0, 0.5, 0.01, 7).generate(20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_deterministic_path() {
        let mut path = DeterministicPricePath {
            ticks: vec![0, 60, -60],
        };
        assert_eq!(path.generate(5), vec![0, 60, -60]);
    }
}
