//! Upper-confidence-bound exploration bonus.
//!
//! The bonus follows the classic UCB1 shape scaled into integer range:
//!
//! ```text
//! bound(step, plays) = isqrt(2 * K² * ilog2(K² * (step + 1)) / plays)
//! ```
//!
//! It shrinks as an item accumulates plays and grows slowly with the global
//! round counter. Everything is computed in `u128` so that a saturated round
//! counter cannot overflow the intermediate product.

use crate::constants::SCALE;

/// Integer exploration-bonus estimator for a fixed scale `K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundEstimator {
    scale: u64,
}

impl Default for BoundEstimator {
    fn default() -> Self {
        Self::new(SCALE)
    }
}

impl BoundEstimator {
    /// Create an estimator with the given scale constant.
    pub const fn new(scale: u64) -> Self {
        Self { scale }
    }

    /// The scale constant `K`.
    pub const fn scale(&self) -> u64 {
        self.scale
    }

    /// Exploration bonus for an item with `plays` plays at global round `step`.
    ///
    /// Returns 0 when either argument is 0 (no information yet).
    pub fn bound(&self, step: u64, plays: u64) -> u64 {
        if step == 0 || plays == 0 {
            return 0;
        }

        let k2 = u128::from(self.scale) * u128::from(self.scale);
        let Some(log) = k2.saturating_mul(u128::from(step) + 1).checked_ilog2() else {
            return 0;
        };

        let radicand = k2.saturating_mul(2).saturating_mul(u128::from(log)) / u128::from(plays);
        u64::try_from(radicand.isqrt()).unwrap_or(u64::MAX)
    }
}

/// Exploration bonus with the default scale.
pub fn bound(step: u64, plays: u64) -> u64 {
    BoundEstimator::default().bound(step, plays)
}
