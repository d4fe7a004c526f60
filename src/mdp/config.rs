use std::time::Duration;

use crate::error::{Error, Result};

/// How a sweep reads neighbor values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateScheme {
    /// Row-major, in place: later cells in a sweep see values already
    /// updated earlier in the same sweep (Gauss-Seidel).
    #[default]
    InPlace,
    /// Every cell reads the previous sweep's values (Jacobi). Order
    /// independent, usually needs a few more sweeps.
    Synchronous,
}

/// Configuration for [`ValueIteration`](crate::ValueIteration).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIterationConfig {
    /// A sweep whose biggest change is below this has converged.
    pub threshold: f64,
    /// Discount applied to movement rewards and to the goal bonus.
    pub discount_rate: f64,
    /// Whether staying put is an action distinct from moving.
    pub allow_stay_action: bool,
    /// Decimal digits kept after each update, `None` to keep full precision.
    pub precision: Option<u32>,
    /// Sweeps allowed before giving up with a non-convergence error.
    pub max_iterations: usize,
    /// Wall-clock budget for a run, checked between sweeps.
    pub deadline: Option<Duration>,
    /// In-place or double-buffered sweeps.
    pub scheme: UpdateScheme,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            discount_rate: 0.9,
            allow_stay_action: true,
            precision: Some(2),
            max_iterations: 10_000,
            deadline: None,
            scheme: UpdateScheme::InPlace,
        }
    }
}

impl ValueIterationConfig {
    /// No discount, no stay action, no rounding.
    ///
    /// Pair with [`GridRewards::terminal_goal`](crate::GridRewards::terminal_goal).
    pub fn undiscounted() -> Self {
        Self {
            discount_rate: 1.0,
            allow_stay_action: false,
            precision: None,
            ..Self::default()
        }
    }

    /// Sets the convergence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the discount applied to moves and to the goal bonus.
    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    /// Allows or forbids staying put as an action.
    pub fn with_stay_action(mut self, allow: bool) -> Self {
        self.allow_stay_action = allow;
        self
    }

    /// Sets the decimal digits kept per update, `None` for full precision.
    pub fn with_precision(mut self, precision: Option<u32>) -> Self {
        self.precision = precision;
        self
    }

    /// Caps the number of sweeps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Bounds a run by wall-clock time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Chooses between in-place and synchronous sweeps.
    pub fn with_scheme(mut self, scheme: UpdateScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Checks every field is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(Error::InvalidConfig("threshold must be finite and positive"));
        }
        if !(self.discount_rate > 0.0 && self.discount_rate <= 1.0) {
            return Err(Error::InvalidConfig("discount_rate must be in (0, 1]"));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be at least 1"));
        }
        if matches!(self.precision, Some(digits) if digits > 15) {
            return Err(Error::InvalidConfig("precision must be at most 15 digits"));
        }
        Ok(())
    }

    /// Rounds `value` to the configured number of decimal digits.
    ///
    /// Ties are broken away from zero on the scaled value, so `-0.125`
    /// becomes `-0.13`. Formatting with `{:.2}` would round the exact binary
    /// value half-to-even instead, giving `-0.12` for the same input.
    pub(crate) fn round(&self, value: f64) -> f64 {
        match self.precision {
            Some(digits) => {
                let scale = 10f64.powi(digits as i32);
                (value * scale).round() / scale
            }
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValueIterationConfig::default();
        assert_eq!(config.threshold, 0.05);
        assert_eq!(config.discount_rate, 0.9);
        assert!(config.allow_stay_action);
        assert_eq!(config.precision, Some(2));
        assert_eq!(config.scheme, UpdateScheme::InPlace);
        assert!(config.validate().is_ok());
        assert!(ValueIterationConfig::undiscounted().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let base = ValueIterationConfig::default();
        for config in [
            base.clone().with_threshold(0.0),
            base.clone().with_threshold(f64::NAN),
            base.clone().with_discount_rate(0.0),
            base.clone().with_discount_rate(1.5),
            base.clone().with_max_iterations(0),
            base.clone().with_precision(Some(16)),
        ] {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_round() {
        let config = ValueIterationConfig::default();
        assert_eq!(config.round(0.123), 0.12);
        // Exact binary ties go away from zero.
        assert_eq!(config.round(0.125), 0.13);
        assert_eq!(config.round(-0.125), -0.13);
        assert_eq!(config.round(7.0), 7.0);

        let exact = config.with_precision(None);
        assert_eq!(exact.round(0.123), 0.123);
    }
}
