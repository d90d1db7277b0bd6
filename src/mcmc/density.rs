//! Conditional densities with their parameters resolved to numbers

use crate::math::probability::ln_normal_upper_tail;
use crate::math::special::{ln_factorial, ln_gamma};
use std::f64::consts::PI;

/// A distribution whose parameters have been read from the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    /// Normal with mean and variance
    Normal {
        /// Mean
        mean: f64,
        /// Variance
        variance: f64,
    },
    /// Normal truncated to x > 0
    NonNegativeNormal {
        /// Mean before truncation
        mean: f64,
        /// Variance before truncation
        variance: f64,
    },
    /// Gamma with shape and rate
    Gamma {
        /// Shape
        shape: f64,
        /// Rate
        inv_scale: f64,
    },
    /// Inverse gamma with shape and scale
    InvGamma {
        /// Shape
        shape: f64,
        /// Scale
        scale: f64,
    },
    /// Poisson with rate
    Poisson {
        /// Rate
        rate: f64,
    },
    /// Beta with two shape parameters
    Beta {
        /// First shape
        alpha: f64,
        /// Second shape
        beta: f64,
    },
    /// Bernoulli with success probability
    Bernoulli {
        /// Success probability
        p: f64,
    },
    /// Binomial with trials and success probability
    Binomial {
        /// Number of trials
        trials: f64,
        /// Success probability
        p: f64,
    },
}

// x * ln(y) with the convention 0 * ln(0) = 0
fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x * y.ln() }
}

fn is_integer(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0
}

fn normal_ln_pdf(x: f64, mean: f64, variance: f64) -> f64 {
    if variance == 0.0 {
        return if x == mean {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    if variance < 0.0 {
        return f64::NEG_INFINITY;
    }
    -(0.5f64.mul_add(
        (2.0 * PI * variance).ln(),
        (x - mean).powi(2) / (2.0 * variance),
    ))
}

impl Density {
    /// Whether `x` lies outside the distribution's support
    pub fn outside_support(&self, x: f64) -> bool {
        if x.is_nan() {
            return true;
        }
        match *self {
            Self::Normal { .. } => false,
            Self::NonNegativeNormal { .. } | Self::Gamma { .. } | Self::InvGamma { .. } => x <= 0.0,
            Self::Poisson { .. } => !is_integer(x) || x < 0.0,
            Self::Beta { .. } => !(0.0..=1.0).contains(&x),
            Self::Bernoulli { .. } => x != 0.0 && x != 1.0,
            Self::Binomial { trials, .. } => !is_integer(x) || x < 0.0 || x > trials,
        }
    }

    /// Log density (or log mass) at `x`; negative infinity outside the support
    pub fn ln_pdf(&self, x: f64) -> f64 {
        if self.outside_support(x) {
            return f64::NEG_INFINITY;
        }
        match *self {
            Self::Normal { mean, variance } => normal_ln_pdf(x, mean, variance),
            Self::NonNegativeNormal { mean, variance } => {
                normal_ln_pdf(x, mean, variance) - ln_normal_upper_tail(0.0, mean, variance.sqrt())
            }
            Self::Gamma { shape, inv_scale } => {
                shape * inv_scale.ln() - ln_gamma(shape) + xlogy(shape - 1.0, x) - inv_scale * x
            }
            Self::InvGamma { shape, scale } => {
                shape * scale.ln() - ln_gamma(shape) - (shape + 1.0) * x.ln() - scale / x
            }
            Self::Poisson { rate } => xlogy(x, rate) - rate - ln_factorial(x),
            Self::Beta { alpha, beta } => {
                ln_gamma(alpha + beta) - ln_gamma(alpha) - ln_gamma(beta)
                    + xlogy(alpha - 1.0, x)
                    + xlogy(beta - 1.0, 1.0 - x)
            }
            Self::Bernoulli { p } => {
                if x == 1.0 {
                    p.ln()
                } else {
                    (1.0 - p).ln()
                }
            }
            Self::Binomial { trials, p } => {
                ln_factorial(trials) - ln_factorial(x) - ln_factorial(trials - x)
                    + xlogy(x, p)
                    + xlogy(trials - x, 1.0 - p)
            }
        }
    }

    /// Density (or mass) at `x`
    pub fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }
}
