//! Log-space arithmetic and the random draws used by the samplers

use crate::io::configuration::LOG_SUM_CUTOFF;
use rand::Rng;
use std::f64::consts::PI;

/// Error function approximation using Abramowitz and Stegun method
///
/// Accurate to about 1.5e-7, which is plenty for reporting tail areas.
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254_829_592_f64;
    let a2 = -0.284_496_736_f64;
    let a3 = 1.421_413_741_f64;
    let a4 = -1.453_152_027_f64;
    let a5 = 1.061_405_429_f64;
    let p = 0.327_591_1_f64;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / p.mul_add(x, 1.0);
    let y = (((((a5.mul_add(t, a4)).mul_add(t, a3)).mul_add(t, a2)).mul_add(t, a1)) * t)
        .mul_add(-(-x * x).exp(), 1.0);

    sign * y
}

/// Cumulative distribution function of a normal distribution
pub fn normal_cdf(x: f64, mean: f64, stddev: f64) -> f64 {
    let z = (x - mean) / (std::f64::consts::SQRT_2 * stddev);
    0.5 * (1.0 + erf(z))
}

// Chebyshev fit of ln(erfc(x) / t) - x^2, lowest order first
const ERFC_COEFFICIENTS: [f64; 10] = [
    -1.265_512_23,
    1.000_023_68,
    0.374_091_96,
    0.096_784_18,
    -0.186_288_06,
    0.278_868_07,
    -1.135_203_98,
    1.488_515_87,
    -0.822_152_23,
    0.170_872_77,
];

/// Natural log of the complementary error function
///
/// Works in log space so that far tails stay finite; the fractional error of
/// the underlying fit is below 1.2e-7 for every argument.
pub fn ln_erfc(x: f64) -> f64 {
    if x < 0.0 {
        // erfc(x) = 2 - erfc(-x), which lies in [1, 2]
        return (2.0 - ln_erfc(-x).exp()).ln();
    }
    let t = 1.0 / 0.5f64.mul_add(x, 1.0);
    let correction = ERFC_COEFFICIENTS
        .iter()
        .rev()
        .fold(0.0, |total: f64, &coefficient| total.mul_add(t, coefficient));
    x.mul_add(-x, t.ln()) + correction
}

/// Log of the probability that a normal variable exceeds `x`
pub fn ln_normal_upper_tail(x: f64, mean: f64, stddev: f64) -> f64 {
    let z = (x - mean) / (std::f64::consts::SQRT_2 * stddev);
    ln_erfc(z) - std::f64::consts::LN_2
}

/// Density of a normal distribution parameterised by its variance
pub fn normal_pdf(x: f64, mean: f64, variance: f64) -> f64 {
    (-(x - mean).powi(2) / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt()
}

/// Computes ln(e^a + e^b) without leaving log space
///
/// When the smaller term is more than `LOG_SUM_CUTOFF` below the larger one
/// it cannot change the result at double precision and is dropped.
pub fn log_sum(log_x: f64, log_y: f64) -> f64 {
    let (larger, smaller) = if log_y > log_x {
        (log_y, log_x)
    } else {
        (log_x, log_y)
    };
    if larger == f64::NEG_INFINITY {
        return larger;
    }
    let neg_diff = smaller - larger;
    if neg_diff < LOG_SUM_CUTOFF {
        return larger;
    }
    larger + neg_diff.exp().ln_1p()
}

/// Draw from the standard normal distribution using the Box-Muller transform
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Shift away from zero so the logarithm stays finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Draw from a normal distribution with the given mean and standard deviation
pub fn normal_draw<R: Rng + ?Sized>(rng: &mut R, mean: f64, stddev: f64) -> f64 {
    stddev.mul_add(standard_normal(rng), mean)
}

/// Logarithm of a uniform draw on (0, 1]
pub fn uniform_log<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (1.0 - rng.random::<f64>()).ln()
}
