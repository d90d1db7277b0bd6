//! Summary statistics and permutation tests

use crate::io::configuration::{MAX_PAIRED_PERMUTATION_ITEMS, PERMUTATION_SAMPLES_PER_ITEM};
use crate::io::error::{Result, computation_error, invalid_input, invalid_parameter};
use rand::Rng;
use rand::seq::SliceRandom;

/// Entropy (natural log) of a categorical distribution given as probabilities
///
/// Zero entries contribute nothing.
pub fn entropy(distribution: &[f64]) -> f64 {
    distribution
        .iter()
        .filter(|&&p| p != 0.0)
        .map(|&p| -p * p.ln())
        .sum()
}

/// H-index of a categorical distribution, the sum of squared probabilities
pub fn h_index(distribution: &[f64]) -> f64 {
    distribution.iter().map(|p| p * p).sum()
}

/// Arithmetic mean
///
/// # Errors
///
/// Returns an error if `values` is empty
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(computation_error("mean", &"no values to average"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Approximate p-value of a difference in means by random relabelling
///
/// Counts the shuffles whose absolute mean difference strictly exceeds the
/// observed one. `num_samples` defaults to 25 shuffles per data point.
///
/// # Errors
///
/// Returns an error if either sample is empty or `num_samples` is zero
pub fn mean_permutation_test<R: Rng + ?Sized>(
    first: &[f64],
    second: &[f64],
    num_samples: Option<usize>,
    rng: &mut R,
) -> Result<f64> {
    if first.is_empty() || second.is_empty() {
        return Err(invalid_input(&"both samples need at least one value"));
    }
    let num_samples =
        num_samples.unwrap_or((first.len() + second.len()) * PERMUTATION_SAMPLES_PER_ITEM);
    if num_samples == 0 {
        return Err(invalid_parameter(
            "num_samples",
            &num_samples,
            &"must be at least 1",
        ));
    }

    let observed = (mean(first)? - mean(second)?).abs();
    let mut pooled: Vec<f64> = first.iter().chain(second).copied().collect();
    let split = first.len();

    let mut exceeding = 0usize;
    for _ in 0..num_samples {
        pooled.shuffle(rng);
        let (head, tail) = pooled.split_at(split);
        if (mean(tail)? - mean(head)?).abs() > observed {
            exceeding += 1;
        }
    }
    Ok(exceeding as f64 / num_samples as f64)
}

/// Exact paired permutation test over every assignment of difference signs
///
/// With weights, each difference is scaled by `w / sum(w)` first. The
/// p-value is the fraction of sign assignments whose absolute mean is at
/// least the observed absolute mean.
///
/// # Errors
///
/// Returns an error if the samples differ in length, are empty, are too long
/// to enumerate, or the weights do not match them
pub fn paired_permutation_test(
    first: &[f64],
    second: &[f64],
    weights: Option<&[f64]>,
) -> Result<f64> {
    if first.len() != second.len() {
        return Err(invalid_input(&format!(
            "paired samples differ in length ({} and {})",
            first.len(),
            second.len()
        )));
    }
    if first.is_empty() {
        return Err(invalid_input(&"paired samples are empty"));
    }
    if first.len() > MAX_PAIRED_PERMUTATION_ITEMS {
        return Err(invalid_parameter(
            "pairs",
            &first.len(),
            &format!("exact enumeration is limited to {MAX_PAIRED_PERMUTATION_ITEMS} pairs"),
        ));
    }

    let mut differences: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
    if let Some(weights) = weights {
        if weights.len() != differences.len() {
            return Err(invalid_parameter(
                "weights",
                &weights.len(),
                &format!("expected one weight per pair ({})", differences.len()),
            ));
        }
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            return Err(computation_error("paired_permutation_test", &"weights sum to zero"));
        }
        for (difference, weight) in differences.iter_mut().zip(weights) {
            *difference = *difference * weight / total;
        }
    }

    let length = differences.len() as f64;
    let flipped_mean = |mask: u64| -> f64 {
        let sum: f64 = differences
            .iter()
            .enumerate()
            .map(|(bit, &d)| if (mask >> bit) & 1 == 1 { -d } else { d })
            .sum();
        (sum / length).abs()
    };

    let observed = flipped_mean(0);
    let assignments = 1u64 << differences.len();
    let at_least = (0..assignments)
        .filter(|&mask| flipped_mean(mask) >= observed)
        .count();
    Ok(at_least as f64 / assignments as f64)
}
