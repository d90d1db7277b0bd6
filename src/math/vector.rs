//! A small dense vector for quick calculations on short lists of numbers

use std::ops::Add;

/// Dense vector of `f64` values
///
/// Meant for convenience rather than speed; reach for `ndarray` when the
/// data is large.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector {
    values: Vec<f64>,
}

impl Vector {
    /// Create a vector from anything convertible into `f64`
    pub fn new<T: Into<f64>>(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Inner product over the overlapping prefix of both vectors
    pub fn dot(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(x, y)| x * y)
            .sum()
    }

    /// Euclidean length
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scale to unit length in place; the zero vector is left alone
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 {
            return;
        }
        for value in &mut self.values {
            *value /= norm;
        }
    }

    /// Borrow the underlying values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of components
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no components
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Element-wise sum, truncated to the shorter of the two vectors
impl Add for &Vector {
    type Output = Vector;

    fn add(self, other: Self) -> Vector {
        Vector {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(x, y)| x + y)
                .collect(),
        }
    }
}
