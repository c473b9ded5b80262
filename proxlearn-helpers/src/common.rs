use ndarray::Array1;
use crate::Float;
use std::fmt::Debug;
use thiserror::Error;

/// Represents a single data point with features and a label.
///
/// L: The type of the label (e.g., `usize` class index, String, enum).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone)]
pub struct DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// A row whose feature count disagrees with the rest of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row {index} has {found} features, expected {expected}")]
pub struct DimensionMismatch {
    pub index: usize,
    pub expected: usize,
    pub found: usize,
}

/// Verifies that every row has exactly `expected` features.
///
/// Rows are never truncated or padded; the first offending row is reported.
pub fn check_dimensions<L, F>(
    data: &[DataPoint<L, F>],
    expected: usize,
) -> Result<(), DimensionMismatch>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    match data.iter().position(|dp| dp.dim() != expected) {
        Some(index) => Err(DimensionMismatch {
            index,
            expected,
            found: data[index].dim(),
        }),
        None => Ok(()),
    }
}
