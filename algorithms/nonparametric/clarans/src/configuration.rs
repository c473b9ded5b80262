use crate::ClaransError;
use ndarray::ArrayView1;
use proxlearn_helpers::{Distance, Float};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A set of `k` medoids together with the nearest-medoid assignment of every
/// point and the resulting total distortion.
///
/// `assignment[i]` is the medoid *slot* (`0..k`) that point `i` belongs to;
/// [`MedoidConfiguration::assigned_medoid`] maps it back to a point index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct MedoidConfiguration<F: Float> {
    pub(crate) medoids: Vec<usize>,
    pub(crate) assignment: Vec<usize>,
    pub(crate) distances: Vec<F>,
    pub(crate) distortion: F,
}

impl<F: Float> MedoidConfiguration<F> {
    /// Assigns every point to its nearest medoid (ties go to the lowest slot)
    /// and sums the distances.
    pub fn evaluate<D: Distance<F>>(
        points: &[ArrayView1<F>],
        medoids: Vec<usize>,
        distance: &D,
    ) -> Result<Self, ClaransError> {
        let n = points.len();
        if medoids.is_empty() || medoids.len() >= n {
            return Err(ClaransError::InvalidK {
                k: medoids.len(),
                n,
            });
        }
        if let Some(&index) = medoids.iter().find(|&&m| m >= n) {
            return Err(ClaransError::MedoidOutOfRange { index, n });
        }
        for (slot, m) in medoids.iter().enumerate() {
            if medoids[..slot].contains(m) {
                return Err(ClaransError::InvalidConfig(format!(
                    "point {} appears twice in the medoid set",
                    m
                )));
            }
        }

        let mut assignment = Vec::with_capacity(n);
        let mut distances = Vec::with_capacity(n);
        for &point in points {
            let mut best_slot = 0;
            let mut best = F::infinity();
            for (slot, &m) in medoids.iter().enumerate() {
                let d = checked_distance(distance, point, points[m])?;
                if d < best {
                    best = d;
                    best_slot = slot;
                }
            }
            assignment.push(best_slot);
            distances.push(best);
        }
        let distortion = distances.iter().copied().sum();

        Ok(MedoidConfiguration {
            medoids,
            assignment,
            distances,
            distortion,
        })
    }

    /// Number of medoids.
    pub fn k(&self) -> usize {
        self.medoids.len()
    }

    /// Number of assigned points.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Point indices of the medoids, by slot.
    pub fn medoids(&self) -> &[usize] {
        &self.medoids
    }

    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Distance of every point to its assigned medoid.
    pub fn distances(&self) -> &[F] {
        &self.distances
    }

    pub fn distortion(&self) -> F {
        self.distortion
    }

    pub fn is_medoid(&self, point: usize) -> bool {
        self.medoids.contains(&point)
    }

    /// Point index of the medoid that `point` is assigned to.
    pub fn assigned_medoid(&self, point: usize) -> usize {
        self.medoids[self.assignment[point]]
    }

    /// Member point indices of every cluster, by slot.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.k()];
        for (i, &slot) in self.assignment.iter().enumerate() {
            clusters[slot].push(i);
        }
        clusters
    }

    /// Indices of all points that are not medoids, in ascending order.
    pub fn non_medoids(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| !self.is_medoid(i)).collect()
    }
}

/// Evaluates `distance` and rejects NaN or negative results.
pub(crate) fn checked_distance<F, D>(
    distance: &D,
    a: ArrayView1<F>,
    b: ArrayView1<F>,
) -> Result<F, ClaransError>
where
    F: Float,
    D: Distance<F>,
{
    let d = distance.distance(a, b);
    if d.is_nan() || d < F::zero() {
        return Err(ClaransError::InvalidDistance);
    }
    Ok(d)
}
