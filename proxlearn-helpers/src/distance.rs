use crate::Float;
use ndarray::ArrayView1;
use std::fmt::{Debug, Formatter};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A dissimilarity measure between two feature vectors of equal length.
///
/// Implementations must be symmetric and non-negative. `rdistance` is a
/// "reduced" distance that preserves the ordering of `distance` but may be
/// cheaper to compute (e.g. squared Euclidean); use it for nearest-neighbour
/// comparisons and `distance` wherever the actual value matters.
pub trait Distance<F: Float>: Clone + Send + Sync {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.distance(a, b)
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist
    }
}

/// Manhattan distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct L1Dist;

impl<F: Float> Distance<F> for L1Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
    }
}

/// Euclidean distance. The reduced distance is the squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdistance(a, b).sqrt()
    }

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| {
                let diff = x - y;
                diff * diff
            })
            .sum()
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.sqrt()
    }
}

/// Chebyshev distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LInfDist;

impl<F: Float> Distance<F> for LInfDist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y).abs())
            .fold(F::zero(), F::max)
    }
}

/// Minkowski distance of order `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LpDist<F: Float>(pub F);

impl<F: Float> Distance<F> for LpDist<F> {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdist_to_dist(self.rdistance(a, b))
    }

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y).abs().powf(self.0))
            .sum()
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.powf(F::one() / self.0)
    }
}

/// Adapts a plain function or closure into a [`Distance`].
///
/// ```
/// use ndarray::array;
/// use proxlearn_helpers::{Distance, FnDist};
///
/// let hamming = FnDist(|a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>| {
///     a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as f64
/// });
/// assert_eq!(hamming.distance(array![1.0, 2.0].view(), array![1.0, 3.0].view()), 1.0);
/// ```
#[derive(Clone, Copy)]
pub struct FnDist<G>(pub G);

impl<G> Debug for FnDist<G> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnDist(..)")
    }
}

impl<F, G> Distance<F> for FnDist<G>
where
    F: Float,
    G: Fn(ArrayView1<F>, ArrayView1<F>) -> F + Clone + Send + Sync,
{
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        (self.0)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_l2_distance_and_reduced_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_abs_diff_eq!(L2Dist.distance(a.view(), b.view()), 5.0);
        assert_abs_diff_eq!(L2Dist.rdistance(a.view(), b.view()), 25.0);
        assert_abs_diff_eq!(Distance::<f64>::rdist_to_dist(&L2Dist, 25.0), 5.0);
    }

    #[test]
    fn test_l1_and_linf() {
        let a = array![1.0f32, -2.0, 3.0];
        let b = array![4.0f32, 2.0, 3.0];
        assert_abs_diff_eq!(L1Dist.distance(a.view(), b.view()), 7.0);
        assert_abs_diff_eq!(LInfDist.distance(a.view(), b.view()), 4.0);
    }

    #[test]
    fn test_lp_matches_l1_and_l2() {
        let a = array![0.5, 1.5, -2.0];
        let b = array![2.0, -1.0, 0.0];
        assert_abs_diff_eq!(
            LpDist(1.0).distance(a.view(), b.view()),
            L1Dist.distance(a.view(), b.view()),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            LpDist(2.0).distance(a.view(), b.view()),
            L2Dist.distance(a.view(), b.view()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_distances_are_symmetric() {
        let a = array![0.3, 7.0, -1.0];
        let b = array![-4.0, 2.5, 6.0];
        assert_abs_diff_eq!(
            L2Dist.distance(a.view(), b.view()),
            L2Dist.distance(b.view(), a.view())
        );
        assert_abs_diff_eq!(
            LpDist(3.0).distance(a.view(), b.view()),
            LpDist(3.0).distance(b.view(), a.view()),
            epsilon = 1e-12
        );
    }
}
