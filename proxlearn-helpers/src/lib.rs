use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

mod common;
mod distance;

pub use common::{check_dimensions, DataPoint, DimensionMismatch};
pub use distance::{Distance, FnDist, L1Dist, L2Dist, LInfDist, LpDist};

/// Floating point element type shared by every algorithm crate.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    /// Converts an `f64` constant or counter, saturating to infinity when out of range.
    fn lossy(x: f64) -> Self {
        <Self as FromPrimitive>::from_f64(x).unwrap_or_else(Self::infinity)
    }
}

impl Float for f32 {}

impl Float for f64 {}
