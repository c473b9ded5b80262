//! Generalized Learning Vector Quantization with an epoch-annealed soft margin.
//!
//! Every class owns `num_codebook` prototypes. Training walks the data in
//! order, once per epoch, and for each instance pulls the nearest prototype of
//! its own class towards it while pushing the nearest prototype of any other
//! class away. The step size follows the gradient of the relative distance
//! `mu = (d1 - d2) / (d1 + d2)` passed through a sigmoid whose slope is the
//! epoch index, so the loss sharpens as training progresses.

use ndarray::{s, Array1, Array3, ArrayView1, ArrayView3, ArrayViewMut1};
use proxlearn_helpers::{check_dimensions, DataPoint, DimensionMismatch, Distance, Float, L2Dist};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Errors that can occur during GLVQ training and prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlvqError {
    /// The training data is empty.
    #[error("training data is empty")]
    EmptyDataSet,
    /// GLVQ needs a rival class for every instance.
    #[error("GLVQ needs at least two classes, got {0}")]
    InvalidClassCount(usize),
    /// A hyperparameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A single feature vector has the wrong length.
    #[error("expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A training row has the wrong length.
    #[error(transparent)]
    InvalidRow(#[from] DimensionMismatch),
    /// A training row carries a class label outside `[0, num_class)`.
    #[error("row {index} has class label {label}, outside [0, {num_class})")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        num_class: usize,
    },
    /// The class is not part of the codebook.
    #[error("class {0} is not part of the codebook")]
    UnknownClass(usize),
    /// A class has fewer instances than the initialization strategy needs.
    #[error("not enough instances of class {0} to initialize its prototypes")]
    NotEnoughDataForPrototypes(usize),
    /// The instance sits on both nearest prototypes, so `mu` is 0/0.
    #[error("instance coincides with both nearest prototypes; relative distance is undefined")]
    DegenerateDistances,
}

/// Position of a prototype inside a [`Codebook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct PrototypeIndex {
    pub class: usize,
    pub slot: usize,
}

/// Prototype initialization strategies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub enum PrototypeInit<F: Float> {
    /// Every coordinate drawn independently and uniformly from `[low, high)`.
    Uniform { low: F, high: F },
    /// Randomly sample distinct training points of each class.
    ClassSample,
    /// Use the mean of each class (exactly one prototype per class).
    ClassMean,
}

impl<F: Float> Default for PrototypeInit<F> {
    fn default() -> Self {
        PrototypeInit::Uniform {
            low: F::zero(),
            high: F::lossy(100.0),
        }
    }
}

/// Hyperparameters for [`fit`] and friends.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct GlvqParams<F: Float> {
    /// Prototypes per class.
    pub num_codebook: usize,
    /// Gradient step size.
    pub learning_rate: F,
    /// Full passes over the training data.
    pub epochs: usize,
    pub init: PrototypeInit<F>,
}

impl<F: Float> Default for GlvqParams<F> {
    fn default() -> Self {
        GlvqParams {
            num_codebook: 1,
            learning_rate: F::lossy(0.001),
            epochs: 100,
            init: PrototypeInit::default(),
        }
    }
}

impl<F: Float> GlvqParams<F> {
    /// Rejects out-of-range hyperparameters before any training work starts.
    pub fn validate(&self) -> Result<(), GlvqError> {
        if self.num_codebook == 0 {
            return Err(GlvqError::InvalidConfig(
                "num_codebook must be at least 1".into(),
            ));
        }
        if !(self.learning_rate > F::zero() && self.learning_rate.is_finite()) {
            return Err(GlvqError::InvalidConfig(
                "learning_rate must be positive and finite".into(),
            ));
        }
        if self.epochs == 0 {
            return Err(GlvqError::InvalidConfig("epochs must be at least 1".into()));
        }
        match self.init {
            PrototypeInit::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low < high) {
                    return Err(GlvqError::InvalidConfig(
                        "uniform initialization needs finite bounds with low < high".into(),
                    ));
                }
            }
            PrototypeInit::ClassMean if self.num_codebook != 1 => {
                return Err(GlvqError::InvalidConfig(
                    "ClassMean supports exactly one prototype per class".into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// The prototype vectors of a GLVQ model, laid out as
/// `(num_class, num_codebook, num_features)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Codebook<F: Float> {
    prototypes: Array3<F>,
}

impl<F: Float> Codebook<F> {
    /// Wraps an existing prototype array.
    pub fn from_prototypes(prototypes: Array3<F>) -> Result<Self, GlvqError> {
        let (num_class, num_codebook, num_features) = prototypes.dim();
        if num_class < 2 {
            return Err(GlvqError::InvalidClassCount(num_class));
        }
        if num_codebook == 0 || num_features == 0 {
            return Err(GlvqError::InvalidConfig(
                "codebook needs at least one slot and one feature".into(),
            ));
        }
        Ok(Codebook { prototypes })
    }

    /// Draws every coordinate uniformly from `[low, high)`.
    fn uniform<R: Rng + ?Sized>(
        num_class: usize,
        num_codebook: usize,
        num_features: usize,
        low: F,
        high: F,
        rng: &mut R,
    ) -> Self {
        let prototypes = Array3::from_shape_fn((num_class, num_codebook, num_features), |_| {
            rng.random_range(low..high)
        });
        Codebook { prototypes }
    }

    pub fn num_class(&self) -> usize {
        self.prototypes.dim().0
    }

    pub fn num_codebook(&self) -> usize {
        self.prototypes.dim().1
    }

    pub fn num_features(&self) -> usize {
        self.prototypes.dim().2
    }

    pub fn num_prototypes(&self) -> usize {
        self.num_class() * self.num_codebook()
    }

    pub fn prototypes(&self) -> ArrayView3<'_, F> {
        self.prototypes.view()
    }

    pub fn prototype(&self, index: PrototypeIndex) -> ArrayView1<'_, F> {
        self.prototypes.slice(s![index.class, index.slot, ..])
    }

    fn prototype_mut(&mut self, index: PrototypeIndex) -> ArrayViewMut1<'_, F> {
        self.prototypes.slice_mut(s![index.class, index.slot, ..])
    }

    /// Iterates over all prototypes in row-major (class, slot) order.
    pub fn iter(&self) -> impl Iterator<Item = (PrototypeIndex, ArrayView1<'_, F>)> + '_ {
        let slots = self.num_codebook();
        (0..self.num_class())
            .flat_map(move |class| (0..slots).map(move |slot| PrototypeIndex { class, slot }))
            .map(move |index| (index, self.prototype(index)))
    }

    /// Nearest prototype over the whole codebook. Ties go to the lowest
    /// class, then the lowest slot.
    pub fn nearest(&self, x: ArrayView1<F>) -> Option<(PrototypeIndex, F)> {
        self.nearest_where(x, |_| true)
    }

    /// Nearest prototype of class `target` (the winner `w1`). Ties go to the
    /// lowest slot. `None` if `target` is not a class of this codebook.
    pub fn winner(&self, x: ArrayView1<F>, target: usize) -> Option<(PrototypeIndex, F)> {
        self.nearest_where(x, |index| index.class == target)
    }

    /// Nearest prototype of any class other than `target` (the runner-up
    /// `w2`). Ties go to the lowest (class, slot).
    pub fn runner_up(&self, x: ArrayView1<F>, target: usize) -> Option<(PrototypeIndex, F)> {
        self.nearest_where(x, |index| index.class != target)
    }

    fn nearest_where(
        &self,
        x: ArrayView1<F>,
        keep: impl Fn(PrototypeIndex) -> bool,
    ) -> Option<(PrototypeIndex, F)> {
        let mut best: Option<(PrototypeIndex, F)> = None;
        for (index, proto) in self.iter().filter(|(index, _)| keep(*index)) {
            let d = L2Dist.distance(x, proto);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
        }
        best
    }

    fn check_vector(&self, x: ArrayView1<F>) -> Result<(), GlvqError> {
        if x.len() != self.num_features() {
            return Err(GlvqError::DimensionMismatch {
                expected: self.num_features(),
                found: x.len(),
            });
        }
        Ok(())
    }
}

/// What a single [`update_step`] touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome<F: Float> {
    pub winner: PrototypeIndex,
    pub runner_up: PrototypeIndex,
    /// Relative distance `(d1 - d2) / (d1 + d2)` before the update.
    pub mu: F,
}

/// Applies one online GLVQ update for instance `x` of class `target`.
///
/// `epoch` is the zero-based pass index and doubles as the slope of the
/// sigmoid `f(mu) = 1 / (1 + exp(-mu * epoch))`. The winner moves towards `x`,
/// the runner-up away from it; both gradients are taken at the pre-update
/// positions.
///
/// Returns [`GlvqError::DegenerateDistances`] without touching the codebook
/// when `x` lies on both prototypes.
pub fn update_step<F: Float>(
    codebook: &mut Codebook<F>,
    x: ArrayView1<F>,
    target: usize,
    learning_rate: F,
    epoch: usize,
) -> Result<StepOutcome<F>, GlvqError> {
    codebook.check_vector(x)?;
    let (w1_index, d1) = codebook
        .winner(x, target)
        .ok_or(GlvqError::UnknownClass(target))?;
    let (w2_index, d2) = codebook
        .runner_up(x, target)
        .ok_or(GlvqError::UnknownClass(target))?;

    let sum = d1 + d2;
    if sum == F::zero() {
        return Err(GlvqError::DegenerateDistances);
    }
    let mu = (d1 - d2) / sum;
    let t = F::lossy(epoch as f64);
    let fmu = F::one() / (F::one() + (-mu * t).exp());
    let fmu_deriv = fmu * (F::one() - fmu);

    let sum_sq = sum * sum;
    let mu_d1_deriv = d2 / sum_sq;
    let mu_d2_deriv = d1 / sum_sq;

    let grad1 = (&x - &codebook.prototype(w1_index)) * (fmu_deriv * mu_d1_deriv);
    let grad2 = (&x - &codebook.prototype(w2_index)) * (fmu_deriv * mu_d2_deriv);

    codebook
        .prototype_mut(w1_index)
        .scaled_add(learning_rate, &grad1);
    codebook
        .prototype_mut(w2_index)
        .scaled_add(-learning_rate, &grad2);

    Ok(StepOutcome {
        winner: w1_index,
        runner_up: w2_index,
        mu,
    })
}

/// A trained GLVQ classifier. The codebook is frozen once training ends.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Glvq<F: Float> {
    codebook: Codebook<F>,
    skipped_updates: usize,
}

impl<F: Float> Glvq<F> {
    /// Builds a predictor around an existing codebook.
    pub fn from_codebook(codebook: Codebook<F>) -> Self {
        Glvq {
            codebook,
            skipped_updates: 0,
        }
    }

    pub fn codebook(&self) -> &Codebook<F> {
        &self.codebook
    }

    pub fn into_codebook(self) -> Codebook<F> {
        self.codebook
    }

    /// Number of instance updates skipped during training because the
    /// relative distance was undefined.
    pub fn skipped_updates(&self) -> usize {
        self.skipped_updates
    }

    /// Predicts the class of the nearest prototype.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<usize, GlvqError> {
        self.codebook.check_vector(features)?;
        self.codebook
            .nearest(features)
            .map(|(index, _)| index.class)
            .ok_or(GlvqError::InvalidClassCount(self.codebook.num_class()))
    }

    /// One-hot vector of length `num_class` with 1.0 at the predicted class.
    ///
    /// This is a hard nearest-prototype decision, not a calibrated
    /// probability estimate.
    pub fn predict_distribution(&self, features: ArrayView1<F>) -> Result<Array1<F>, GlvqError> {
        let class = self.predict(features)?;
        let mut probs = Array1::zeros(self.codebook.num_class());
        probs[class] = F::one();
        Ok(probs)
    }
}

/// Trains a GLVQ model with a random seed.
///
/// # Arguments
///
/// * `data`: Training rows; labels are class indices in `[0, num_class)`.
/// * `num_class`: Number of classes, at least 2.
/// * `num_features`: Length of every feature vector.
/// * `params`: Codebook size, learning rate, epochs and initialization.
pub fn fit<F: Float>(
    data: &[DataPoint<usize, F>],
    num_class: usize,
    num_features: usize,
    params: &GlvqParams<F>,
) -> Result<Glvq<F>, GlvqError> {
    fit_with_seed(data, num_class, num_features, params, rand::random())
}

/// Trains a GLVQ model with a specific seed for reproducibility.
pub fn fit_with_seed<F: Float>(
    data: &[DataPoint<usize, F>],
    num_class: usize,
    num_features: usize,
    params: &GlvqParams<F>,
    seed: u64,
) -> Result<Glvq<F>, GlvqError> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    fit_with_rng(data, num_class, num_features, params, &mut rng)
}

/// Trains a GLVQ model drawing all randomness from `rng`.
pub fn fit_with_rng<F, R>(
    data: &[DataPoint<usize, F>],
    num_class: usize,
    num_features: usize,
    params: &GlvqParams<F>,
    rng: &mut R,
) -> Result<Glvq<F>, GlvqError>
where
    F: Float,
    R: Rng + ?Sized,
{
    validate_training_set(data, num_class, num_features, params)?;
    info!(
        instances = data.len(),
        num_class,
        num_features,
        num_codebook = params.num_codebook,
        epochs = params.epochs,
        "training GLVQ"
    );

    // --- 1. Initialization ---
    let mut codebook = initialize_codebook(data, num_class, num_features, params, rng)?;

    // --- 2. Training loop ---
    let mut skipped_updates = 0;
    for epoch in 0..params.epochs {
        let mut skipped_this_epoch = 0;
        for (i, dp) in data.iter().enumerate() {
            trace!(instance = i, label = dp.label, "processing instance");
            match update_step(
                &mut codebook,
                dp.features.view(),
                dp.label,
                params.learning_rate,
                epoch,
            ) {
                Ok(_) => {}
                Err(GlvqError::DegenerateDistances) => {
                    warn!(epoch, instance = i, "skipping update with zero distance sum");
                    skipped_this_epoch += 1;
                }
                Err(e) => return Err(e),
            }
        }
        skipped_updates += skipped_this_epoch;
        debug!(epoch, skipped = skipped_this_epoch, "epoch complete");
    }

    Ok(Glvq {
        codebook,
        skipped_updates,
    })
}

fn validate_training_set<F: Float>(
    data: &[DataPoint<usize, F>],
    num_class: usize,
    num_features: usize,
    params: &GlvqParams<F>,
) -> Result<(), GlvqError> {
    params.validate()?;
    if num_class < 2 {
        return Err(GlvqError::InvalidClassCount(num_class));
    }
    if num_features == 0 {
        return Err(GlvqError::InvalidConfig(
            "num_features must be at least 1".into(),
        ));
    }
    if data.is_empty() {
        return Err(GlvqError::EmptyDataSet);
    }
    check_dimensions(data, num_features)?;
    if let Some((index, dp)) = data.iter().enumerate().find(|(_, dp)| dp.label >= num_class) {
        return Err(GlvqError::LabelOutOfRange {
            index,
            label: dp.label,
            num_class,
        });
    }
    Ok(())
}

/// Builds the starting codebook according to `params.init`.
fn initialize_codebook<F, R>(
    data: &[DataPoint<usize, F>],
    num_class: usize,
    num_features: usize,
    params: &GlvqParams<F>,
    rng: &mut R,
) -> Result<Codebook<F>, GlvqError>
where
    F: Float,
    R: Rng + ?Sized,
{
    let num_codebook = params.num_codebook;
    match &params.init {
        PrototypeInit::Uniform { low, high } => Ok(Codebook::uniform(
            num_class,
            num_codebook,
            num_features,
            *low,
            *high,
            rng,
        )),
        PrototypeInit::ClassSample => {
            let by_class = group_data_by_class(data, num_class);
            let mut prototypes = Array3::zeros((num_class, num_codebook, num_features));
            for (class, indices) in by_class.iter().enumerate() {
                if num_codebook > indices.len() {
                    return Err(GlvqError::NotEnoughDataForPrototypes(class));
                }
                let picks = index::sample(rng, indices.len(), num_codebook);
                for (slot, i) in picks.iter().enumerate() {
                    prototypes
                        .slice_mut(s![class, slot, ..])
                        .assign(&data[indices[i]].features);
                }
            }
            Codebook::from_prototypes(prototypes)
        }
        PrototypeInit::ClassMean => {
            let by_class = group_data_by_class(data, num_class);
            let mut prototypes = Array3::zeros((num_class, 1, num_features));
            for (class, indices) in by_class.iter().enumerate() {
                if indices.is_empty() {
                    return Err(GlvqError::NotEnoughDataForPrototypes(class));
                }
                let mut sum = Array1::zeros(num_features);
                for &i in indices {
                    sum += &data[i].features;
                }
                let mean = sum / F::lossy(indices.len() as f64);
                prototypes.slice_mut(s![class, 0, ..]).assign(&mean);
            }
            Codebook::from_prototypes(prototypes)
        }
    }
}

/// Groups row indices by class label.
fn group_data_by_class<F: Float>(data: &[DataPoint<usize, F>], num_class: usize) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); num_class];
    for (i, dp) in data.iter().enumerate() {
        groups[dp.label].push(i);
    }
    groups
}
