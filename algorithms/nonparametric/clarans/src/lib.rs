//! CLARANS: k-medoids clustering by randomized search.
//!
//! Each restart seeds `k` medoids k-means++ style, then repeatedly swaps a
//! random medoid for a random non-medoid point and keeps the swap only if the
//! total distortion strictly drops. A restart ends after `max_neighbor`
//! consecutive rejected swaps; the best configuration over `num_local`
//! restarts wins.

use ndarray::{Array2, ArrayView1, ArrayView2};
use proxlearn_helpers::{check_dimensions, DataPoint, DimensionMismatch, Distance, Float};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;
use tracing::{debug, info, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

mod configuration;

pub use configuration::MedoidConfiguration;
use configuration::checked_distance;

/// Upper bound on the neighbour-examination floor.
const MIN_NEIGHBOR_CAP: usize = 100;

/// Errors that can occur during CLARANS clustering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaransError {
    #[error("dataset is empty")]
    EmptyDataSet,
    #[error("number of clusters {k} must satisfy 1 <= k < {n}")]
    InvalidK { k: usize, n: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error(transparent)]
    InvalidRow(#[from] DimensionMismatch),
    #[error("distance metric returned a negative or NaN value")]
    InvalidDistance,
    #[error("medoid index {index} is out of range for {n} points")]
    MedoidOutOfRange { index: usize, n: usize },
    #[error("model has not been fitted")]
    NotFitted,
}

/// Hyperparameters for [`Clarans`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ClaransParams {
    /// Number of medoids `k`.
    pub num_clusters: usize,
    /// Number of restarts, i.e. local minima examined.
    pub num_local: usize,
    /// Consecutive rejected swaps before a restart gives up. Raised to
    /// `min(100, k * (n - k))` when smaller.
    pub max_neighbor: usize,
    /// RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for ClaransParams {
    fn default() -> Self {
        ClaransParams {
            num_clusters: 3,
            num_local: 6,
            max_neighbor: 4,
            seed: None,
        }
    }
}

impl ClaransParams {
    pub fn validate(&self) -> Result<(), ClaransError> {
        if self.num_clusters == 0 {
            return Err(ClaransError::InvalidConfig(
                "num_clusters must be at least 1".into(),
            ));
        }
        if self.num_local == 0 {
            return Err(ClaransError::InvalidConfig(
                "num_local must be at least 1".into(),
            ));
        }
        if self.max_neighbor == 0 {
            return Err(ClaransError::InvalidConfig(
                "max_neighbor must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// The per-restart search budget actually used for `n` points and `k`
/// medoids: `max_neighbor`, but never below `min(100, k * (n - k))`.
pub fn effective_max_neighbor(k: usize, n: usize, max_neighbor: usize) -> usize {
    let floor = (k * n.saturating_sub(k)).min(MIN_NEIGHBOR_CAP);
    max_neighbor.max(floor)
}

/// Chooses an initial configuration of `k` medoids, k-means++ style.
///
/// The first medoid is uniform; each further medoid is drawn with
/// probability proportional to the distance of a point to its nearest medoid
/// so far. Already chosen medoids are excluded from the draw, even under a
/// metric with `d(x, x) > 0`.
pub fn seed_configuration<F, D, R>(
    points: &[ArrayView1<F>],
    k: usize,
    distance: &D,
    rng: &mut R,
) -> Result<MedoidConfiguration<F>, ClaransError>
where
    F: Float,
    D: Distance<F>,
    R: Rng + ?Sized,
{
    let n = points.len();
    if k == 0 || k >= n {
        return Err(ClaransError::InvalidK { k, n });
    }

    let mut medoids = Vec::with_capacity(k);
    let mut nearest = vec![F::infinity(); n];
    let mut assignment = vec![0; n];
    medoids.push(rng.random_range(0..n));

    for slot in 0..k {
        relax_nearest(
            points,
            points[medoids[slot]],
            slot,
            distance,
            &mut nearest,
            &mut assignment,
        )?;
        if slot + 1 < k {
            let next = sample_by_distance(&nearest, &medoids, rng);
            medoids.push(next);
        }
    }

    let distortion = nearest.iter().copied().sum();
    Ok(MedoidConfiguration {
        medoids,
        assignment,
        distances: nearest,
        distortion,
    })
}

/// Lowers every point's nearest-medoid distance against the medoid in `slot`.
fn relax_nearest<F, D>(
    points: &[ArrayView1<F>],
    medoid: ArrayView1<F>,
    slot: usize,
    distance: &D,
    nearest: &mut [F],
    assignment: &mut [usize],
) -> Result<(), ClaransError>
where
    F: Float,
    D: Distance<F>,
{
    #[cfg(feature = "parallel")]
    {
        relax_nearest_par(points, medoid, slot, distance, nearest, assignment)
    }
    #[cfg(not(feature = "parallel"))]
    {
        relax_nearest_seq(points, medoid, slot, distance, nearest, assignment)
    }
}

#[cfg(feature = "parallel")]
fn relax_nearest_par<F, D>(
    points: &[ArrayView1<F>],
    medoid: ArrayView1<F>,
    slot: usize,
    distance: &D,
    nearest: &mut [F],
    assignment: &mut [usize],
) -> Result<(), ClaransError>
where
    F: Float,
    D: Distance<F>,
{
    nearest
        .par_iter_mut()
        .zip(assignment.par_iter_mut())
        .zip(points.par_iter())
        .try_for_each(|((best, owner), point)| {
            let d = checked_distance(distance, *point, medoid)?;
            if d < *best {
                *best = d;
                *owner = slot;
            }
            Ok(())
        })
}

#[cfg(any(test, not(feature = "parallel")))]
fn relax_nearest_seq<F, D>(
    points: &[ArrayView1<F>],
    medoid: ArrayView1<F>,
    slot: usize,
    distance: &D,
    nearest: &mut [F],
    assignment: &mut [usize],
) -> Result<(), ClaransError>
where
    F: Float,
    D: Distance<F>,
{
    for ((best, owner), point) in nearest.iter_mut().zip(assignment.iter_mut()).zip(points) {
        let d = checked_distance(distance, *point, medoid)?;
        if d < *best {
            *best = d;
            *owner = slot;
        }
    }
    Ok(())
}

/// Draws a point that is not yet a medoid, with probability proportional to
/// its nearest-medoid distance. The cutoff is uniform in `[0, total)`; if
/// every candidate has zero weight, one is drawn uniformly.
fn sample_by_distance<F, R>(nearest: &[F], chosen: &[usize], rng: &mut R) -> usize
where
    F: Float,
    R: Rng + ?Sized,
{
    let n = nearest.len();
    let weight = |i: usize| {
        if chosen.contains(&i) {
            F::zero()
        } else {
            nearest[i]
        }
    };

    let total: F = (0..n).map(weight).sum();
    if total > F::zero() {
        let cutoff = F::lossy(rng.random::<f64>()) * total;
        let mut cost = F::zero();
        for i in 0..n {
            cost += weight(i);
            if cost > cutoff {
                return i;
            }
        }
        if let Some(i) = (0..n).rposition(|i| weight(i) > F::zero()) {
            return i;
        }
    }

    // Every remaining point duplicates a medoid.
    let candidates: Vec<usize> = (0..n).filter(|i| !chosen.contains(i)).collect();
    candidates[rng.random_range(0..candidates.len())]
}

/// Swaps one random medoid for one random non-medoid point and re-evaluates
/// the whole assignment.
pub fn random_neighbor<F, D, R>(
    points: &[ArrayView1<F>],
    current: &MedoidConfiguration<F>,
    distance: &D,
    rng: &mut R,
) -> Result<MedoidConfiguration<F>, ClaransError>
where
    F: Float,
    D: Distance<F>,
    R: Rng + ?Sized,
{
    let candidates = current.non_medoids();
    if candidates.is_empty() {
        return Err(ClaransError::InvalidK {
            k: current.k(),
            n: points.len(),
        });
    }
    let slot = rng.random_range(0..current.k());
    let point = candidates[rng.random_range(0..candidates.len())];

    let mut medoids = current.medoids().to_vec();
    medoids[slot] = point;
    MedoidConfiguration::evaluate(points, medoids, distance)
}

/// Result of one restart's local search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMinimum<F: Float> {
    pub configuration: MedoidConfiguration<F>,
    /// Distortion of the starting configuration followed by that of every
    /// accepted swap.
    pub trajectory: Vec<F>,
    /// Number of neighbours evaluated.
    pub examined: usize,
}

/// Walks from `start` to a local minimum: a swap is accepted only when it
/// strictly lowers the distortion, which also resets the patience counter.
pub fn local_search<F, D, R>(
    points: &[ArrayView1<F>],
    start: MedoidConfiguration<F>,
    distance: &D,
    max_neighbor: usize,
    rng: &mut R,
) -> Result<LocalMinimum<F>, ClaransError>
where
    F: Float,
    D: Distance<F>,
    R: Rng + ?Sized,
{
    let mut current = start;
    let mut trajectory = vec![current.distortion()];
    let mut examined = 0;
    let mut rejected = 0;

    while rejected < max_neighbor {
        let candidate = random_neighbor(points, &current, distance, rng)?;
        examined += 1;
        if candidate.distortion() < current.distortion() {
            trace!(
                from = ?current.distortion(),
                to = ?candidate.distortion(),
                after = rejected,
                "accepted swap"
            );
            current = candidate;
            trajectory.push(current.distortion());
            rejected = 0;
        } else {
            rejected += 1;
        }
    }

    Ok(LocalMinimum {
        configuration: current,
        trajectory,
        examined,
    })
}

fn feature_views<L, F>(data: &[DataPoint<L, F>], k: usize) -> Result<Vec<ArrayView1<'_, F>>, ClaransError>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    if data.is_empty() {
        return Err(ClaransError::EmptyDataSet);
    }
    check_dimensions(data, data[0].dim())?;
    if k == 0 || k >= data.len() {
        return Err(ClaransError::InvalidK { k, n: data.len() });
    }
    Ok(data.iter().map(|dp| dp.features.view()).collect())
}

/// Clusters `data` into `k` groups around medoids.
///
/// Runs `num_local` restarts of seeding plus local search and returns the
/// configuration with the lowest distortion (the earliest one on ties).
/// Labels are ignored.
pub fn cluster<L, F, D, R>(
    data: &[DataPoint<L, F>],
    k: usize,
    distance: &D,
    num_local: usize,
    max_neighbor: usize,
    rng: &mut R,
) -> Result<MedoidConfiguration<F>, ClaransError>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
    R: Rng + ?Sized,
{
    let points = feature_views(data, k)?;
    if num_local == 0 {
        return Err(ClaransError::InvalidConfig(
            "num_local must be at least 1".into(),
        ));
    }
    if max_neighbor == 0 {
        return Err(ClaransError::InvalidConfig(
            "max_neighbor must be greater than 0".into(),
        ));
    }
    let n = points.len();
    let max_neighbor = effective_max_neighbor(k, n, max_neighbor);
    info!(n, k, num_local, max_neighbor, "running CLARANS");

    let mut best: Option<MedoidConfiguration<F>> = None;
    for restart in 0..num_local {
        let seed = seed_configuration(&points, k, distance, rng)?;
        let local = local_search(&points, seed, distance, max_neighbor, rng)?;
        debug!(
            restart,
            distortion = ?local.configuration.distortion(),
            accepted = local.trajectory.len() - 1,
            examined = local.examined,
            "restart finished"
        );
        if best
            .as_ref()
            .is_none_or(|b| local.configuration.distortion() < b.distortion())
        {
            best = Some(local.configuration);
        }
    }

    best.ok_or(ClaransError::InvalidConfig(
        "num_local must be at least 1".into(),
    ))
}

#[derive(Debug, Clone)]
struct Fitted<F: Float> {
    configuration: MedoidConfiguration<F>,
    medoids: Array2<F>,
}

/// A CLARANS clustering model.
#[derive(Debug, Clone)]
pub struct Clarans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    params: ClaransParams,
    distance: D,
    fitted: Option<Fitted<F>>,
}

impl<F, D> Clarans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    pub fn new(params: ClaransParams, distance: D) -> Self {
        Self {
            params,
            distance,
            fitted: None,
        }
    }

    pub fn params(&self) -> &ClaransParams {
        &self.params
    }

    pub fn number_of_clusters(&self) -> usize {
        self.params.num_clusters
    }

    /// Fits with an RNG seeded from `params.seed`, or from entropy if unset.
    pub fn fit<L>(&mut self, data: &[DataPoint<L, F>]) -> Result<MedoidConfiguration<F>, ClaransError>
    where
        L: Clone + Eq + Hash + Debug,
    {
        let seed = self.params.seed.unwrap_or_else(rand::random);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.fit_with_rng(data, &mut rng)
    }

    pub fn fit_with_rng<L, R>(
        &mut self,
        data: &[DataPoint<L, F>],
        rng: &mut R,
    ) -> Result<MedoidConfiguration<F>, ClaransError>
    where
        L: Clone + Eq + Hash + Debug,
        R: Rng + ?Sized,
    {
        self.params.validate()?;
        let configuration = cluster(
            data,
            self.params.num_clusters,
            &self.distance,
            self.params.num_local,
            self.params.max_neighbor,
            rng,
        )?;

        let mut medoids = Array2::zeros((configuration.k(), data[0].dim()));
        for (mut row, &m) in medoids.rows_mut().into_iter().zip(configuration.medoids()) {
            row.assign(&data[m].features);
        }
        self.fitted = Some(Fitted {
            configuration: configuration.clone(),
            medoids,
        });
        Ok(configuration)
    }

    /// Slot of the medoid nearest to `point`; ties go to the lowest slot.
    pub fn predict(&self, point: ArrayView1<F>) -> Result<usize, ClaransError> {
        let fitted = self.fitted.as_ref().ok_or(ClaransError::NotFitted)?;
        if point.len() != fitted.medoids.ncols() {
            return Err(ClaransError::DimensionMismatch {
                expected: fitted.medoids.ncols(),
                found: point.len(),
            });
        }
        let mut best = F::infinity();
        let mut idx = 0;
        for (i, medoid) in fitted.medoids.rows().into_iter().enumerate() {
            let d = checked_distance(&self.distance, point, medoid)?;
            if d < best {
                best = d;
                idx = i;
            }
        }
        Ok(idx)
    }

    /// Feature vectors of the fitted medoids, one row per slot.
    pub fn medoids(&self) -> Result<ArrayView2<'_, F>, ClaransError> {
        self.fitted
            .as_ref()
            .map(|f| f.medoids.view())
            .ok_or(ClaransError::NotFitted)
    }

    pub fn configuration(&self) -> Result<&MedoidConfiguration<F>, ClaransError> {
        self.fitted
            .as_ref()
            .map(|f| &f.configuration)
            .ok_or(ClaransError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use proxlearn_helpers::{FnDist, L1Dist, L2Dist};

    fn four_points() -> Vec<DataPoint<(), f64>> {
        vec![
            DataPoint::new(array![0.0, 0.0], ()),
            DataPoint::new(array![0.0, 1.0], ()),
            DataPoint::new(array![10.0, 10.0], ()),
            DataPoint::new(array![10.0, 11.0], ()),
        ]
    }

    /// Three blobs of eight points around (0, 0), (10, 10) and (20, 0).
    fn blobs() -> Vec<DataPoint<usize, f64>> {
        let centers = [(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)];
        let mut data = Vec::new();
        for (c, &(cx, cy)) in centers.iter().enumerate() {
            for i in 0..8 {
                let dx = (i % 3) as f64 * 0.5;
                let dy = (i / 3) as f64 * 0.4;
                data.push(DataPoint::new(array![cx + dx, cy + dy], c));
            }
        }
        data
    }

    fn views<L: Clone + Eq + Hash + Debug>(data: &[DataPoint<L, f64>]) -> Vec<ArrayView1<'_, f64>> {
        data.iter().map(|dp| dp.features.view()).collect()
    }

    #[test]
    fn test_four_point_scenario() {
        let data = four_points();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let config = cluster(&data, 2, &L2Dist, 3, 5, &mut rng).expect("clustering should succeed");

        assert_abs_diff_eq!(config.distortion(), 2.0);
        let mut medoids = config.medoids().to_vec();
        medoids.sort();
        assert!(medoids[0] < 2 && medoids[1] >= 2, "one medoid per pair: {:?}", medoids);

        let a = config.assignment();
        assert_eq!(a[0], a[1]);
        assert_eq!(a[2], a[3]);
        assert_ne!(a[0], a[2]);
    }

    #[test]
    fn test_four_point_scenario_with_l1() {
        let data = four_points();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let config = cluster(&data, 2, &L1Dist, 3, 5, &mut rng).unwrap();
        assert_abs_diff_eq!(config.distortion(), 2.0);
    }

    #[test]
    fn test_distortion_strictly_decreases_along_search() {
        let data = blobs();
        let points = views(&data);
        for seed in 0..5 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let start = seed_configuration(&points, 3, &L2Dist, &mut rng).unwrap();
            let start_distortion = start.distortion();
            let local = local_search(&points, start, &L2Dist, 20, &mut rng).unwrap();

            assert_eq!(local.trajectory[0], start_distortion);
            for pair in local.trajectory.windows(2) {
                assert!(pair[1] < pair[0], "trajectory must strictly decrease: {:?}", pair);
            }
            assert_eq!(
                *local.trajectory.last().unwrap(),
                local.configuration.distortion()
            );
            assert!(local.examined >= 20);
        }
    }

    #[test]
    fn test_blobs_are_separated() {
        let data = blobs();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let config = cluster(&data, 3, &L2Dist, 6, 4, &mut rng).unwrap();
        for members in config.clusters() {
            let label = data[members[0]].label;
            assert!(members.iter().all(|&i| data[i].label == label));
        }
    }

    #[test]
    fn test_k_equals_n_minus_one() {
        let data: Vec<DataPoint<(), f64>> = (0..4)
            .map(|i| DataPoint::new(array![i as f64], ()))
            .collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let config = cluster(&data, 3, &L2Dist, 2, 4, &mut rng).unwrap();

        let non_medoids = config.non_medoids();
        assert_eq!(non_medoids.len(), 1);
        assert_abs_diff_eq!(config.distortion(), 1.0);
        assert_abs_diff_eq!(config.distances()[non_medoids[0]], 1.0);
    }

    #[test]
    fn test_seeding_with_single_medoid() {
        let data = blobs();
        let points = views(&data);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let config = seed_configuration(&points, 1, &L2Dist, &mut rng).unwrap();

        assert_eq!(config.k(), 1);
        assert!(config.assignment().iter().all(|&slot| slot == 0));
        let medoid = points[config.medoids()[0]];
        let expected: f64 = points.iter().map(|&p| L2Dist.distance(p, medoid)).sum();
        assert_abs_diff_eq!(config.distortion(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_seeding_picks_distinct_medoids() {
        let data = blobs();
        let points = views(&data);
        for seed in 0..20 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let config = seed_configuration(&points, 5, &L2Dist, &mut rng).unwrap();
            let mut medoids = config.medoids().to_vec();
            medoids.sort();
            medoids.dedup();
            assert_eq!(medoids.len(), 5);
            for (slot, &m) in config.medoids().iter().enumerate() {
                assert_eq!(config.assignment()[m], slot);
                assert_eq!(config.distances()[m], 0.0);
            }
            let recomputed =
                MedoidConfiguration::evaluate(&points, config.medoids().to_vec(), &L2Dist).unwrap();
            assert_eq!(recomputed, config);
        }
    }

    #[test]
    fn test_seeding_excludes_medoids_under_constant_metric() {
        let data: Vec<DataPoint<(), f64>> = (0..10)
            .map(|i| DataPoint::new(array![i as f64], ()))
            .collect();
        let points = views(&data);
        let constant = FnDist(|_: ArrayView1<f64>, _: ArrayView1<f64>| 1.0);

        for seed in 0..50 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let config = seed_configuration(&points, 3, &constant, &mut rng).unwrap();
            let mut medoids = config.medoids().to_vec();
            medoids.sort();
            medoids.dedup();
            assert_eq!(medoids.len(), 3, "seed {} drew a medoid twice", seed);

            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let best = cluster(&data, 3, &constant, 2, 4, &mut rng).expect("clustering should succeed");
            assert_abs_diff_eq!(best.distortion(), 10.0);
        }
    }

    #[test]
    fn test_sampling_skips_chosen_points() {
        let nearest = [5.0, 1.0, 5.0, 1.0];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(17);
        for _ in 0..100 {
            let i = sample_by_distance(&nearest, &[0, 2], &mut rng);
            assert!(i == 1 || i == 3);
        }
        // All remaining weight is zero: fall back to a uniform non-medoid.
        let zeros = [0.0; 4];
        for _ in 0..100 {
            assert_eq!(sample_by_distance(&zeros, &[0, 1, 3], &mut rng), 2);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_and_sequential_relaxation_agree() {
        let data = blobs();
        let points = views(&data);
        let n = points.len();
        let mut par = (vec![f64::INFINITY; n], vec![0; n]);
        let mut seq = (vec![f64::INFINITY; n], vec![0; n]);
        for (slot, &m) in [3, 12, 20].iter().enumerate() {
            relax_nearest_par(&points, points[m], slot, &L2Dist, &mut par.0, &mut par.1).unwrap();
            relax_nearest_seq(&points, points[m], slot, &L2Dist, &mut seq.0, &mut seq.1).unwrap();
        }
        assert_eq!(par, seq);

        let broken = FnDist(|_: ArrayView1<f64>, _: ArrayView1<f64>| -1.0);
        let mut nearest = vec![f64::INFINITY; n];
        let mut assignment = vec![0; n];
        assert_eq!(
            relax_nearest_seq(&points, points[0], 0, &broken, &mut nearest, &mut assignment),
            Err(ClaransError::InvalidDistance)
        );
        assert_eq!(
            relax_nearest_par(&points, points[0], 0, &broken, &mut nearest, &mut assignment),
            Err(ClaransError::InvalidDistance)
        );
    }

    #[test]
    fn test_duplicate_points_terminate() {
        let data: Vec<DataPoint<(), f64>> = (0..5)
            .map(|_| DataPoint::new(array![3.0, 3.0], ()))
            .collect();
        let points = views(&data);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let start = seed_configuration(&points, 2, &L2Dist, &mut rng).unwrap();
        assert_eq!(start.distortion(), 0.0);

        let local = local_search(&points, start, &L2Dist, 10, &mut rng).unwrap();
        assert_eq!(local.examined, 10);
        assert_eq!(local.trajectory, vec![0.0]);
    }

    #[test]
    fn test_random_neighbor_swaps_exactly_one_medoid() {
        let data = blobs();
        let points = views(&data);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let current = seed_configuration(&points, 3, &L2Dist, &mut rng).unwrap();
        for _ in 0..10 {
            let neighbor = random_neighbor(&points, &current, &L2Dist, &mut rng).unwrap();
            let changed = current
                .medoids()
                .iter()
                .zip(neighbor.medoids())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(changed, 1);
            assert!(neighbor.medoids().iter().all(|&m| m < points.len()));
        }
    }

    #[test]
    fn test_max_neighbor_floor() {
        assert_eq!(effective_max_neighbor(2, 4, 1), 4);
        assert_eq!(effective_max_neighbor(2, 4, 5), 5);
        assert_eq!(effective_max_neighbor(3, 100, 4), 100);
        assert_eq!(effective_max_neighbor(3, 100, 250), 250);
    }

    #[test]
    fn test_configuration_errors() {
        let data = four_points();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert_eq!(
            cluster(&data, 0, &L2Dist, 3, 5, &mut rng),
            Err(ClaransError::InvalidK { k: 0, n: 4 })
        );
        assert_eq!(
            cluster(&data, 4, &L2Dist, 3, 5, &mut rng),
            Err(ClaransError::InvalidK { k: 4, n: 4 })
        );
        assert!(matches!(
            cluster(&data, 2, &L2Dist, 3, 0, &mut rng),
            Err(ClaransError::InvalidConfig(_))
        ));
        assert!(matches!(
            cluster(&data, 2, &L2Dist, 0, 5, &mut rng),
            Err(ClaransError::InvalidConfig(_))
        ));
        let empty: Vec<DataPoint<(), f64>> = vec![];
        assert_eq!(
            cluster(&empty, 2, &L2Dist, 3, 5, &mut rng),
            Err(ClaransError::EmptyDataSet)
        );

        let mut ragged = four_points();
        ragged.push(DataPoint::new(array![1.0], ()));
        assert_eq!(
            cluster(&ragged, 2, &L2Dist, 3, 5, &mut rng),
            Err(ClaransError::InvalidRow(DimensionMismatch {
                index: 4,
                expected: 2,
                found: 1
            }))
        );
    }

    #[test]
    fn test_nan_distance_is_rejected() {
        let data = four_points();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let broken = FnDist(|_: ArrayView1<f64>, _: ArrayView1<f64>| f64::NAN);
        assert_eq!(
            cluster(&data, 2, &broken, 3, 5, &mut rng),
            Err(ClaransError::InvalidDistance)
        );
    }

    #[test]
    fn test_model_fit_and_predict() {
        let data = blobs();
        let params = ClaransParams {
            num_clusters: 3,
            seed: Some(7),
            ..ClaransParams::default()
        };
        let mut model = Clarans::new(params, L2Dist);
        let config = model.fit(&data).expect("fit should succeed");

        assert_eq!(model.number_of_clusters(), 3);
        assert_eq!(model.medoids().unwrap().dim(), (3, 2));
        assert_eq!(model.configuration().unwrap(), &config);
        for (slot, &m) in config.medoids().iter().enumerate() {
            assert_eq!(model.medoids().unwrap().row(slot), data[m].features.view());
        }

        let near_first = model.predict(array![0.3, 0.2].view()).unwrap();
        let near_second = model.predict(array![10.2, 10.1].view()).unwrap();
        assert_eq!(near_first, config.assignment()[0]);
        assert_eq!(near_second, config.assignment()[8]);
        assert_ne!(near_first, near_second);
    }

    #[test]
    fn test_model_is_reproducible_with_seed() {
        let data = blobs();
        let params = ClaransParams {
            seed: Some(99),
            ..ClaransParams::default()
        };
        let first = Clarans::new(params.clone(), L2Dist).fit(&data).unwrap();
        let second = Clarans::new(params, L2Dist).fit(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_model_errors() {
        let model: Clarans<f64, L2Dist> = Clarans::new(ClaransParams::default(), L2Dist);
        assert_eq!(
            model.predict(array![0.0, 0.0].view()),
            Err(ClaransError::NotFitted)
        );
        assert!(matches!(model.medoids(), Err(ClaransError::NotFitted)));

        let mut model = Clarans::new(
            ClaransParams {
                num_clusters: 2,
                seed: Some(1),
                ..ClaransParams::default()
            },
            L2Dist,
        );
        model.fit(&four_points()).unwrap();
        assert_eq!(
            model.predict(array![0.0].view()),
            Err(ClaransError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );

        let mut bad = Clarans::new(
            ClaransParams {
                num_local: 0,
                ..ClaransParams::default()
            },
            L2Dist,
        );
        assert!(matches!(
            bad.fit(&four_points()),
            Err(ClaransError::InvalidConfig(_))
        ));
    }
}
