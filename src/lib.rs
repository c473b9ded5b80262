//! Prototype- and medoid-based learners over `ndarray` feature vectors.
//!
//! * [`glvq`]: Generalized Learning Vector Quantization classifier.
//! * [`clarans`]: randomized k-medoids clustering.
//!
//! The shared data model ([`DataPoint`]) and distance metrics live in
//! `proxlearn-helpers` and are re-exported here.

pub use proxlearn_helpers::{
    check_dimensions, DataPoint, DimensionMismatch, Distance, Float, FnDist, L1Dist, L2Dist,
    LInfDist, LpDist,
};

pub use clarans;
pub use glvq;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cluster_then_classify() {
        let data = vec![
            DataPoint::new(array![0.0, 0.0], 0usize),
            DataPoint::new(array![0.5, 0.2], 0),
            DataPoint::new(array![0.1, 0.6], 0),
            DataPoint::new(array![8.0, 8.0], 1),
            DataPoint::new(array![8.4, 7.9], 1),
            DataPoint::new(array![7.8, 8.3], 1),
        ];

        let mut clusters = clarans::Clarans::new(
            clarans::ClaransParams {
                num_clusters: 2,
                seed: Some(3),
                ..Default::default()
            },
            L2Dist,
        );
        let config = clusters.fit(&data).unwrap();
        assert_eq!(config.clusters().len(), 2);
        assert_ne!(config.assignment()[0], config.assignment()[3]);

        let params = glvq::GlvqParams {
            learning_rate: 0.05,
            epochs: 20,
            init: glvq::PrototypeInit::ClassMean,
            ..Default::default()
        };
        let model = glvq::fit_with_seed(&data, 2, 2, &params, 3).unwrap();
        for dp in &data {
            assert_eq!(model.predict(dp.features.view()).unwrap(), dp.label);
        }
        assert_abs_diff_eq!(
            model.predict_distribution(array![8.1, 8.1].view()).unwrap().sum(),
            1.0
        );
    }
}
