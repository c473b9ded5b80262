// Trains GLVQ and runs CLARANS on a small synthetic dataset.
// Set RUST_LOG=debug (or trace) to follow the training loops.
use ndarray::Array1;
use proxlearn::clarans::{Clarans, ClaransParams};
use proxlearn::glvq::{self, GlvqParams, PrototypeInit};
use proxlearn::{DataPoint, L1Dist, L2Dist};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn blobs(rng: &mut impl Rng) -> Vec<DataPoint<usize, f64>> {
    let centers = [[0.0, 0.0], [6.0, 6.0], [12.0, 0.0]];
    let mut data = Vec::new();
    for (class, center) in centers.iter().enumerate() {
        for _ in 0..30 {
            let features = Array1::from_shape_fn(2, |i| center[i] + rng.random_range(-1.5..1.5));
            data.push(DataPoint::new(features, class));
        }
    }
    data
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let data = blobs(&mut rng);

    let params = GlvqParams {
        num_codebook: 2,
        learning_rate: 0.05,
        epochs: 30,
        init: PrototypeInit::ClassSample,
    };
    match glvq::fit_with_rng(&data, 3, 2, &params, &mut rng) {
        Ok(model) => {
            let correct = data
                .iter()
                .filter(|dp| model.predict(dp.features.view()).ok() == Some(dp.label))
                .count();
            info!(
                correct,
                total = data.len(),
                skipped = model.skipped_updates(),
                "GLVQ training accuracy"
            );
        }
        Err(e) => error!(%e, "GLVQ training failed"),
    }

    let params = ClaransParams {
        num_clusters: 3,
        seed: Some(7),
        ..ClaransParams::default()
    };
    let mut euclidean = Clarans::new(params.clone(), L2Dist);
    match euclidean.fit(&data) {
        Ok(config) => info!(
            medoids = ?config.medoids(),
            distortion = config.distortion(),
            "CLARANS (L2)"
        ),
        Err(e) => error!(%e, "CLARANS failed"),
    }

    let mut manhattan = Clarans::new(params, L1Dist);
    match manhattan.fit(&data) {
        Ok(config) => info!(
            medoids = ?config.medoids(),
            distortion = config.distortion(),
            "CLARANS (L1)"
        ),
        Err(e) => error!(%e, "CLARANS failed"),
    }
}
