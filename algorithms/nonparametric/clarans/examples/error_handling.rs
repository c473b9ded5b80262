//! Walks through the error conditions CLARANS reports instead of panicking.

use clarans::{Clarans, ClaransError, ClaransParams, cluster};
use ndarray::{array, ArrayView1};
use proxlearn_helpers::{DataPoint, FnDist, L2Dist};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn main() {
    println!("CLARANS Error Handling Examples");
    println!("===============================");

    let data = vec![
        DataPoint::new(array![0.0, 0.0], ()),
        DataPoint::new(array![0.0, 1.0], ()),
        DataPoint::new(array![10.0, 10.0], ()),
        DataPoint::new(array![10.0, 11.0], ()),
    ];
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

    // k must leave at least one non-medoid point
    println!("\n1. Asking for as many clusters as points (k=4, n=4):");
    match cluster(&data, 4, &L2Dist, 3, 5, &mut rng) {
        Ok(_) => println!("   Clustering succeeded"),
        Err(e @ ClaransError::InvalidK { .. }) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    println!("\n2. Predicting before fitting:");
    let model: Clarans<f64, L2Dist> = Clarans::new(ClaransParams::default(), L2Dist);
    match model.predict(array![1.0, 1.0].view()) {
        Ok(slot) => println!("   Predicted cluster {}", slot),
        Err(ClaransError::NotFitted) => println!("   ✓ Caught expected error: {}", ClaransError::NotFitted),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    println!("\n3. A metric that returns NaN:");
    let broken = FnDist(|_: ArrayView1<f64>, _: ArrayView1<f64>| f64::NAN);
    match cluster(&data, 2, &broken, 3, 5, &mut rng) {
        Ok(_) => println!("   Clustering succeeded"),
        Err(ClaransError::InvalidDistance) => {
            println!("   ✓ Caught expected error: {}", ClaransError::InvalidDistance)
        }
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    println!("\n4. Rows with mismatched feature counts:");
    let mut ragged = data.clone();
    ragged.push(DataPoint::new(array![5.0], ()));
    match cluster(&ragged, 2, &L2Dist, 3, 5, &mut rng) {
        Ok(_) => println!("   Clustering succeeded"),
        Err(e @ ClaransError::InvalidRow(_)) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    println!("\n5. Successful fit:");
    let params = ClaransParams {
        num_clusters: 2,
        seed: Some(7),
        ..ClaransParams::default()
    };
    let mut model = Clarans::new(params, L2Dist);
    match model.fit(&data) {
        Ok(config) => {
            println!("   Medoids: {:?}", config.medoids());
            println!("   Distortion: {}", config.distortion());
            for point in [array![0.5, 0.5], array![9.0, 9.5]] {
                match model.predict(point.view()) {
                    Ok(slot) => println!("   {} -> cluster {}", point, slot),
                    Err(e) => println!("   ✗ Prediction failed: {}", e),
                }
            }
        }
        Err(e) => println!("   ✗ Fit failed: {}", e),
    }
}
