use glvq::{fit_with_seed, GlvqParams, PrototypeIndex, PrototypeInit};
use ndarray::array;
use proxlearn_helpers::DataPoint;

fn main() {
    let data = vec![
        // Class 0 - around (2, 3)
        DataPoint::new(array![1.5, 2.5], 0),
        DataPoint::new(array![2.0, 3.0], 0),
        DataPoint::new(array![2.5, 3.5], 0),
        DataPoint::new(array![1.8, 2.8], 0),
        // Class 1 - around (7, 6)
        DataPoint::new(array![6.5, 5.5], 1),
        DataPoint::new(array![7.0, 6.0], 1),
        DataPoint::new(array![7.5, 6.5], 1),
        DataPoint::new(array![6.8, 5.8], 1),
        // Class 2 - around (5, 8.5)
        DataPoint::new(array![4.5, 8.0], 2),
        DataPoint::new(array![5.0, 8.5], 2),
        DataPoint::new(array![5.5, 9.0], 2),
        DataPoint::new(array![4.8, 8.3], 2),
    ];

    let inits = vec![
        ("Uniform [0, 100)", PrototypeInit::default()),
        ("ClassSample", PrototypeInit::ClassSample),
        ("ClassMean", PrototypeInit::ClassMean),
    ];

    for (name, init) in inits {
        println!("\n--- {} ---", name);
        let params = GlvqParams {
            num_codebook: 1,
            learning_rate: 0.1,
            epochs: 100,
            init,
        };
        match fit_with_seed(&data, 3, 2, &params, 42) {
            Ok(model) => {
                for class in 0..3 {
                    let proto = model.codebook().prototype(PrototypeIndex { class, slot: 0 });
                    println!("  class {}: [{:.3}, {:.3}]", class, proto[0], proto[1]);
                }
                let correct = data
                    .iter()
                    .filter(|dp| model.predict(dp.features.view()) == Ok(dp.label))
                    .count();
                println!("  training accuracy: {}/{}", correct, data.len());
                println!("  skipped updates: {}", model.skipped_updates());
            }
            Err(e) => println!("  training failed: {}", e),
        }
    }
}
