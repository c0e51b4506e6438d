use hdrhistogram::Histogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stable_match::{Engine, Instance, PreferenceStore};
use std::time::Instant;

/// `n` shuffled permutations of `0..n`
fn random_lists(rng: &mut ChaCha8Rng, n: usize) -> Vec<Vec<usize>> {
    (0..n)
        .map(|_| {
            let mut list: Vec<usize> = (0..n).collect();
            list.shuffle(rng);
            list
        })
        .collect()
}

/// Random complete instance with `n` agents per side
fn random_instance(rng: &mut ChaCha8Rng, n: usize) -> Instance {
    let proposers = random_lists(rng, n);
    let responders = random_lists(rng, n);
    let store =
        PreferenceStore::new(proposers, responders).expect("shuffled lists are permutations");
    let names = (0..n).map(|i| i.to_string()).collect::<Vec<_>>();
    Instance::new(names.clone(), names, store).expect("name counts match")
}

fn main() {
    println!("Preparing Latency Benchmark...");

    const ITERATIONS: u64 = 10_000;
    const SIZES: [usize; 4] = [8, 32, 128, 512];

    let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF);

    for n in SIZES {
        // Pre-build instances so only the run itself is timed
        let iterations = ITERATIONS / n as u64 + 10;
        let instances: Vec<_> = (0..iterations).map(|_| random_instance(&mut rng, n)).collect();

        let mut histogram = Histogram::<u64>::new_with_bounds(1, 10_000_000_000, 3).unwrap();
        let mut total_duration = std::time::Duration::new(0, 0);
        let mut total_proposals = 0u64;

        for instance in instances {
            let mut engine = Engine::new(instance);

            // Critical measurement section
            let start = Instant::now();
            std::hint::black_box(engine.run().expect("valid instance converges"));
            let elapsed = start.elapsed();

            histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
            total_duration += elapsed;
            total_proposals += engine.stats().proposals;
        }

        println!("\n=== Latency Report n={} (ns per run) ===", n);
        println!("Runs:       {}", iterations);
        println!("Runs/sec:   {:.2}", iterations as f64 / total_duration.as_secs_f64());
        println!(
            "Proposals:  {:.1} avg (bound {})",
            total_proposals as f64 / iterations as f64,
            n * n
        );
        println!("---------------------------");
        println!("Min:    {:10} ns", histogram.min());
        println!("P50:    {:10} ns", histogram.value_at_quantile(0.50));
        println!("P90:    {:10} ns", histogram.value_at_quantile(0.90));
        println!("P99:    {:10} ns", histogram.value_at_quantile(0.99));
        println!("Max:    {:10} ns", histogram.max());
    }
}
