//! Allocation throughput benchmarks.
//!
//! One `allocate` call per iteration against the in-memory connector,
//! for each of the three strategies. Arms are unbounded so the benchmark
//! never hits the trial-full path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trial_core::types::{Arm, Attribute, Group, Participant, Response, Trial};
use trial_engine::Allocator;
use trial_store::MemoryConnector;

fn simple_trial() -> Trial {
    Trial::builder()
        .name("bench-simple")
        .strategy("SimpleRandomisation")
        .arm(Arm::new("a", 1))
        .arm(Arm::new("b", 2))
        .arm(Arm::new("c", 1))
        .build()
        .unwrap()
}

fn blocked_trial() -> Trial {
    Trial::builder()
        .name("bench-blocked")
        .strategy("BlockedRandomisation")
        .arm(Arm::new("a", 1))
        .arm(Arm::new("b", 1))
        .parameter("blocksize", 8.0)
        .parameter("delta", 4.0)
        .build()
        .unwrap()
}

fn minimisation_trial() -> Trial {
    Trial::builder()
        .name("bench-minimisation")
        .strategy("Minimisation")
        .arm(Arm::new("a", 1))
        .arm(Arm::new("b", 1))
        .parameter("certainty", 0.9)
        .attribute(Attribute::new(
            "smoker",
            1.0,
            false,
            vec![Group::discrete("yes", "yes"), Group::discrete("no", "no")],
        ))
        .attribute(Attribute::new(
            "bmi",
            2.0,
            false,
            vec![
                Group::range("low", 0.0, 25.0),
                Group::range("high", 25.0, 100.0),
            ],
        ))
        .build()
        .unwrap()
}

fn participant(id: u64) -> Participant {
    let smoker = if id % 3 == 0 { "yes" } else { "no" };
    Participant::new(id)
        .with_response("smoker", Response::Discrete(smoker.to_string()))
        .with_numeric("bmi", 18.0 + (id % 20) as f64)
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");

    for (label, trial) in [
        ("simple", simple_trial()),
        ("blocked", blocked_trial()),
        ("minimisation", minimisation_trial()),
    ] {
        let allocator = Allocator::with_seed(MemoryConnector::new(), 42);
        allocator.register(&trial).unwrap();

        let mut id = 0u64;
        group.bench_function(label, |b| {
            b.iter(|| {
                id += 1;
                let arm = allocator
                    .allocate(black_box(&trial), black_box(&participant(id)))
                    .unwrap();
                black_box(arm)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_allocate);
criterion_main!(benches);
