//! Property tests for the allocation engine.
//!
//! Two properties hold for every strategy under any input sequence:
//! - no arm's per-stratum allocation count ever exceeds its limit;
//! - a failed `allocate` call leaves the persisted statistics store
//!   byte-for-byte unchanged.

use proptest::prelude::*;
use trial_core::types::{Arm, Attribute, Group, Participant, Response, Trial};
use trial_engine::{AllocationError, Allocator};
use trial_store::{MemoryConnector, PersistenceProvider};

fn capped_trial(strategy: &str, limit_a: u64, limit_b: u64) -> Trial {
    let mut builder = Trial::builder()
        .name("capped")
        .strategy(strategy)
        .arm(Arm::with_limit("a", 1, limit_a))
        .arm(Arm::with_limit("b", 1, limit_b))
        .arm(Arm::new("overflow", 1))
        .default_arm("overflow");

    builder = match strategy {
        "BlockedRandomisation" => builder.parameter("blocksize", 6.0).parameter("delta", 3.0),
        "Minimisation" => builder.parameter("certainty", 0.8),
        _ => builder,
    };

    if strategy == "Minimisation" {
        builder = builder.attribute(Attribute::new(
            "smoker",
            1.0,
            false,
            vec![Group::discrete("yes", "yes"), Group::discrete("no", "no")],
        ));
    }

    builder.build().unwrap()
}

fn participant_for(strategy: &str, id: u64) -> Participant {
    let p = Participant::new(id);
    if strategy == "Minimisation" {
        let value = if id % 2 == 0 { "yes" } else { "no" };
        p.with_response("smoker", Response::Discrete(value.to_string()))
    } else {
        p
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn capacity_invariant_holds_for_every_strategy(
        seed in any::<u64>(),
        limit_a in 0u64..8,
        limit_b in 0u64..8,
        n in 1u64..60,
    ) {
        for strategy in ["SimpleRandomisation", "BlockedRandomisation", "Minimisation"] {
            let trial = capped_trial(strategy, limit_a, limit_b);
            let allocator = Allocator::with_seed(MemoryConnector::new(), seed);
            allocator.register(&trial).unwrap();

            for id in 0..n {
                allocator
                    .allocate(&trial, &participant_for(strategy, id))
                    .unwrap();

                let statistics = allocator.provider().load_statistics(&trial).unwrap();
                prop_assert!(statistics.allocation_count("", "a") <= limit_a);
                prop_assert!(statistics.allocation_count("", "b") <= limit_b);
            }
        }
    }

    #[test]
    fn failed_allocations_leave_statistics_untouched(seed in any::<u64>()) {
        // A minimisation trial whose participant lacks the factor
        // response: the strategy must fail after statistics were loaded
        // but before anything was written back.
        let trial = capped_trial("Minimisation", 5, 5);
        let allocator = Allocator::with_seed(MemoryConnector::new(), seed);
        allocator.register(&trial).unwrap();

        allocator.allocate(&trial, &participant_for("Minimisation", 0)).unwrap();
        let before = allocator.provider().load_statistics(&trial).unwrap();

        let err = allocator.allocate(&trial, &Participant::new(1)).unwrap_err();
        let is_missing_response = matches!(err, AllocationError::MissingResponse { .. });
        prop_assert!(is_missing_response);
        prop_assert_eq!(allocator.provider().load_statistics(&trial).unwrap(), before);
    }

    #[test]
    fn stratum_failures_abort_before_any_mutation(seed in any::<u64>()) {
        let trial = Trial::builder()
            .name("stratified")
            .strategy("SimpleRandomisation")
            .arm(Arm::new("a", 1))
            .attribute(Attribute::new(
                "age",
                1.0,
                true,
                vec![Group::range("young", 0.0, 40.0), Group::range("old", 40.0, 120.0)],
            ))
            .build()
            .unwrap();

        let allocator = Allocator::with_seed(MemoryConnector::new(), seed);
        allocator.register(&trial).unwrap();
        let before = allocator.provider().load_statistics(&trial).unwrap();

        // Missing response and unclassifiable response both abort.
        let err = allocator.allocate(&trial, &Participant::new(1)).unwrap_err();
        prop_assert!(matches!(err, AllocationError::MissingStratificationData(_)));

        let err = allocator
            .allocate(&trial, &Participant::new(2).with_numeric("age", 250.0))
            .unwrap_err();
        prop_assert!(matches!(err, AllocationError::MissingStratificationData(_)));

        prop_assert_eq!(allocator.provider().load_statistics(&trial).unwrap(), before);
        prop_assert_eq!(allocator.provider().allocation_count("stratified"), 0);
    }
}
