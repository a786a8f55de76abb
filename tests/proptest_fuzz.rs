//! Property-based tests (fuzzing) for validation and eviction arithmetic.
//!
//! Uses proptest to generate random content, usage figures and store
//! layouts, and verifies that the budget stays in bounds and that only the
//! oldest confessions are ever removed.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;

use confession_board::confession::{validate_content, ValidationError, MAX_CONTENT_CHARS};
use confession_board::eviction::budget::{count_cap_budget, ByteBudget};
use confession_board::{
    BoardConfig, ConfessionStore, EvictionEngine, EvictionMode, InMemoryStore, UsageEstimate,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Usage figures as the estimator would produce them for some store
fn usage_strategy() -> impl Strategy<Value = UsageEstimate> {
    (prop::collection::vec(0usize..=MAX_CONTENT_CHARS, 0..300), 1u64..=4, 0u64..=500)
        .prop_map(|(lengths, bytes_per_char, overhead)| {
            UsageEstimate::from_lengths(&lengths, bytes_per_char, overhead, 1024 * 1024)
        })
}

/// Arbitrary JSON values, including ones that are not config objects at all
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::hash_map(
                prop_oneof![
                    Just("mode".to_string()),
                    Just("capacityMB".to_string()),
                    Just("thresholdPercent".to_string()),
                    Just("targetPercent".to_string()),
                    Just("maxRecords".to_string()),
                    ".*",
                ],
                inner,
                0..8,
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

// =============================================================================
// Content Validation
// =============================================================================

proptest! {
    /// Accepted iff 1..=2000 characters, whatever the byte length
    #[test]
    fn fuzz_validation_follows_char_count(content in "\\PC{0,2100}") {
        let chars = content.chars().count();
        match validate_content(&content) {
            Ok(()) => prop_assert!(chars >= 1 && chars <= MAX_CONTENT_CHARS),
            Err(ValidationError::Missing) => prop_assert_eq!(chars, 0),
            Err(ValidationError::TooLong { len, max }) => {
                prop_assert_eq!(len, chars);
                prop_assert_eq!(max, MAX_CONTENT_CHARS);
                prop_assert!(chars > MAX_CONTENT_CHARS);
            }
        }
    }

    /// Config parsing should never panic on arbitrary JSON
    #[test]
    fn fuzz_config_from_arbitrary_json(value in arbitrary_json_strategy()) {
        let json = value.to_string();
        if let Ok(config) = BoardConfig::from_json_str(&json) {
            // Anything that parses has passed validation
            prop_assert!(config.capacity_mb > 0);
            prop_assert!((0.0..=100.0).contains(&config.threshold_percent));
        }
    }
}

// =============================================================================
// Budget Bounds
// =============================================================================

proptest! {
    /// A triggered budget is at least min(min_batch, count) and at most count
    #[test]
    fn fuzz_byte_budget_within_bounds(
        usage in usage_strategy(),
        threshold in 0.0f64..=100.0,
        target in 0.0f64..=100.0,
        min_delete_batch in 0usize..50,
    ) {
        let rules = ByteBudget {
            capacity_bytes: 1024 * 1024,
            threshold_percent: threshold,
            target_percent: target,
            min_delete_batch,
        };
        let budget = rules.budget(&usage) as u64;
        let count = usage.confession_count;

        if rules.exceeds_threshold(&usage) {
            prop_assert!(budget <= count);
            prop_assert!(budget >= (min_delete_batch as u64).min(count));
        } else {
            prop_assert_eq!(budget, 0);
        }
    }

    /// Deleting the budget at average size lands at or under the target
    #[test]
    fn fuzz_byte_budget_reaches_target(
        count in 1u64..5_000,
        avg in 100u64..=4_100,
        target in 1.0f64..=100.0,
    ) {
        let capacity = 1024 * 1024;
        let total = count * avg;
        let usage = UsageEstimate {
            total_bytes_estimate: total,
            percent_used: total as f64 / capacity as f64 * 100.0,
            confession_count: count,
        };
        let rules = ByteBudget {
            capacity_bytes: capacity,
            threshold_percent: 0.0,
            target_percent: target,
            min_delete_batch: 0,
        };

        let budget = rules.budget(&usage) as u64;
        let remaining_bytes = (count - budget) as f64 * avg as f64;
        prop_assert!(remaining_bytes <= target / 100.0 * capacity as f64 + 1e-6 || budget == count);
    }

    /// Count cap removes exactly the excess
    #[test]
    fn fuzz_count_cap_budget(count in 0u64..1_000_000, max_records in 0u64..1_000_000) {
        let budget = count_cap_budget(count, max_records) as u64;
        prop_assert_eq!(budget, count.saturating_sub(max_records));
    }

    /// Estimating never panics, even with lengths that overflow when summed
    #[test]
    fn fuzz_estimate_extreme_lengths(
        lengths in prop::collection::vec(any::<usize>(), 0..20),
        bytes_per_char in any::<u64>(),
        overhead in any::<u64>(),
        capacity in any::<u64>(),
    ) {
        let usage = UsageEstimate::from_lengths(&lengths, bytes_per_char, overhead, capacity);
        prop_assert_eq!(usage.confession_count, lengths.len() as u64);
        prop_assert!(usage.percent_used >= 0.0);
    }
}

// =============================================================================
// Oldest-first Deletion
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Survivors are always the newest records by (created_at, insertion order)
    #[test]
    fn fuzz_eviction_removes_oldest_prefix(
        timestamps in prop::collection::vec(0i64..20, 1..60),
        max_records in 0u64..60,
    ) {
        let rt = runtime();
        let store = Arc::new(InMemoryStore::new());

        let mut expected = Vec::new();
        for (seq, ts) in timestamps.iter().enumerate() {
            let c = store.create_at(&format!("record {}", seq), *ts).unwrap();
            expected.push((*ts, seq, c.id));
        }
        expected.sort_by_key(|(ts, seq, _)| (*ts, *seq));

        let config = BoardConfig {
            mode: EvictionMode::CountCap,
            max_records,
            ..Default::default()
        };
        let engine = EvictionEngine::from_config(store.clone(), &config);
        let report = rt.block_on(engine.run_check());

        let total = timestamps.len() as u64;
        let kept = total.min(max_records) as usize;
        prop_assert_eq!(report.deleted, total - kept as u64);

        let survivors: Vec<_> = rt
            .block_on(store.list_oldest(usize::MAX))
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        let expected_ids: Vec<_> = expected[expected.len() - kept..]
            .iter()
            .map(|(_, _, id)| id.clone())
            .collect();
        prop_assert_eq!(survivors, expected_ids);
    }
}
