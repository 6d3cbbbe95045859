//! Integration tests for surrogate table construction and its reductions.

mod common;

use common::{abs_correlation, candidate, coupled_source, smoothness};
use surrogate_significance::{
    build_surrogate_table, column_max, column_min, permute_realisations,
    sort_columns_ascending, CurrentValue, PermutationRange, PermutationTestConfig,
    RealisationSource, ReplicationIndex, SecureRng,
};

const CURRENT_VALUE: CurrentValue = CurrentValue {
    process: 0,
    sample: 2,
};

fn config(seed: u64) -> PermutationTestConfig {
    PermutationTestConfig {
        n_permutations: 30,
        ..PermutationTestConfig::quick()
    }
    .with_seed(seed)
}

/// Test scenario: the same seed reproduces a table, another seed does not
#[test]
fn test_table_reproducible_from_seed() {
    for n_replications in [1, 4] {
        let source = coupled_source(n_replications, 50, 3);
        let target = source.current_value_realisations(&CURRENT_VALUE);
        let candidates = [candidate(1, 1), candidate(2, 1), candidate(2, 2)];

        let build = |seed: u64| {
            build_surrogate_table(
                &candidates,
                None,
                CURRENT_VALUE,
                &target,
                &source,
                &abs_correlation,
                &config(seed),
            )
            .unwrap()
        };

        let first = build(99);
        assert_eq!(first.n_candidates(), 3);
        assert_eq!(first.n_permutations(), 30);
        assert_eq!(first, build(99));
        assert_ne!(first, build(100));
    }
}

/// Test scenario: reductions of a built table agree with each other
#[test]
fn test_reductions_of_built_table() {
    let source = coupled_source(1, 60, 8);
    let target = source.current_value_realisations(&CURRENT_VALUE);
    let candidates = [candidate(1, 1), candidate(1, 2), candidate(2, 1)];
    let table = build_surrogate_table(
        &candidates,
        None,
        CURRENT_VALUE,
        &target,
        &source,
        &abs_correlation,
        &config(5),
    )
    .unwrap();

    let sorted = sort_columns_ascending(&table);
    assert_eq!(sorted.row(0), column_min(&table).as_slice());
    assert_eq!(sorted.row(2), column_max(&table).as_slice());
    for p in 0..table.n_permutations() {
        assert!(sorted.get(0, p) <= sorted.get(1, p));
        assert!(sorted.get(1, p) <= sorted.get(2, p));
    }
}

/// Test scenario: block shuffling keeps a ramp far smoother than free shuffling
#[test]
fn test_block_range_limits_shuffling() {
    let n_samples = 62;
    let source = common::InMemorySource {
        data: vec![
            vec![(0..n_samples).map(|t| t as f64).collect()],
            vec![(0..n_samples).map(|t| t as f64).collect()],
        ],
    };
    let target = source.current_value_realisations(&CURRENT_VALUE);
    let ramp = [candidate(1, 1)];

    let table_with = |range: PermutationRange| {
        let config = PermutationTestConfig {
            permutation_range: range,
            ..config(17)
        };
        build_surrogate_table(&ramp, None, CURRENT_VALUE, &target, &source, &smoothness, &config)
            .unwrap()
    };

    // 60 rows in blocks of 3: at most 3 within a block, at most 5 across a boundary
    let blocked = table_with(PermutationRange::Block(3));
    assert!(blocked.row(0).iter().all(|&v| v >= -(20.0 * 3.0 + 19.0 * 5.0)));

    let free = table_with(PermutationRange::Replication);
    let mean_free = free.row(0).iter().sum::<f64>() / free.n_permutations() as f64;
    let mean_blocked = blocked.row(0).iter().sum::<f64>() / blocked.n_permutations() as f64;
    assert!(mean_blocked > mean_free);
}

/// Test scenario: shuffled realisations are a per-replication rearrangement
#[test]
fn test_shuffle_preserves_replication_contents() {
    let source = coupled_source(3, 25, 4);
    let (realisations, index) = source
        .get_realisations(&CURRENT_VALUE, &[candidate(1, 1), candidate(2, 1)])
        .unwrap();
    assert_eq!(index, ReplicationIndex::contiguous(3, 23));

    let mut rng = SecureRng::with_seed(10);
    for range in [PermutationRange::Replication, PermutationRange::Block(4)] {
        let shuffled = permute_realisations(&realisations, &index, range, &mut rng).unwrap();
        for rows in index.row_groups() {
            let mut before: Vec<Vec<f64>> =
                rows.iter().map(|&r| realisations.row(r).to_vec()).collect();
            let mut after: Vec<Vec<f64>> =
                rows.iter().map(|&r| shuffled.row(r).to_vec()).collect();
            before.sort_by(|a, b| a[0].total_cmp(&b[0]));
            after.sort_by(|a, b| a[0].total_cmp(&b[0]));
            assert_eq!(before, after);
        }
    }
}
