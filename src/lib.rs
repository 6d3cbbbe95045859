//! # Surrogate Significance
//!
//! Permutation-based significance testing for greedy conditional-dependency
//! search in multivariate time series, e.g. network inference with transfer
//! entropy.
//!
//! A search algorithm proposes candidate source variables and estimates how
//! much each one adds to the prediction of a target (a conditional mutual
//! information, for instance). This crate decides whether such a value is
//! larger than chance by rebuilding it many times on surrogate data, where the
//! temporal relation between candidate and target has been destroyed by
//! shuffling, and comparing the observed value with that null distribution.
//!
//! ## Key Features
//!
//! - **Surrogate Generation**: replication-level permutation through the data
//!   container, or time shuffling within replications (optionally in blocks)
//! - **Surrogate Tables**: `candidates × permutations` re-estimation, run on the
//!   rayon pool with independently seeded streams per cell
//! - **Order Statistics**: per-permutation maxima, minima and sorted columns
//! - **Test Procedures**: omnibus, max-statistic, min-statistic and sequential
//!   max-statistic tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use surrogate_significance::{
//!     max_statistic, Candidate, CurrentValue, EstimatorError, PermutationTestConfig,
//!     RealisationMatrix, RealisationSource, SearchState,
//! };
//!
//! fn test_candidate<S: RealisationSource>(
//!     source: &S,
//!     target: RealisationMatrix,
//!     remaining: &[Candidate],
//!     observed: f64,
//! ) -> Result<bool, Box<dyn std::error::Error>> {
//!     // Any estimator with this shape works; a closure is enough
//!     let estimator = |src: &RealisationMatrix,
//!                      tgt: &RealisationMatrix,
//!                      _cond: Option<&RealisationMatrix>|
//!      -> Result<f64, EstimatorError> {
//!         let n = src.n_rows() as f64;
//!         Ok(src.column(0).iter().zip(tgt.column(0)).map(|(a, b)| a * b).sum::<f64>() / n)
//!     };
//!
//!     let current_value = CurrentValue { process: 0, sample: 5 };
//!     let state = SearchState::new(current_value, target, Vec::new(), None)?;
//!     let config = PermutationTestConfig::standard().with_seed(42);
//!
//!     let outcome = max_statistic(&estimator, source, &state, remaining, observed, &config)?;
//!     Ok(outcome.significant)
//! }
//! ```
//!
//! ## Architecture
//!
//! The dependency estimator and the data container are external collaborators,
//! consumed through [`DependencyEstimator`] and [`RealisationSource`]. The
//! procedures in [`significance_tests`] drive [`surrogate_table`], which in turn
//! uses [`permutation`] or the source's own replication permutation, reduce the
//! table with [`order_statistics`] and decide with [`p_value`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod realisations;
pub mod secure_rng;

// Testing machinery
pub mod order_statistics;
pub mod p_value;
pub mod permutation;
pub mod surrogate_table;

// Re-exports for convenience - main public API
pub use config::{
    PermutationRange, PermutationTestConfig, SequentialConditioning, SignificanceSettings,
};
pub use errors::{EstimatorError, SignificanceError, SignificanceResult};
pub use realisations::{
    Candidate, CurrentValue, DependencyEstimator, RealisationMatrix, RealisationSource,
    ReplicationIndex,
};
pub use secure_rng::SecureRng;

pub use order_statistics::{
    column_max, column_min, sort_columns_ascending, sort_columns_descending,
};
pub use p_value::{evaluate, Tail, TestOutcome};
pub use permutation::{permute_realisations, within_replication_permutation};
pub use significance_tests::{
    max_statistic, max_statistic_sequential, min_statistic, omnibus_test, PermutationTests,
    SearchState, SequentialTestOutcome,
};
pub use surrogate_table::{
    build_surrogate_table, ProgressCallback, SurrogateConditioning, SurrogateProgress,
    SurrogateTable, SurrogateTableBuilder,
};
