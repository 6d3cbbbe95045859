//! Surrogate tables: dependency values re-estimated under the null hypothesis.
//!
//! For every row (a candidate, or a joint set of candidates) and every
//! permutation, the row's realisations are shuffled against the current value
//! and the estimator is called again with the row's conditioning set. This is
//! the dominant cost of every test procedure: `rows × n_permutations`
//! estimator calls.
//!
//! Cells are independent. Each one draws from its own RNG seeded with
//! `mix_seed(base_seed, cell_index)` and writes to its own slot, so a table
//! built on the rayon pool is identical to one built sequentially with the same
//! seed.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    config::PermutationTestConfig,
    errors::{validate_finite, SignificanceError, SignificanceResult},
    permutation::permute_realisations,
    realisations::{
        Candidate, CurrentValue, DependencyEstimator, RealisationMatrix, RealisationSource,
        ReplicationIndex,
    },
    secure_rng::{mix_seed, resolve_base_seed, SecureRng},
};

/// Table of surrogate values, one row per candidate and one column per
/// permutation, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateTable {
    values: Vec<f64>,
    n_candidates: usize,
    n_permutations: usize,
}

impl SurrogateTable {
    /// Build from a row-major buffer.
    pub fn new(
        values: Vec<f64>,
        n_candidates: usize,
        n_permutations: usize,
    ) -> SignificanceResult<Self> {
        if values.len() != n_candidates * n_permutations {
            return Err(SignificanceError::ShapeMismatch {
                context: "SurrogateTable::new".to_string(),
                expected: n_candidates * n_permutations,
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            n_candidates,
            n_permutations,
        })
    }

    pub(crate) fn from_raw(values: Vec<f64>, n_candidates: usize, n_permutations: usize) -> Self {
        debug_assert_eq!(values.len(), n_candidates * n_permutations);
        Self {
            values,
            n_candidates,
            n_permutations,
        }
    }

    /// Build from one vector of surrogate values per candidate.
    pub fn from_rows(rows: &[Vec<f64>]) -> SignificanceResult<Self> {
        let n_permutations = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * n_permutations);
        for row in rows {
            if row.len() != n_permutations {
                return Err(SignificanceError::ShapeMismatch {
                    context: "SurrogateTable::from_rows".to_string(),
                    expected: n_permutations,
                    actual: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            n_candidates: rows.len(),
            n_permutations,
        })
    }

    /// Number of rows.
    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    /// Number of columns.
    pub fn n_permutations(&self) -> usize {
        self.n_permutations
    }

    /// Surrogate value of `candidate` under `permutation`.
    pub fn get(&self, candidate: usize, permutation: usize) -> f64 {
        self.values[candidate * self.n_permutations + permutation]
    }

    /// All surrogate values of one candidate.
    pub fn row(&self, candidate: usize) -> &[f64] {
        let start = candidate * self.n_permutations;
        &self.values[start..start + self.n_permutations]
    }

    /// Values of all candidates under one permutation.
    pub fn column(&self, permutation: usize) -> Vec<f64> {
        (0..self.n_candidates)
            .map(|c| self.get(c, permutation))
            .collect()
    }

    /// Row-major backing buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Progress of a surrogate table build, passed to the progress callback after
/// every finished cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurrogateProgress {
    /// Row of the cell that just finished
    pub row: usize,
    /// Cells finished so far
    pub completed: usize,
    /// Cells in the table
    pub total: usize,
}

/// Progress callback. Called from worker threads when the table is built in
/// parallel.
pub type ProgressCallback<'a> = &'a (dyn Fn(SurrogateProgress) + Sync);

/// Conditioning set used when re-estimating a surrogate row.
#[derive(Debug, Clone, Copy)]
pub enum SurrogateConditioning<'a> {
    /// Every row uses the same conditioning realisations
    Fixed(Option<&'a RealisationMatrix>),
    /// Row `i` uses these realisations with column `i` removed; the matrix
    /// holds one column per candidate, in candidate order
    LeaveOneOut(&'a RealisationMatrix),
}

/// What every row needs, prepared once before the cells run.
struct RowPlan<'a> {
    variables: Vec<Candidate>,
    // Only fetched when shuffling within replications
    realisations: Option<(RealisationMatrix, ReplicationIndex)>,
    conditioning: Option<Cow<'a, RealisationMatrix>>,
}

/// Builds [`SurrogateTable`]s for one current value.
///
/// ```rust,ignore
/// let table = SurrogateTableBuilder::new(&estimator, &source, current_value, &target, &config)
///     .conditioning(SurrogateConditioning::Fixed(Some(&conditioning)))
///     .progress(&|p| eprintln!("{}/{}", p.completed, p.total))
///     .build(&candidates)?;
/// ```
pub struct SurrogateTableBuilder<'a, E: ?Sized, S: ?Sized> {
    estimator: &'a E,
    source: &'a S,
    current_value: CurrentValue,
    current_value_realisations: &'a RealisationMatrix,
    config: &'a PermutationTestConfig,
    conditioning: SurrogateConditioning<'a>,
    progress: Option<ProgressCallback<'a>>,
    config_validated: bool,
}

impl<'a, E, S> SurrogateTableBuilder<'a, E, S>
where
    E: DependencyEstimator + ?Sized,
    S: RealisationSource + ?Sized,
{
    /// Builder with no conditioning set and no progress reporting.
    pub fn new(
        estimator: &'a E,
        source: &'a S,
        current_value: CurrentValue,
        current_value_realisations: &'a RealisationMatrix,
        config: &'a PermutationTestConfig,
    ) -> Self {
        Self {
            estimator,
            source,
            current_value,
            current_value_realisations,
            config,
            conditioning: SurrogateConditioning::Fixed(None),
            progress: None,
            config_validated: false,
        }
    }

    /// Skip config validation in `build`; the caller has already run
    /// [`PermutationTestConfig::validate`].
    pub(crate) fn config_validated(mut self) -> Self {
        self.config_validated = true;
        self
    }

    /// Conditioning set of the surrogate estimates.
    pub fn conditioning(mut self, conditioning: SurrogateConditioning<'a>) -> Self {
        self.conditioning = conditioning;
        self
    }

    /// Report progress after every finished cell.
    pub fn progress(mut self, callback: ProgressCallback<'a>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// One row per candidate, in candidate order.
    pub fn build(&self, candidates: &[Candidate]) -> SignificanceResult<SurrogateTable> {
        let rows: Vec<Vec<Candidate>> = candidates.iter().map(|&c| vec![c]).collect();
        self.build_rows(rows)
    }

    /// A single row shuffling all `variables` jointly.
    pub fn build_joint(&self, variables: &[Candidate]) -> SignificanceResult<SurrogateTable> {
        self.build_rows(vec![variables.to_vec()])
    }

    /// Whole replications are permuted by the source when there are several
    /// of them, unless shuffling in time is forced.
    fn permute_over_replications(&self) -> bool {
        self.source.n_replications() > 1 && !self.config.permute_in_time
    }

    fn build_rows(&self, rows: Vec<Vec<Candidate>>) -> SignificanceResult<SurrogateTable> {
        if !self.config_validated {
            self.config.validate()?;
        }

        let n_permutations = self.config.n_permutations;
        let plans = self.plan_rows(rows)?;
        let total = plans.len() * n_permutations;
        let base_seed = resolve_base_seed(self.config.seed);
        let completed = AtomicUsize::new(0);

        log::debug!(
            "building surrogate table: {} rows x {} permutations ({})",
            plans.len(),
            n_permutations,
            if self.permute_over_replications() {
                "replication permutation"
            } else {
                "shuffle in time"
            }
        );

        let run_cell = |cell: usize| -> SignificanceResult<f64> {
            let row = cell / n_permutations;
            let mut rng = SecureRng::with_seed(mix_seed(base_seed, cell));
            let value = self.surrogate_value(&plans[row], &mut rng)?;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(report) = self.progress {
                report(SurrogateProgress {
                    row,
                    completed: done,
                    total,
                });
            }
            if (cell + 1) % n_permutations == 0 {
                log::debug!("surrogate row {} ({:?}) finished", row, plans[row].variables);
            }
            Ok(value)
        };

        let values = if self.config.use_parallel() {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;

                (0..total)
                    .into_par_iter()
                    .map(run_cell)
                    .collect::<SignificanceResult<Vec<f64>>>()?
            }

            #[cfg(not(feature = "parallel"))]
            {
                // use_parallel() is false without the feature
                unreachable!()
            }
        } else {
            (0..total)
                .map(run_cell)
                .collect::<SignificanceResult<Vec<f64>>>()?
        };

        SurrogateTable::new(values, plans.len(), n_permutations)
    }

    fn plan_rows(&self, rows: Vec<Vec<Candidate>>) -> SignificanceResult<Vec<RowPlan<'a>>> {
        if let SurrogateConditioning::LeaveOneOut(selected) = self.conditioning {
            if selected.n_cols() != rows.len() {
                return Err(SignificanceError::ShapeMismatch {
                    context: "leave-one-out conditioning columns".to_string(),
                    expected: rows.len(),
                    actual: selected.n_cols(),
                });
            }
        }

        let in_time = !self.permute_over_replications();
        rows.into_iter()
            .enumerate()
            .map(|(i, variables)| {
                let realisations = if in_time {
                    Some(
                        self.source
                            .get_realisations(&self.current_value, &variables)?,
                    )
                } else {
                    None
                };
                let conditioning = match self.conditioning {
                    SurrogateConditioning::Fixed(fixed) => fixed.map(Cow::Borrowed),
                    SurrogateConditioning::LeaveOneOut(selected) => {
                        selected.split_column(i).1.map(Cow::Owned)
                    }
                };
                Ok(RowPlan {
                    variables,
                    realisations,
                    conditioning,
                })
            })
            .collect()
    }

    fn surrogate_value(&self, plan: &RowPlan<'_>, rng: &mut SecureRng) -> SignificanceResult<f64> {
        let shuffled = match &plan.realisations {
            Some((realisations, replication_index)) => permute_realisations(
                realisations,
                replication_index,
                self.config.permutation_range,
                rng,
            )?,
            None => {
                self.source
                    .permute_data(&self.current_value, &plan.variables, rng)?
                    .0
            }
        };

        let value = self
            .estimator
            .estimate(
                &shuffled,
                self.current_value_realisations,
                plan.conditioning.as_deref(),
            )
            .map_err(|e| SignificanceError::estimator("surrogate table construction", e))?;
        validate_finite(value, "surrogate estimate")?;
        Ok(value)
    }
}

/// Surrogate table over `candidates`, all conditioned on `conditioning`.
///
/// Convenience wrapper around [`SurrogateTableBuilder`].
pub fn build_surrogate_table<E, S>(
    candidates: &[Candidate],
    conditioning: Option<&RealisationMatrix>,
    current_value: CurrentValue,
    current_value_realisations: &RealisationMatrix,
    source: &S,
    estimator: &E,
    config: &PermutationTestConfig,
) -> SignificanceResult<SurrogateTable>
where
    E: DependencyEstimator + ?Sized,
    S: RealisationSource + ?Sized,
{
    SurrogateTableBuilder::new(
        estimator,
        source,
        current_value,
        current_value_realisations,
        config,
    )
    .conditioning(SurrogateConditioning::Fixed(conditioning))
    .build(candidates)
}
