//! Data model shared by the permutation generator, the surrogate table builder
//! and the test procedures, together with the contracts of the two external
//! collaborators: the dependency estimator and the realisation source.

use crate::errors::{EstimatorError, SignificanceError, SignificanceResult};
use crate::secure_rng::SecureRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A variable considered as explanatory source: a process and a lag into its
/// past relative to the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    process: usize,
    lag: usize,
}

impl Candidate {
    /// Create a candidate. The lag must be at least 1.
    pub fn new(process: usize, lag: usize) -> SignificanceResult<Self> {
        if lag == 0 {
            return Err(SignificanceError::InvalidArgument {
                reason: format!("candidate lag must be >= 1 (process {})", process),
            });
        }
        Ok(Self { process, lag })
    }

    /// Process index.
    pub fn process(&self) -> usize {
        self.process
    }

    /// Lag relative to the current value.
    pub fn lag(&self) -> usize {
        self.lag
    }
}

/// The target variable all realisations are aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentValue {
    /// Target process index
    pub process: usize,
    /// Sample index of the current value within a replication
    pub sample: usize,
}

/// Realisations of one or more variables, stored row-major.
///
/// Rows are realisations (samples), columns are variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RealisationMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl RealisationMatrix {
    /// Build from a row-major buffer.
    pub fn new(data: Vec<f64>, n_rows: usize, n_cols: usize) -> SignificanceResult<Self> {
        let expected = n_rows.checked_mul(n_cols).ok_or_else(|| {
            SignificanceError::InvalidArgument {
                reason: format!("matrix dimensions overflow: {} x {}", n_rows, n_cols),
            }
        })?;
        if data.len() != expected {
            return Err(SignificanceError::ShapeMismatch {
                context: "RealisationMatrix::new".to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// Build from rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> SignificanceResult<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(SignificanceError::ShapeMismatch {
                    context: "RealisationMatrix::from_rows".to_string(),
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_rows: rows.len(),
            n_cols,
        })
    }

    /// Single-variable matrix from a column of values.
    pub fn from_column(values: &[f64]) -> Self {
        Self {
            data: values.to_vec(),
            n_rows: values.len(),
            n_cols: 1,
        }
    }

    /// Number of realisations.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of variables.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row-major backing buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// One realisation.
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    /// Iterate over realisations.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on zero chunk size
        let width = self.n_cols.max(1);
        let take = if self.n_cols == 0 { 0 } else { self.n_rows };
        self.data.chunks_exact(width).take(take)
    }

    /// Copy of one variable's values.
    pub fn column(&self, index: usize) -> Vec<f64> {
        (0..self.n_rows)
            .map(|r| self.data[r * self.n_cols + index])
            .collect()
    }

    /// New matrix whose row `i` is row `order[i]` of `self`.
    pub fn gather_rows(&self, order: &[usize]) -> SignificanceResult<Self> {
        if order.len() != self.n_rows {
            return Err(SignificanceError::ShapeMismatch {
                context: "RealisationMatrix::gather_rows".to_string(),
                expected: self.n_rows,
                actual: order.len(),
            });
        }
        let mut data = Vec::with_capacity(self.data.len());
        for &r in order {
            data.extend_from_slice(self.row(r));
        }
        Ok(Self {
            data,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        })
    }

    /// Matrix holding only the listed columns, in the listed order.
    pub fn select_columns(&self, columns: &[usize]) -> Self {
        let mut data = Vec::with_capacity(self.n_rows * columns.len());
        for r in 0..self.n_rows {
            let row = self.row(r);
            data.extend(columns.iter().map(|&c| row[c]));
        }
        Self {
            data,
            n_rows: self.n_rows,
            n_cols: columns.len(),
        }
    }

    /// Split off one column: returns `(column, rest)`, where `rest` is `None`
    /// when no other column remains.
    pub fn split_column(&self, index: usize) -> (Self, Option<Self>) {
        let column = self.select_columns(&[index]);
        let others: Vec<usize> = (0..self.n_cols).filter(|&c| c != index).collect();
        let rest = if others.is_empty() {
            None
        } else {
            Some(self.select_columns(&others))
        };
        (column, rest)
    }
}

/// Replication id of every realisation row.
///
/// Ids are contiguous from 0: every id in `0..n_replications` occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationIndex {
    ids: Vec<usize>,
    n_replications: usize,
}

impl ReplicationIndex {
    /// Validate and wrap replication ids.
    pub fn new(ids: Vec<usize>) -> SignificanceResult<Self> {
        let n_replications = ids.iter().max().map_or(0, |&m| m + 1);
        let mut seen = vec![false; n_replications];
        for &id in &ids {
            seen[id] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(SignificanceError::InvalidArgument {
                reason: format!(
                    "replication ids must be contiguous from 0, id {} is missing",
                    missing
                ),
            });
        }
        Ok(Self {
            ids,
            n_replications,
        })
    }

    /// `n_replications` consecutive replications of `samples_per_replication`
    /// rows each.
    pub fn contiguous(n_replications: usize, samples_per_replication: usize) -> Self {
        let ids = (0..n_replications)
            .flat_map(|r| std::iter::repeat(r).take(samples_per_replication))
            .collect();
        let n_replications = if samples_per_replication == 0 {
            0
        } else {
            n_replications
        };
        Self {
            ids,
            n_replications,
        }
    }

    /// Number of rows covered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index covers no rows.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct replications.
    pub fn n_replications(&self) -> usize {
        self.n_replications
    }

    /// Replication id per row.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Row positions belonging to each replication, in row order.
    pub fn row_groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_replications];
        for (row, &id) in self.ids.iter().enumerate() {
            groups[id].push(row);
        }
        groups
    }
}

/// Dependency measure consumed by the engine, e.g. a conditional mutual
/// information estimator.
///
/// Implementations must not depend on call order: the engine calls them many
/// times with shuffled inputs and, with the `parallel` feature, from several
/// threads at once.
pub trait DependencyEstimator: Sync {
    /// Estimate the dependency between `source` and `target` given
    /// `conditioning` (absent when the conditioning set is empty).
    fn estimate(
        &self,
        source: &RealisationMatrix,
        target: &RealisationMatrix,
        conditioning: Option<&RealisationMatrix>,
    ) -> Result<f64, EstimatorError>;
}

impl<F> DependencyEstimator for F
where
    F: Fn(
            &RealisationMatrix,
            &RealisationMatrix,
            Option<&RealisationMatrix>,
        ) -> Result<f64, EstimatorError>
        + Sync,
{
    fn estimate(
        &self,
        source: &RealisationMatrix,
        target: &RealisationMatrix,
        conditioning: Option<&RealisationMatrix>,
    ) -> Result<f64, EstimatorError> {
        self(source, target, conditioning)
    }
}

/// Data container that owns the raw time series and builds realisations
/// aligned to a current value.
pub trait RealisationSource: Sync {
    /// Number of independent replications (trials) in the data.
    fn n_replications(&self) -> usize;

    /// Realisations of `variables` (one column per variable) and the
    /// replication each row came from.
    fn get_realisations(
        &self,
        current_value: &CurrentValue,
        variables: &[Candidate],
    ) -> SignificanceResult<(RealisationMatrix, ReplicationIndex)>;

    /// Realisations of `variables` with whole replications shuffled against
    /// the current value.
    fn permute_data(
        &self,
        current_value: &CurrentValue,
        variables: &[Candidate],
        rng: &mut SecureRng,
    ) -> SignificanceResult<(RealisationMatrix, ReplicationIndex)>;
}
