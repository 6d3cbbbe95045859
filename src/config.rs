//! # Permutation Test Configuration
//!
//! Settings for the surrogate-based test procedures: how many permutations to
//! draw, the significance level, how realisations are shuffled and whether the
//! surrogate table is built in parallel.

use crate::errors::{validate_parameter, SignificanceError, SignificanceResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest block length that leaves something to permute.
pub const MIN_PERMUTATION_BLOCK: usize = 3;

/// Range within which realisations are shuffled in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PermutationRange {
    /// Permute positions across the whole replication
    #[default]
    Replication,
    /// Permute positions within consecutive blocks of this length
    Block(usize),
}

impl PermutationRange {
    /// Reject block lengths below [`MIN_PERMUTATION_BLOCK`].
    pub fn validate(&self) -> SignificanceResult<()> {
        match *self {
            PermutationRange::Replication => Ok(()),
            PermutationRange::Block(size) if size < MIN_PERMUTATION_BLOCK => {
                Err(SignificanceError::InvalidConfiguration {
                    parameter: "permutation_range".to_string(),
                    reason: format!(
                        "block length {} is below {}, nothing to permute",
                        size, MIN_PERMUTATION_BLOCK
                    ),
                })
            }
            PermutationRange::Block(_) => Ok(()),
        }
    }
}

/// Conditioning used for the surrogates of the sequential max-statistic test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SequentialConditioning {
    /// Each surrogate row is conditioned on the selected set minus the
    /// candidate being shuffled, mirroring the observed statistic
    #[default]
    LeaveOneOut,
    /// Each surrogate row is conditioned on the full selected set, including
    /// the candidate being shuffled
    FullSet,
}

/// Configuration for one permutation test procedure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PermutationTestConfig {
    /// Number of surrogates drawn per candidate
    pub n_permutations: usize,
    /// Critical alpha level
    pub alpha: f64,
    /// Time-shuffle range used when shuffling within replications
    pub permutation_range: PermutationRange,
    /// Shuffle within replications even when the data has several
    pub permute_in_time: bool,
    /// Base seed; `None` draws one from OS entropy per call
    pub seed: Option<u64>,
    /// Build surrogate tables on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
    /// Surrogate conditioning for the sequential max-statistic test
    pub sequential_conditioning: SequentialConditioning,
}

impl Default for PermutationTestConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PermutationTestConfig {
    /// Few permutations for exploratory runs and tests.
    pub fn quick() -> Self {
        Self {
            n_permutations: 21,
            ..Self::standard()
        }
    }

    /// Standard configuration.
    pub fn standard() -> Self {
        Self {
            n_permutations: 500,
            alpha: 0.05,
            permutation_range: PermutationRange::Replication,
            permute_in_time: false,
            seed: None,
            parallel: true,
            sequential_conditioning: SequentialConditioning::LeaveOneOut,
        }
    }

    /// Large null distributions for final reporting.
    pub fn thorough() -> Self {
        Self {
            n_permutations: 2000,
            ..Self::standard()
        }
    }

    /// Same configuration with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the configuration before any surrogate is drawn.
    pub fn validate(&self) -> SignificanceResult<()> {
        if self.n_permutations == 0 {
            return Err(SignificanceError::InvalidConfiguration {
                parameter: "n_permutations".to_string(),
                reason: "at least one permutation is required".to_string(),
            });
        }
        validate_parameter(self.alpha, 0.0, 1.0, "alpha")?;
        if self.alpha == 0.0 {
            return Err(SignificanceError::InvalidParameter {
                parameter: "alpha".to_string(),
                value: self.alpha,
                constraint: "(0, 1]".to_string(),
            });
        }
        self.permutation_range.validate()?;

        if (self.n_permutations as f64) < 1.0 / self.alpha {
            log::warn!(
                "{} permutations are too few to resolve alpha = {}; at least {} are needed",
                self.n_permutations,
                self.alpha,
                (1.0 / self.alpha).ceil()
            );
        }
        Ok(())
    }

    /// Whether surrogate cells should run on the rayon pool.
    pub fn use_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }
}

/// One configuration per test procedure used during a network search.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignificanceSettings {
    /// Omnibus test of all selected sources
    pub omnibus: PermutationTestConfig,
    /// Max-statistic test during candidate inclusion
    pub max_statistic: PermutationTestConfig,
    /// Min-statistic test during pruning
    pub min_statistic: PermutationTestConfig,
    /// Sequential max-statistic test of the final selected set
    pub max_statistic_sequential: PermutationTestConfig,
}

impl SignificanceSettings {
    /// Same configuration for every procedure.
    pub fn uniform(config: PermutationTestConfig) -> Self {
        Self {
            omnibus: config.clone(),
            max_statistic: config.clone(),
            min_statistic: config.clone(),
            max_statistic_sequential: config,
        }
    }

    /// Validate every procedure's configuration.
    pub fn validate(&self) -> SignificanceResult<()> {
        self.omnibus.validate()?;
        self.max_statistic.validate()?;
        self.min_statistic.validate()?;
        self.max_statistic_sequential.validate()
    }
}
