//! Shared fixtures for the integration tests: an in-memory realisation source
//! and a few deterministic estimators.

#![allow(dead_code)]

use surrogate_significance::{
    Candidate, CurrentValue, EstimatorError, RealisationMatrix, RealisationSource,
    ReplicationIndex, SecureRng, SignificanceError, SignificanceResult,
};

/// Raw data indexed as `data[process][replication][sample]`.
pub struct InMemorySource {
    pub data: Vec<Vec<Vec<f64>>>,
}

impl InMemorySource {
    pub fn n_samples(&self) -> usize {
        self.data[0][0].len()
    }

    fn column(&self, current_value: &CurrentValue, candidate: &Candidate, replication: usize) -> Vec<f64> {
        let series = &self.data[candidate.process()][replication];
        (current_value.sample..self.n_samples())
            .map(|t| series[t - candidate.lag()])
            .collect()
    }

    fn realisations_from(
        &self,
        current_value: &CurrentValue,
        variables: &[Candidate],
        replication_order: &[usize],
    ) -> SignificanceResult<(RealisationMatrix, ReplicationIndex)> {
        if let Some(c) = variables.iter().find(|c| c.lag() > current_value.sample) {
            return Err(SignificanceError::SourceFailure {
                reason: format!("lag {} reaches before the first sample", c.lag()),
            });
        }

        let rows_per_replication = self.n_samples() - current_value.sample;
        let mut rows = Vec::with_capacity(replication_order.len() * rows_per_replication);
        for &replication in replication_order {
            let columns: Vec<Vec<f64>> = variables
                .iter()
                .map(|c| self.column(current_value, c, replication))
                .collect();
            for t in 0..rows_per_replication {
                rows.push(columns.iter().map(|col| col[t]).collect::<Vec<f64>>());
            }
        }

        Ok((
            RealisationMatrix::from_rows(&rows)?,
            ReplicationIndex::contiguous(replication_order.len(), rows_per_replication),
        ))
    }

    /// Realisations of the current value itself.
    pub fn current_value_realisations(&self, current_value: &CurrentValue) -> RealisationMatrix {
        let values: Vec<f64> = (0..self.data[current_value.process].len())
            .flat_map(|r| {
                self.data[current_value.process][r][current_value.sample..].to_vec()
            })
            .collect();
        RealisationMatrix::from_column(&values)
    }
}

impl RealisationSource for InMemorySource {
    fn n_replications(&self) -> usize {
        self.data[0].len()
    }

    fn get_realisations(
        &self,
        current_value: &CurrentValue,
        variables: &[Candidate],
    ) -> SignificanceResult<(RealisationMatrix, ReplicationIndex)> {
        let order: Vec<usize> = (0..self.n_replications()).collect();
        self.realisations_from(current_value, variables, &order)
    }

    fn permute_data(
        &self,
        current_value: &CurrentValue,
        variables: &[Candidate],
        rng: &mut SecureRng,
    ) -> SignificanceResult<(RealisationMatrix, ReplicationIndex)> {
        let order = rng.permutation(self.n_replications());
        self.realisations_from(current_value, variables, &order)
    }
}

/// Target process 0 driven by process 1 at lag 1; process 2 is independent
/// noise.
pub fn coupled_source(n_replications: usize, n_samples: usize, seed: u64) -> InMemorySource {
    let mut rng = SecureRng::with_seed(seed);
    let mut target = Vec::with_capacity(n_replications);
    let mut driver = Vec::with_capacity(n_replications);
    let mut noise = Vec::with_capacity(n_replications);

    for _ in 0..n_replications {
        let x: Vec<f64> = (0..n_samples).map(|_| rng.f64() - 0.5).collect();
        let z: Vec<f64> = (0..n_samples).map(|_| rng.f64() - 0.5).collect();
        let mut y = vec![0.0; n_samples];
        for t in 1..n_samples {
            y[t] = 0.8 * x[t - 1] + 0.2 * (rng.f64() - 0.5);
        }
        target.push(y);
        driver.push(x);
        noise.push(z);
    }

    InMemorySource {
        data: vec![target, driver, noise],
    }
}

pub fn candidate(process: usize, lag: usize) -> Candidate {
    Candidate::new(process, lag).expect("lag >= 1")
}

/// Absolute Pearson correlation between the mean of the source columns and the
/// target. Ignores the conditioning set.
pub fn abs_correlation(
    source: &RealisationMatrix,
    target: &RealisationMatrix,
    _conditioning: Option<&RealisationMatrix>,
) -> Result<f64, EstimatorError> {
    if source.n_rows() != target.n_rows() {
        return Err(format!(
            "row mismatch: {} source rows, {} target rows",
            source.n_rows(),
            target.n_rows()
        )
        .into());
    }
    let s: Vec<f64> = source
        .rows()
        .map(|r| r.iter().sum::<f64>() / r.len() as f64)
        .collect();
    let t = target.column(0);
    let n = s.len() as f64;
    let ms = s.iter().sum::<f64>() / n;
    let mt = t.iter().sum::<f64>() / n;
    let cov: f64 = s.iter().zip(&t).map(|(a, b)| (a - ms) * (b - mt)).sum();
    let vs: f64 = s.iter().map(|a| (a - ms).powi(2)).sum();
    let vt: f64 = t.iter().map(|b| (b - mt).powi(2)).sum();
    if vs == 0.0 || vt == 0.0 {
        return Ok(0.0);
    }
    Ok((cov / (vs * vt).sqrt()).abs())
}

/// Negative total variation of the first source column: high for smooth
/// series, low for rough ones. Ignores target and conditioning set.
pub fn smoothness(
    source: &RealisationMatrix,
    _target: &RealisationMatrix,
    _conditioning: Option<&RealisationMatrix>,
) -> Result<f64, EstimatorError> {
    let s = source.column(0);
    Ok(-s.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>())
}
