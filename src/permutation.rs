//! Within-replication time shuffling of realisations.
//!
//! This is the fall-back surrogate method when the data holds too few
//! replications to permute whole replications against the current value. One
//! permutation of sample positions is drawn and applied to every replication,
//! so rows never move across replications.

use crate::{
    config::PermutationRange,
    errors::{SignificanceError, SignificanceResult},
    realisations::{RealisationMatrix, ReplicationIndex},
    secure_rng::SecureRng,
};

/// Permutation of `0..n_samples` honouring the permutation range.
///
/// With [`PermutationRange::Block`], positions are only exchanged inside
/// consecutive blocks of that length; a shorter remainder block closes the
/// range and is permuted on its own.
pub fn within_replication_permutation(
    n_samples: usize,
    range: PermutationRange,
    rng: &mut SecureRng,
) -> SignificanceResult<Vec<usize>> {
    range.validate()?;

    match range {
        PermutationRange::Replication => Ok(rng.permutation(n_samples)),
        PermutationRange::Block(block) => {
            let mut perm: Vec<usize> = (0..n_samples).collect();
            for chunk in perm.chunks_mut(block) {
                rng.shuffle(chunk);
            }
            Ok(perm)
        }
    }
}

/// Shuffle realisations in time within each replication.
///
/// Returns a new matrix; the input is left untouched. All replications must
/// have the same number of rows.
///
/// # Errors
/// * `ShapeMismatch` if the replication index does not cover every row or
///   replications differ in length
/// * `InvalidConfiguration` for a block range below 3
pub fn permute_realisations(
    realisations: &RealisationMatrix,
    replication_index: &ReplicationIndex,
    range: PermutationRange,
    rng: &mut SecureRng,
) -> SignificanceResult<RealisationMatrix> {
    if replication_index.len() != realisations.n_rows() {
        return Err(SignificanceError::ShapeMismatch {
            context: "permute_realisations: replication index length".to_string(),
            expected: realisations.n_rows(),
            actual: replication_index.len(),
        });
    }

    let groups = replication_index.row_groups();
    let n_per_replication = groups.first().map_or(0, Vec::len);
    if let Some(uneven) = groups.iter().find(|g| g.len() != n_per_replication) {
        return Err(SignificanceError::ShapeMismatch {
            context: "permute_realisations: samples per replication".to_string(),
            expected: n_per_replication,
            actual: uneven.len(),
        });
    }

    let perm = within_replication_permutation(n_per_replication, range, rng)?;

    // Row order of the output: position k of replication r takes the row at
    // position perm[k] of the same replication.
    let mut order: Vec<usize> = (0..realisations.n_rows()).collect();
    for rows in &groups {
        for (k, &row) in rows.iter().enumerate() {
            order[row] = rows[perm[k]];
        }
    }

    realisations.gather_rows(&order)
}
