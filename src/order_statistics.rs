//! Column-wise reductions of surrogate tables into null distributions.
//!
//! All functions are pure: the input table is never reordered in place.

use crate::surrogate_table::SurrogateTable;

/// Maximum over candidates for every permutation.
pub fn column_max(table: &SurrogateTable) -> Vec<f64> {
    reduce_columns(table, f64::max)
}

/// Minimum over candidates for every permutation.
pub fn column_min(table: &SurrogateTable) -> Vec<f64> {
    reduce_columns(table, f64::min)
}

/// Sort every column ascending, independently of the others.
///
/// Row `k` of the result holds the `k`-th smallest surrogate of each
/// permutation, i.e. the null distribution of the statistic ranked `k`-th
/// smallest among the candidates.
pub fn sort_columns_ascending(table: &SurrogateTable) -> SurrogateTable {
    sort_columns_by(table, |a, b| a.total_cmp(b))
}

/// Sort every column descending, independently of the others.
pub fn sort_columns_descending(table: &SurrogateTable) -> SurrogateTable {
    sort_columns_by(table, |a, b| b.total_cmp(a))
}

fn reduce_columns(table: &SurrogateTable, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    if table.n_candidates() == 0 {
        return Vec::new();
    }
    (0..table.n_permutations())
        .map(|p| {
            (1..table.n_candidates()).fold(table.get(0, p), |acc, c| pick(acc, table.get(c, p)))
        })
        .collect()
}

fn sort_columns_by<F>(table: &SurrogateTable, compare: F) -> SurrogateTable
where
    F: Fn(&f64, &f64) -> std::cmp::Ordering,
{
    let n_candidates = table.n_candidates();
    let n_permutations = table.n_permutations();
    let mut values = vec![0.0; n_candidates * n_permutations];

    for p in 0..n_permutations {
        let mut column = table.column(p);
        column.sort_by(&compare);
        for (c, v) in column.into_iter().enumerate() {
            values[c * n_permutations + p] = v;
        }
    }

    SurrogateTable::from_raw(values, n_candidates, n_permutations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_table() -> SurrogateTable {
        SurrogateTable::from_rows(&[
            vec![0.5, 0.1, 0.9, 0.3],
            vec![0.2, 0.8, 0.4, 0.3],
            vec![0.7, 0.6, 0.0, 0.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_column_max() {
        assert_eq!(column_max(&fixed_table()), vec![0.7, 0.8, 0.9, 0.3]);
    }

    #[test]
    fn test_column_min() {
        assert_eq!(column_min(&fixed_table()), vec![0.2, 0.1, 0.0, 0.1]);
    }

    #[test]
    fn test_sort_columns_ascending() {
        let table = fixed_table();
        let sorted = sort_columns_ascending(&table);

        assert_eq!(sorted.row(0), &[0.2, 0.1, 0.0, 0.1]);
        assert_eq!(sorted.row(1), &[0.5, 0.6, 0.4, 0.3]);
        assert_eq!(sorted.row(2), &[0.7, 0.8, 0.9, 0.3]);

        // Every column keeps its own values
        for p in 0..4 {
            let mut original = table.column(p);
            original.sort_by(|a, b| a.total_cmp(b));
            assert_eq!(sorted.column(p), original);
        }
        // Input untouched
        assert_eq!(table, fixed_table());
    }

    #[test]
    fn test_sort_columns_descending() {
        let sorted = sort_columns_descending(&fixed_table());
        assert_eq!(sorted.row(0), &[0.7, 0.8, 0.9, 0.3]);
        assert_eq!(sorted.row(2), &[0.2, 0.1, 0.0, 0.1]);
    }

    #[test]
    fn test_empty_table_reduces_to_nothing() {
        let table = SurrogateTable::new(Vec::new(), 0, 5).unwrap();
        assert!(column_max(&table).is_empty());
        assert!(column_min(&table).is_empty());
    }

    #[test]
    fn test_single_row_table() {
        let table = SurrogateTable::from_rows(&[vec![3.0, 1.0, 2.0]]).unwrap();
        assert_eq!(column_max(&table), vec![3.0, 1.0, 2.0]);
        assert_eq!(column_min(&table), vec![3.0, 1.0, 2.0]);
        assert_eq!(sort_columns_ascending(&table), table);
    }
}
