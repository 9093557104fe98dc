//! Pearson correlation between every gene and the genes of interest
//!
//! The correlation matrix is the scoring substrate of every ranking: rows are
//! all genes of a dataset, columns are the union of the genes of interest
//! present in it. It is computed in a single streaming pass over the samples
//! of each gene using the incremental update of `gsl_stats_correlation`:
//!
//! ```text
//! for k in 1..M:
//!     ratio = k / (k + 1)
//!     delta = x[k] - mean
//!     sum_sq    += delta * delta * ratio
//!     sum_cross += delta * delta_target * ratio
//!     mean      += delta / (k + 1)
//! corr = sum_cross / (sqrt(sum_sq) * sqrt(sum_sq_target))
//! ```
//!
//! All accumulators are compensated sums, so rounding error does not grow with
//! the number of samples. Genes with zero variance get NaN correlations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::data::{ExpressionMatrix, GeneUniverse};
use crate::error::{MorphError, Result};
use crate::stats::CompensatedSum;

/// Gene x target correlation table of one dataset
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    /// Dataset the correlations were derived from
    dataset: String,
    universe: Arc<GeneUniverse>,
    /// Correlations (genes x targets)
    values: Array2<f64>,
    /// Target gene row indices, sorted; target `targets[j]` is column `j`
    targets: Vec<usize>,
    /// Target gene row index -> column
    columns: HashMap<usize, usize>,
}

/// Deviation stream of one gene: `delta` per sample k >= 1, and the
/// resulting root of the sum of squares
struct RowStream {
    deltas: Vec<f64>,
    norm: f64,
}

fn stream_row(row: ArrayView1<'_, f64>) -> RowStream {
    let n = row.len();
    let mut deltas = Vec::with_capacity(n.saturating_sub(1));
    let mut mean = CompensatedSum::new(row[0]);
    let mut sum_sq = CompensatedSum::default();

    for k in 1..n {
        let kf = k as f64;
        let ratio = kf / (kf + 1.0);
        let delta = row[k] - mean.value();
        sum_sq += delta * delta * ratio;
        mean += delta / (kf + 1.0);
        deltas.push(delta);
    }

    RowStream {
        deltas,
        norm: sum_sq.value().sqrt(),
    }
}

impl CorrelationMatrix {
    /// Correlate every gene of `expression` with each gene in `targets`.
    ///
    /// Consumes the expression matrix: once correlations exist the raw values
    /// are no longer needed, and dropping them here bounds peak memory.
    /// Duplicate targets are merged.
    pub fn compute(expression: ExpressionMatrix, targets: &[usize]) -> Result<Self> {
        let n_genes = expression.n_genes();
        let targets: Vec<usize> = targets.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if let Some(&bad) = targets.iter().find(|&&t| t >= n_genes) {
            return Err(MorphError::invariant(format!(
                "correlation target {} outside a dataset of {} genes",
                bad, n_genes
            )));
        }

        log::debug!(
            "Correlating {} genes x {} targets over {} samples ({})",
            n_genes,
            targets.len(),
            expression.n_samples(),
            expression.name()
        );

        let values = correlate(expression.values(), &targets)?;
        let columns = targets.iter().enumerate().map(|(j, &t)| (t, j)).collect();

        Ok(Self {
            dataset: expression.name().to_string(),
            universe: Arc::clone(expression.universe()),
            values,
            targets,
            columns,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn universe(&self) -> &Arc<GeneUniverse> {
        &self.universe
    }

    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_targets(&self) -> usize {
        self.values.ncols()
    }

    /// Target gene row indices, in column order
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Column of a target gene
    pub fn column_of(&self, gene_idx: usize) -> Option<usize> {
        self.columns.get(&gene_idx).copied()
    }

    /// Correlation between row `row` and column `col`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[[row, col]]
    }

    /// Correlation between a gene and a target gene, if `target` is a target
    pub fn correlation(&self, gene_idx: usize, target: usize) -> Option<f64> {
        self.column_of(target).map(|col| self.values[[gene_idx, col]])
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

/// Correlation table of all rows of `expression` against rows `targets`.
/// Rows are written in place into one genes x targets buffer.
fn correlate(expression: ArrayView2<'_, f64>, targets: &[usize]) -> Result<Array2<f64>> {
    let n_genes = expression.nrows();
    let n_targets = targets.len();
    if n_targets == 0 {
        return Ok(Array2::zeros((n_genes, 0)));
    }

    let target_streams: Vec<RowStream> = targets
        .par_iter()
        .map(|&t| stream_row(expression.row(t)))
        .collect();

    let mut values = vec![0.0; n_genes * n_targets];
    values
        .par_chunks_mut(n_targets)
        .enumerate()
        .for_each(|(i, row)| {
            let stream = stream_row(expression.row(i));
            for (out, target) in row.iter_mut().zip(&target_streams) {
                let mut cross = CompensatedSum::default();
                for (k, (&d, &dt)) in stream.deltas.iter().zip(&target.deltas).enumerate() {
                    let kf = (k + 1) as f64;
                    cross += d * dt * (kf / (kf + 1.0));
                }
                *out = cross.value() / (stream.norm * target.norm);
            }
        });

    Array2::from_shape_vec((n_genes, n_targets), values)
        .map_err(|e| MorphError::invariant(format!("correlation table shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Textbook two-pass Pearson correlation
    fn naive_pearson(x: &[f64], y: &[f64]) -> f64 {
        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        let mut syy = 0.0;
        for (a, b) in x.iter().zip(y) {
            sxy += (a - mx) * (b - my);
            sxx += (a - mx) * (a - mx);
            syy += (b - my) * (b - my);
        }
        sxy / (sxx.sqrt() * syy.sqrt())
    }

    fn matrix() -> ExpressionMatrix {
        let values = array![
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [2.0, 4.0, 6.0, 8.0, 10.0],
            [5.0, 4.0, 3.0, 2.0, 1.0],
            [3.0, 1.0, 4.0, 1.0, 5.0],
            [7.0, 7.0, 7.0, 7.0, 7.0],
            [0.5, 2.5, 1.0, 9.0, 2.0],
        ];
        ExpressionMatrix::new("test", &["a", "b", "c", "d", "e", "f"], values).unwrap()
    }

    #[test]
    fn test_perfect_correlations() {
        let corr = CorrelationMatrix::compute(matrix(), &[0]).unwrap();
        assert_eq!(corr.n_genes(), 6);
        assert_eq!(corr.n_targets(), 1);
        assert!((corr.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((corr.get(1, 0) - 1.0).abs() < 1e-12);
        assert!((corr.get(2, 0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matches_two_pass_pearson() {
        let expression = matrix();
        let rows: Vec<Vec<f64>> = (0..6).map(|i| expression.gene_values(i).to_vec()).collect();
        let corr = CorrelationMatrix::compute(expression, &[3, 5]).unwrap();

        for i in [0, 1, 2, 3, 5] {
            for (j, &t) in [3usize, 5].iter().enumerate() {
                let expected = naive_pearson(&rows[i], &rows[t]);
                assert!(
                    (corr.get(i, j) - expected).abs() < 1e-12,
                    "corr({}, {}) = {}, expected {}",
                    i,
                    t,
                    corr.get(i, j),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_zero_variance_gives_nan() {
        let corr = CorrelationMatrix::compute(matrix(), &[0, 4]).unwrap();
        let col_e = corr.column_of(4).unwrap();
        // Row of the constant gene, and column of the constant gene
        assert!(corr.get(4, 0).is_nan());
        assert!(corr.get(0, col_e).is_nan());
    }

    #[test]
    fn test_targets_sorted_and_deduplicated() {
        let corr = CorrelationMatrix::compute(matrix(), &[5, 1, 5]).unwrap();
        assert_eq!(corr.targets(), &[1, 5]);
        assert_eq!(corr.column_of(5), Some(1));
        assert_eq!(corr.column_of(0), None);
        assert_eq!(corr.correlation(0, 1), Some(corr.get(0, 0)));
    }

    #[test]
    fn test_deterministic() {
        let a = CorrelationMatrix::compute(matrix(), &[0, 3, 5]).unwrap();
        let b = CorrelationMatrix::compute(matrix(), &[0, 3, 5]).unwrap();
        for (x, y) in a.values().iter().zip(b.values().iter()) {
            assert!(x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()));
        }
    }

    #[test]
    fn test_rows_written_to_their_genes() {
        let corr = CorrelationMatrix::compute(matrix(), &[2, 0]).unwrap();
        assert_eq!(corr.values().dim(), (6, 2));
        for i in 0..6 {
            for (col, &t) in corr.targets().iter().enumerate() {
                let expected = corr.correlation(i, t).unwrap();
                assert!(corr.get(i, col).to_bits() == expected.to_bits());
            }
        }
        assert!((corr.get(2, 1) - 1.0).abs() < 1e-12);
        assert!((corr.get(0, 0) - 1.0).abs() < 1e-12);

        let empty = CorrelationMatrix::compute(matrix(), &[]).unwrap();
        assert_eq!(empty.values().dim(), (6, 0));
    }

    #[test]
    fn test_target_out_of_range() {
        let result = CorrelationMatrix::compute(matrix(), &[6]);
        assert!(matches!(result, Err(MorphError::InvariantViolation { .. })));
    }

    #[test]
    fn test_large_offset_is_stable() {
        // Same shape as rows 0 and 3, shifted far from zero
        let shift = 1e9;
        let values = array![
            [shift + 1.0, shift + 2.0, shift + 3.0, shift + 4.0, shift + 5.0],
            [shift + 3.0, shift + 1.0, shift + 4.0, shift + 1.0, shift + 5.0],
        ];
        let expression = ExpressionMatrix::new("shifted", &["x", "y"], values).unwrap();
        let corr = CorrelationMatrix::compute(expression, &[0]).unwrap();
        let expected = naive_pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert!((corr.get(1, 0) - expected).abs() < 1e-9);
    }
}
