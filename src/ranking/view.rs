//! Score vectors and index-list views into shared matrices

use ndarray::ArrayView2;

/// Score of one gene, `None` when the gene is not scored
pub type Score = Option<f64>;

/// Wrap a computed value as a score; NaN and infinities are unscored
pub fn scored(value: f64) -> Score {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Scores over a whole gene universe.
///
/// Genes that are not graded (genes of interest, genes of inert clusters,
/// undefined correlations) hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector {
    scores: Vec<Score>,
}

impl ScoreVector {
    /// All genes unscored
    pub fn unscored(n_genes: usize) -> Self {
        Self {
            scores: vec![None; n_genes],
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, gene_idx: usize) -> Score {
        self.scores[gene_idx]
    }

    /// Scores of `indices`, in that order
    pub fn gather(&self, indices: &[usize]) -> Vec<Score> {
        indices.iter().map(|&i| self.scores[i]).collect()
    }

    /// Write `(gene, score)` pairs
    pub fn scatter<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (usize, Score)>,
    {
        for (i, s) in entries {
            self.scores[i] = s;
        }
    }

    /// `(gene, score)` for every scored gene
    pub fn iter_scored(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|v| (i, v)))
    }

    pub fn n_scored(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }
}

/// Read-only view of the rows x columns sub-matrix selected by two index
/// lists. Nothing is copied; lookups go through the index lists.
#[derive(Debug, Clone, Copy)]
pub struct SubMatrix<'a> {
    matrix: ArrayView2<'a, f64>,
    rows: &'a [usize],
    cols: &'a [usize],
}

impl<'a> SubMatrix<'a> {
    pub fn new(matrix: ArrayView2<'a, f64>, rows: &'a [usize], cols: &'a [usize]) -> Self {
        Self { matrix, rows, cols }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// Element at view position (r, c)
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.matrix[[self.rows[r], self.cols[c]]]
    }

    /// Sum of each view row, i.e. the view times an all-ones vector
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|&r| self.cols.iter().map(|&c| self.matrix[[r, c]]).sum())
            .collect()
    }
}
