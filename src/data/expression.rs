//! Expression matrix representation

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};

use super::GeneUniverse;
use crate::error::{MorphError, Result};

/// Gene expression values of one dataset.
/// Rows are genes, columns are samples.
///
/// The matrix is consumed by [`crate::correlation::CorrelationMatrix::compute`];
/// only the gene universe outlives it.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Dataset name
    name: String,
    /// Gene names <-> rows
    universe: Arc<GeneUniverse>,
    /// Expression values (genes x samples)
    values: Array2<f64>,
}

impl ExpressionMatrix {
    /// Create an expression matrix from gene names in row order and values
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        gene_names: &[S],
        values: Array2<f64>,
    ) -> Result<Self> {
        let universe = GeneUniverse::new(gene_names.iter().map(|s| s.as_ref()))?;
        Self::with_universe(name, Arc::new(universe), values)
    }

    /// Create an expression matrix over an existing universe
    pub fn with_universe(
        name: impl Into<String>,
        universe: Arc<GeneUniverse>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let (n_genes, n_samples) = values.dim();

        if universe.len() != n_genes {
            return Err(MorphError::DimensionMismatch {
                expected: format!("{} gene names", n_genes),
                got: format!("{} gene names", universe.len()),
            });
        }

        if n_samples == 0 {
            return Err(MorphError::InvalidExpressionMatrix {
                reason: "Expression matrix has no samples".to_string(),
            });
        }

        Ok(Self {
            name: name.into(),
            universe,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the gene universe
    pub fn universe(&self) -> &Arc<GeneUniverse> {
        &self.universe
    }

    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Expression of one gene across samples
    pub fn gene_values(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }
}
