//! Genes of interest: curated target gene lists

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::GeneUniverse;
use crate::error::{MorphError, Result};

/// A named list of genes of interest, by name.
///
/// Names are lower-cased and de-duplicated, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesOfInterest {
    name: String,
    genes: Vec<String>,
}

impl GenesOfInterest {
    pub fn new<I, S>(name: impl Into<String>, genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let genes = genes
            .into_iter()
            .map(|g| g.as_ref().trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .filter(|g| seen.insert(g.clone()))
            .collect();
        Self {
            name: name.into(),
            genes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Reject the group if a name does not match `pattern`
    pub fn check_names(&self, pattern: &Regex) -> Result<()> {
        match self.genes.iter().find(|g| !pattern.is_match(g)) {
            Some(gene) => Err(MorphError::InvalidGeneName {
                goi: self.name.clone(),
                gene: gene.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Translate names to row indices of `universe`, keeping order.
    /// Names the dataset lacks are kept aside for reporting.
    pub fn resolve(&self, universe: &GeneUniverse) -> GoiGroup {
        let mut genes = Vec::with_capacity(self.genes.len());
        let mut missing = Vec::new();
        for name in &self.genes {
            match universe.index_of(name) {
                Some(idx) => genes.push(idx),
                None => missing.push(name.clone()),
            }
        }
        GoiGroup {
            name: self.name.clone(),
            genes,
            missing,
        }
    }
}

/// Genes of interest of one group that are present in one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct GoiGroup {
    name: String,
    /// Row indices, in the order of the source list
    genes: Vec<usize>,
    /// Names not found in the dataset
    missing: Vec<String>,
}

impl GoiGroup {
    /// Build from row indices directly; duplicates are dropped
    pub fn from_indices(name: impl Into<String>, indices: &[usize]) -> Self {
        let mut seen = HashSet::new();
        Self {
            name: name.into(),
            genes: indices.iter().copied().filter(|g| seen.insert(*g)).collect(),
            missing: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Number of genes present in the dataset
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
