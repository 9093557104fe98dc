//! Gene universe: the name <-> row index bijection of one dataset

use std::collections::HashMap;

use crate::error::{MorphError, Result};

/// All genes of one expression dataset.
///
/// Names are matched case-insensitively; they are stored lower-cased.
/// Row `i` of every matrix derived from the dataset belongs to `name(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneUniverse {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl GeneUniverse {
    /// Build from gene names in row order. Duplicate names (after lower-casing)
    /// are rejected.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut indices = HashMap::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if indices.insert(name.clone(), ordered.len()).is_some() {
                return Err(MorphError::DuplicateGene { gene: name });
            }
            ordered.push(name);
        }
        Ok(Self {
            names: ordered,
            indices,
        })
    }

    /// Number of genes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Row index of a gene, if present
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(&name.trim().to_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Name of the gene at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// All names in row order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fail with `IndexOutOfRange` unless `index` is a valid row
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.names.len() {
            Ok(())
        } else {
            Err(MorphError::IndexOutOfRange {
                index,
                size: self.names.len(),
            })
        }
    }
}
