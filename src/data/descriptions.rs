//! Gene annotations shown next to ranked candidates

use std::collections::HashMap;

/// Free-text description per gene name
#[derive(Debug, Clone, Default)]
pub struct GeneDescriptions {
    descriptions: HashMap<String, String>,
}

impl GeneDescriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a description. Names are lower-cased; the first description of a
    /// gene is kept and `false` is returned for later ones.
    pub fn insert(&mut self, gene: &str, description: impl Into<String>) -> bool {
        let gene = gene.trim().to_lowercase();
        if self.descriptions.contains_key(&gene) {
            return false;
        }
        self.descriptions.insert(gene, description.into());
        true
    }

    /// Description of a gene, empty if unknown
    pub fn get(&self, gene: &str) -> &str {
        self.descriptions
            .get(gene)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}
