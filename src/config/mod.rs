//! Run configuration: species data sets and job lists
//!
//! Both files are YAML. Relative paths are resolved against the data path of
//! the enclosing level when the file is loaded, so everything downstream
//! works with final paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{MorphError, Result};

fn default_data_path() -> PathBuf {
    PathBuf::from(".")
}

/// Species configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of all species data paths
    #[serde(default = "default_data_path")]
    pub species_data_path: PathBuf,

    #[serde(default)]
    pub species: Vec<SpeciesSpec>,
}

/// One species and its data sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSpec {
    pub name: String,

    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Tab-separated `gene<TAB>description` file
    #[serde(default)]
    pub gene_descriptions: Option<PathBuf>,

    /// Regular expression every gene of interest must match, ignoring case
    #[serde(default)]
    pub gene_pattern: Option<String>,

    /// Link template for report rows; `$name` is replaced by the gene name
    #[serde(default)]
    pub gene_web_page: Option<String>,

    #[serde(default)]
    pub expression_matrices: Vec<ExpressionSpec>,
}

/// An expression matrix and the clusterings defined over it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionSpec {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub clusterings: Vec<ClusteringSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSpec {
    pub name: String,
    pub path: PathBuf,
}

impl Config {
    /// Load from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML, resolve paths and validate
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.resolve_paths();
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self) {
        for species in &mut self.species {
            species.data_path = self.species_data_path.join(&species.data_path);
            let root = &species.data_path;
            if let Some(path) = &mut species.gene_descriptions {
                *path = root.join(&*path);
            }
            for expression in &mut species.expression_matrices {
                expression.path = root.join(&expression.path);
                for clustering in &mut expression.clusterings {
                    clustering.path = root.join(&clustering.path);
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for species in &self.species {
            if species.name.trim().is_empty() {
                return Err(MorphError::InvalidConfig {
                    reason: "species without a name".to_string(),
                });
            }
            if !names.insert(species.name.as_str()) {
                return Err(MorphError::InvalidConfig {
                    reason: format!("species '{}' is configured twice", species.name),
                });
            }
            species.gene_pattern()?;
        }
        Ok(())
    }

    /// Species by name
    pub fn species(&self, name: &str) -> Option<&SpeciesSpec> {
        self.species.iter().find(|s| s.name == name)
    }
}

impl SpeciesSpec {
    /// Compiled gene name pattern, anchored at both ends
    pub fn gene_pattern(&self) -> Result<Option<Regex>> {
        let Some(pattern) = &self.gene_pattern else {
            return Ok(None);
        };
        RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|e| MorphError::InvalidConfig {
                reason: format!("gene_pattern of species '{}': {}", self.name, e),
            })
    }

    /// Web page of a gene, if a template is configured
    pub fn gene_web_page(&self, gene: &str) -> Option<String> {
        self.gene_web_page
            .as_ref()
            .map(|template| template.replace("$name", gene))
    }
}

/// Job list: groups of genes of interest per species
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default)]
    pub jobs: Vec<JobGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGroup {
    pub species_name: String,

    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    #[serde(default)]
    pub genes_of_interest: Vec<GoiSpec>,
}

/// A named group of genes of interest, listed inline or in a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoiSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: GoiSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GoiSource {
    Inline { genes: Vec<String> },
    File { path: PathBuf },
}

impl JobList {
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut jobs: Self = serde_yaml::from_str(content)?;
        for group in &mut jobs.jobs {
            group.data_path = jobs.data_path.join(&group.data_path);
            for goi in &mut group.genes_of_interest {
                if let GoiSource::File { path } = &mut goi.source {
                    *path = group.data_path.join(&*path);
                }
            }
        }
        Ok(jobs)
    }

    /// Genes of interest per species, in the species order of `config`.
    ///
    /// A job naming a species the configuration lacks is an error.
    pub fn assign<'a>(&'a self, config: &Config) -> Result<Vec<Vec<&'a GoiSpec>>> {
        let mut assigned = vec![Vec::new(); config.species.len()];
        for group in &self.jobs {
            let position = config
                .species
                .iter()
                .position(|s| s.name == group.species_name)
                .ok_or_else(|| MorphError::InvalidConfig {
                    reason: format!("Unknown species in job list: {}", group.species_name),
                })?;
            assigned[position].extend(group.genes_of_interest.iter());
        }
        Ok(assigned)
    }
}
