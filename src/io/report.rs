//! Ranking reports
//!
//! One report per group of genes of interest, built from its best ranking.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::config::SpeciesSpec;
use crate::data::GeneDescriptions;
use crate::error::{MorphError, Result};
use crate::ranking::Ranking;

/// One candidate gene of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub rank: usize,
    pub gene: String,
    pub score: f64,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_web_page: Option<String>,
}

/// Best ranking of a group of genes of interest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    #[serde(skip)]
    pub species: String,
    #[serde(skip)]
    pub goi_name: String,
    pub best_ausr: f64,
    pub average_ausr: f64,
    pub gene_expression_name: String,
    pub clustering_name: String,
    pub goi_genes_present: Vec<String>,
    pub goi_genes_missing: Vec<String>,
    /// Empirical p-value of `best_ausr` against random gene sets, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    pub candidates: Vec<Candidate>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    ranking: &'a RankingReport,
}

impl RankingReport {
    /// Report on `ranking`, keeping at most `top_k` candidates
    pub fn new(
        species: &SpeciesSpec,
        ranking: &Ranking,
        average_ausr: f64,
        descriptions: &GeneDescriptions,
        top_k: Option<usize>,
    ) -> Self {
        let universe = ranking.universe();
        let gene_name = |idx: usize| universe.name(idx).unwrap_or_default().to_string();

        let candidates = ranking
            .ranked_genes()
            .into_iter()
            .take(top_k.unwrap_or(usize::MAX))
            .map(|ranked| {
                let gene = gene_name(ranked.gene_idx);
                Candidate {
                    rank: ranked.rank,
                    score: ranked.score,
                    annotation: descriptions.get(&gene).to_string(),
                    gene_web_page: species.gene_web_page(&gene),
                    gene,
                }
            })
            .collect();

        Self {
            species: species.name.clone(),
            goi_name: ranking.goi().name().to_string(),
            best_ausr: ranking.ausr(),
            average_ausr,
            gene_expression_name: ranking.dataset().to_string(),
            clustering_name: ranking.clustering().to_string(),
            goi_genes_present: ranking.goi().genes().iter().map(|&g| gene_name(g)).collect(),
            goi_genes_missing: ranking.goi().missing().to_vec(),
            p_value: None,
            candidates,
        }
    }

    /// File name stem: `<species>__<goi>` with spaces replaced
    pub fn file_stem(&self) -> String {
        format!("{}__{}", self.species, self.goi_name).replace(' ', "_")
    }

    /// Plain text rendering
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "Best AUSR: {:.2}", self.best_ausr);
        let _ = writeln!(out, "Average AUSR: {:.2}", self.average_ausr);
        let _ = writeln!(out, "Gene expression data set: {}", self.gene_expression_name);
        let _ = writeln!(out, "Clustering: {}", self.clustering_name);
        let _ = writeln!(
            out,
            "Genes of interest present in data set: {}",
            self.goi_genes_present.join(" ")
        );
        if !self.goi_genes_missing.is_empty() {
            let _ = writeln!(
                out,
                "Genes of interest missing in data set: {}",
                self.goi_genes_missing.join(" ")
            );
        }
        if let Some(p) = self.p_value {
            let _ = writeln!(out, "P-value: {:.4}", p);
        }
        out.push('\n');
        out.push_str("Candidates:\n");
        out.push_str("Rank\tGene ID\tScore\tAnnotation\tGene web page\n");
        for c in &self.candidates {
            let _ = writeln!(
                out,
                "{}\t{}\t{:.2}\t{}\t{}",
                c.rank,
                c.gene,
                c.score,
                c.annotation,
                c.gene_web_page.as_deref().unwrap_or("")
            );
        }
        out
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&ReportDocument { ranking: self })?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ReportDocument { ranking: self })?)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Yaml => self.to_yaml(),
            ReportFormat::Json => self.to_json(),
        }
    }
}

/// Output format of reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Yaml,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Yaml => "yaml",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            "json" => Ok(ReportFormat::Json),
            other => Err(MorphError::InvalidConfig {
                reason: format!("Unknown report format '{}'. Use 'text', 'yaml' or 'json'.", other),
            }),
        }
    }
}

/// Receives finished reports
pub trait ReportSink {
    fn emit(&mut self, report: RankingReport) -> Result<()>;
}

/// Collects reports in memory
impl ReportSink for Vec<RankingReport> {
    fn emit(&mut self, report: RankingReport) -> Result<()> {
        self.push(report);
        Ok(())
    }
}

/// Writes every report to its own file in a directory
#[derive(Debug, Clone)]
pub struct DirectoryReportSink {
    directory: PathBuf,
    format: ReportFormat,
}

impl DirectoryReportSink {
    /// Create the sink, creating `directory` if needed
    pub fn new<P: AsRef<Path>>(directory: P, format: ReportFormat) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory, format })
    }

    /// Path a report is written to
    pub fn path_of(&self, report: &RankingReport) -> PathBuf {
        self.directory
            .join(format!("{}.{}", report.file_stem(), self.format.extension()))
    }
}

impl ReportSink for DirectoryReportSink {
    fn emit(&mut self, report: RankingReport) -> Result<()> {
        let path = self.path_of(&report);
        fs::write(&path, report.render(self.format)?)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
