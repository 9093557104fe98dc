//! Input/Output: data set readers, ranking reports and random gene set results

mod baits;
mod report;
mod tsv;

pub use baits::{read_null_distribution, write_null_distribution};
pub use report::{Candidate, DirectoryReportSink, RankingReport, ReportFormat, ReportSink};
pub use tsv::{
    read_background_set, read_clustering, read_expression_matrix, read_gene_descriptions,
    read_genes_of_interest, write_correlations, write_summary, FileDatasetSource,
};
