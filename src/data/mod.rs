//! Data structures for co-expression ranking

pub mod builder;
mod clustering;
mod descriptions;
mod expression;
mod goi;
mod universe;

pub use builder::ClusteringBuilder;
pub use clustering::{Cluster, Clustering, UNCLUSTERED_NAME};
pub use descriptions::GeneDescriptions;
pub use expression::ExpressionMatrix;
pub use goi::{GenesOfInterest, GoiGroup};
pub use universe::GeneUniverse;
