pub mod cluster;
pub mod cluster_filter;
pub mod config;
pub mod distance_matrix;
pub mod guided;
pub mod pipeline;
pub mod single_linkage;
pub mod supermatrix;

pub use cluster::Cluster;
pub use cluster_filter::{ClusterFilter, DuplicatePolicy, FilterOutcome, TaxonCluster};
pub use config::Config;
pub use distance_matrix::{DistanceMatrix, DistanceMatrixBuilder, MatrixBuild};
pub use guided::{GuidedClusterer, GuidedOutcome};
pub use pipeline::{ClusteringStrategy, Pipeline, PipelineSummary};
pub use single_linkage::{ClusteringOutcome, SingleLinkageClusterer};
pub use supermatrix::{AlignedBlock, Supermatrix, SupermatrixAssembler};
