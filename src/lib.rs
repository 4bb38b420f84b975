pub mod bio;
pub mod cli;
pub mod core;
pub mod report;
pub mod storage;
pub mod tools;
pub mod utils;

pub use crate::core::{
    cluster_filter::ClusterFilter, distance_matrix::DistanceMatrixBuilder,
    guided::GuidedClusterer, single_linkage::SingleLinkageClusterer,
    supermatrix::SupermatrixAssembler,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SumacError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<bincode::Error> for SumacError {
    fn from(err: bincode::Error) -> Self {
        SumacError::Index(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SumacError>;
