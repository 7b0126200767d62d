use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::Direction;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("control file error: {0}")]
    ControlFile(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("no tip reachable following {direction:?} links from node {node}")]
    InvalidTraversal { node: usize, direction: Direction },

    #[error("could not simulate a valid tree after {0} rejected attempts")]
    RetryLimitExceeded(usize),

    #[error("output file {0:?} already exists and overwrite is disabled")]
    OutputExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, SimError>;
