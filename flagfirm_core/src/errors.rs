use thiserror::Error;

use crate::{catalog::Check, validator::Rejection};

#[derive(Debug, Error)]
pub enum Error {
    #[error("parsing ${key} for {check}: {source}")]
    Config {
        check: Check,
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("{0}")]
    InvalidFlag(Box<Rejection>),

    #[error("{0}")]
    MissingArgument(Box<Rejection>),

    #[error("given flag check not found: {name}")]
    UnknownCheck { name: String },

    #[error("given tool not found: {name}")]
    UnknownTool { name: String },

    #[error("failed to parse embedded flag catalog: {source}")]
    CatalogLoad {
        #[from]
        source: serde_yaml::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
