use thiserror::Error;

/// Fatal errors that abort a run immediately (spec §7).
#[derive(Error, Debug)]
pub enum DmrgError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("numeric error at site {site}: {detail}")]
    Numeric { site: usize, detail: String },

    #[error(transparent)]
    Mps(#[from] tn::MpsError),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DmrgError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        DmrgError::Configuration(msg.into())
    }

    pub fn numeric(site: usize, detail: impl Into<String>) -> Self {
        DmrgError::Numeric { site, detail: detail.into() }
    }
}
