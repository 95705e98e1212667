use dvtag_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("probe error: {0}")]
    Probe(String),
    #[error("tag error: {0}")]
    Tags(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}
