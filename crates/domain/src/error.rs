use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("frame rate must be a positive finite number, got {0}")]
    InvalidFrameRate(f64),
}
