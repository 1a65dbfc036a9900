use thiserror::Error;

/// Errors raised while interpreting range addresses.
///
/// The synchronizer itself never fails; these only surface when a
/// configured range string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
