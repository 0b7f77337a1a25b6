use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Work unit failed for order {0}: {1}")]
    WorkUnitFailed(String, String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
