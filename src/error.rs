use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("student not found: {0}")]
    NotFound(Uuid),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, AssessmentError>;
