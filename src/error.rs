use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    /// Rejected input; raised before the store is touched
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl ReviewError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ReviewError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
