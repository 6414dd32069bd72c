use thiserror::Error;

use orderbot_core::errors::StorageError;

pub mod memory;
pub mod order;

pub use memory::InMemoryOrderStorage;
pub use order::SqlOrderStorage;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("food item `{0}` is not on the menu")]
    UnknownFoodItem(String),
}

impl From<RepositoryError> for StorageError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => StorageError::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => StorageError::Decode(message),
            RepositoryError::UnknownFoodItem(name) => StorageError::UnknownFoodItem(name),
        }
    }
}
