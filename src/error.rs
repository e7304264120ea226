use thiserror::Error;

use crate::catalog::CatalogError;
use crate::chat::ChatError;
use crate::roulette::SpinError;
use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    FromString(String),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Chat(#[from] ChatError),
    #[error("{0}")]
    Spin(#[from] SpinError),
    #[error("No recipe with id '{0}'")]
    UnknownRecipe(String),
    #[error("{0}")]
    Other(String),
}
