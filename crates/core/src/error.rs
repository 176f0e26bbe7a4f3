use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::{MediaValidationError, ModuleError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Media(#[from] MediaValidationError),
}
