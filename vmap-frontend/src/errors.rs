use thiserror::Error;
use vmap_core::store::StoreError;
use vmap_engine::errors::EngineError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
