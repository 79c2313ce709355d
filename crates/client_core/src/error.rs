use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("server rejected request ({status}): {error}")]
    Api { status: u16, error: ApiError },
    #[error("{0}")]
    Injected(String),
}
