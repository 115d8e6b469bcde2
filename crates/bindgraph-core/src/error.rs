use crate::TypeKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Binding not found: {0}")]
    BindingNotFound(TypeKey),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, BindGraphError>;
