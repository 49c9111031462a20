#[derive(Debug, thiserror::Error)]
pub enum TpError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, TpError>;
