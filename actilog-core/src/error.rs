#[derive(thiserror::Error, Debug)]
pub enum ActilogError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ActilogError>;
