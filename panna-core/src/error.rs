use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vision error: {0}")]
    Vision(String),

    #[error("Behavior error: {0}")]
    Behavior(String),

    #[error("Motor error: {0}")]
    Motor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
