use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowerError {
    #[error("No serial ports found. Specify one with --port.")]
    NoPortFound,

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Raised when Ctrl+C was pressed; not a failure
    #[error("Interrupted")]
    Interrupted,
}

pub type FlowerResult<T> = std::result::Result<T, FlowerError>;
