use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Startup errors
    #[error("Fingerprint sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Invalid strip length: {0} (must be at least 1)")]
    InvalidStripLength(usize),

    // Identity errors
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
