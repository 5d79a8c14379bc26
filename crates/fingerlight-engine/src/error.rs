use fingerlight_hardware::HardwareError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] fingerlight_core::Error),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error("Render thread failed: {0}")]
    RenderThread(String),
}

pub type Result<T> = std::result::Result<T, Error>;
