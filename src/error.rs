use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid focal point {0:?}: expected two integers in the form 'x,y'")]
    InvalidFocus(String),

    #[error("invalid frequency: {0}. Must be a finite value greater than 0")]
    InvalidFrequency(f32),

    #[error("invalid propagation speed: {0}. Must be a finite value greater than 0")]
    InvalidSpeed(f32),

    #[error("invalid maximum radius: {0}. Must be a finite value of at least 0")]
    InvalidRadius(f32),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to read focal point: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
