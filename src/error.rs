//! Errors raised while reading dashboard input.
//!
//! Simulation code never fails; it clamps and defaults. The only thing that
//! can go wrong is an option object that does not have the expected shape.
//! The wasm facade logs these and reports failure through its return value.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid {what}: {message}")]
    InvalidInput { what: &'static str, message: String },
}

impl SceneError {
    pub fn invalid(what: &'static str, err: impl std::fmt::Display) -> Self {
        SceneError::InvalidInput {
            what,
            message: err.to_string(),
        }
    }
}
