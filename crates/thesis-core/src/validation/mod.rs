//! Validation modules

pub mod file;
pub mod steps;

pub use file::{FileValidationError, FileValidator};
pub use steps::StepValidator;
