//! Data models for the proposal wizard
//!
//! Each sub-module covers one part of the domain: the draft itself, the upload
//! slot, the static step definitions, validation outcomes, directory entries
//! and the submission payload.

mod draft;
mod step;
mod submission;
mod supervisor;
mod upload;
mod validation;

pub use draft::*;
pub use step::*;
pub use submission::*;
pub use supervisor::*;
pub use upload::*;
pub use validation::*;
