//! Domain models mirrored from the remote collections.

mod application;
mod opportunity;

pub use application::*;
pub use opportunity::*;
