//! Data types shared by the command implementations.

pub mod error;
pub mod summary;

pub use error::*;
pub use summary::*;
