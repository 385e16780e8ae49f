//! Configuration and dependency initialization for the movie loader.

mod dependencies;
mod settings;

pub use dependencies::{prepare_collection, Dependencies};
pub use settings::{ConnectionMode, LoaderSettings};
