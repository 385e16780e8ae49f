//! # Movie Loader Shared
//!
//! This crate defines the data structures shared between the movie loader
//! and its search store repository. It includes the document shape that is
//! submitted to the search cluster.

pub mod types;

pub use types::movie_document::{MovieDocument, NUM_ACTORS_UPPER_BOUND};
