//! Core data structures used across the movie loader.
//! Re-exports specific types like `MovieDocument`.

pub mod movie_document;

pub use movie_document::MovieDocument;
