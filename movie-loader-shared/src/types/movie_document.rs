//! Movie document types for the search store.
//!
//! This module defines the document structure that is submitted to the search cluster.

use serde::{Deserialize, Serialize};

/// Exclusive upper bound of the generated `numActors` field.
pub const NUM_ACTORS_UPPER_BOUND: u32 = 200;

/// Document representation for the movies collection.
///
/// Every field except `num_actors` is derived from a single CSV record.
/// `num_actors` is filled with a random value in `[0, 200)` when the record
/// is mapped, so two mapping runs over the same file produce different values.
///
/// # Fields
///
/// - `name`: Optional movie title, omitted when the record has no name
/// - `directed_by`: Directors, split from a pipe-delimited field
/// - `genre`: Genres, split from a pipe-delimited field
/// - `initial_release_date`: Optional ISO-8601 date-time (`YYYY-MM-DDT00:00:00Z`)
/// - `num_actors`: Random integer, serialized as `numActors`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub directed_by: Vec<String>,
    pub genre: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_release_date: Option<String>,
    #[serde(rename = "numActors")]
    pub num_actors: u32,
}

impl MovieDocument {
    /// Create a new document.
    ///
    /// # Example
    ///
    /// ```
    /// use movie_loader_shared::MovieDocument;
    ///
    /// let doc = MovieDocument::new(
    ///     Some("Blade Runner".to_string()),
    ///     vec!["Ridley Scott".to_string()],
    ///     vec!["Science Fiction".to_string()],
    ///     Some("1982-06-25T00:00:00Z".to_string()),
    ///     42,
    /// );
    /// assert_eq!(doc.num_actors, 42);
    /// ```
    pub fn new(
        name: Option<String>,
        directed_by: Vec<String>,
        genre: Vec<String>,
        initial_release_date: Option<String>,
        num_actors: u32,
    ) -> Self {
        Self {
            name,
            directed_by,
            genre,
            initial_release_date,
            num_actors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_num_actors_in_camel_case() {
        let doc = MovieDocument::new(
            Some("Alien".to_string()),
            vec!["Ridley Scott".to_string()],
            vec!["Horror".to_string(), "Science Fiction".to_string()],
            Some("1979-05-25T00:00:00Z".to_string()),
            7,
        );

        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "Alien",
                "directed_by": ["Ridley Scott"],
                "genre": ["Horror", "Science Fiction"],
                "initial_release_date": "1979-05-25T00:00:00Z",
                "numActors": 7
            })
        );
    }

    #[test]
    fn test_missing_optional_fields_are_omitted() {
        let doc = MovieDocument::new(None, vec![String::new()], vec![], None, 0);

        let value = serde_json::to_value(&doc).unwrap();

        assert!(value.get("name").is_none());
        assert!(value.get("initial_release_date").is_none());
        assert_eq!(value["directed_by"], json!([""]));
        assert_eq!(value["numActors"], json!(0));
    }
}
