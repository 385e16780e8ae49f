//! Utility functions for the movie loader repository.

use crate::errors::SearchStoreError;

/// Characters OpenSearch does not allow in an index name.
const FORBIDDEN_CHARACTERS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Validate a collection name against the cluster's index naming rules.
///
/// Names must be non-empty, lowercase, must not start with `_`, `-` or `+`,
/// and must not contain any of `\ / * ? " < > | , # :` or spaces.
///
/// # Example
///
/// ```
/// use movie_loader_repository::validate_collection_name;
///
/// assert!(validate_collection_name("movies").is_ok());
/// assert!(validate_collection_name("Movies").is_err());
/// ```
pub fn validate_collection_name(name: &str) -> Result<(), SearchStoreError> {
    if name.is_empty() {
        return Err(SearchStoreError::validation("Collection name is required"));
    }

    if name.starts_with(&['_', '-', '+'][..]) {
        return Err(SearchStoreError::validation(format!(
            "Collection name '{}' must not start with '_', '-' or '+'",
            name
        )));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchStoreError::validation(format!(
            "Collection name '{}' must be lowercase",
            name
        )));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARACTERS.contains(c)) {
        return Err(SearchStoreError::validation(format!(
            "Collection name '{}' contains invalid character '{}'",
            name, c
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_collection_names() {
        for name in ["movies", "movies_v1", "films-2019", "a"] {
            assert!(validate_collection_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_collection_names() {
        let test_cases = vec![
            ("", "empty"),
            ("Movies", "uppercase"),
            ("_movies", "leading underscore"),
            ("-movies", "leading dash"),
            ("+movies", "leading plus"),
            ("mov ies", "contains space"),
            ("mov/ies", "contains slash"),
            ("mov*ies", "contains star"),
            ("mov,ies", "contains comma"),
            ("mov#ies", "contains hash"),
            ("mov:ies", "contains colon"),
        ];

        for (name, description) in test_cases {
            let result = validate_collection_name(name);
            assert!(
                matches!(result, Err(SearchStoreError::ValidationError(_))),
                "Expected ValidationError for '{}' ({})",
                name,
                description
            );
        }
    }
}
