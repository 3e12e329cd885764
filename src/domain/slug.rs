//! Slug derivation for groups.
//!
//! Titles are slugified with the `slug` crate, which transliterates
//! non-ASCII input (`"Тестовая группа"` becomes an ASCII, hyphenated slug).

use slug::slugify;
use thiserror::Error;

const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` may only contain lowercase letters, digits, `-` and `_`")]
    InvalidCharacters { slug: String },
}

/// Derive a slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut candidate = slugify(input);
    if candidate.len() > MAX_SLUG_LEN {
        candidate.truncate(MAX_SLUG_LEN);
        while candidate.ends_with('-') {
            candidate.pop();
        }
    }

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Accept an explicit slug as long as it is already in canonical form.
pub fn validate_slug(slug: &str) -> Result<&str, SlugError> {
    if slug.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let valid = slug
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
    if !valid {
        return Err(SlugError::InvalidCharacters {
            slug: slug.to_string(),
        });
    }

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_from_ascii_title() {
        assert_eq!(derive_slug("Weekend Notes").expect("slug"), "weekend-notes");
    }

    #[test]
    fn derive_slug_transliterates_cyrillic() {
        let slug = derive_slug("Тестовая группа").expect("slug");
        assert!(slug.is_ascii());
        assert!(slug.starts_with("testov"));
        assert!(slug.contains('-'));
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn validate_slug_accepts_underscores() {
        assert_eq!(validate_slug("another_test-slug"), Ok("another_test-slug"));
    }

    #[test]
    fn validate_slug_rejects_uppercase() {
        assert!(matches!(
            validate_slug("Test"),
            Err(SlugError::InvalidCharacters { .. })
        ));
    }
}
