//! URL utilities for consistent URL handling
//!
//! This module provides utilities for normalizing base URLs so endpoint
//! construction never produces double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use scrivano::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://example.com/v1"), "https://example.com/v1");
/// assert_eq!(normalize_base_url("https://example.com/v1/"), "https://example.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct the `generateContent` endpoint URL for a model.
///
/// # Examples
///
/// ```
/// use scrivano::utils::url::generate_content_url;
///
/// assert_eq!(
///     generate_content_url("https://generativelanguage.googleapis.com/v1beta/", "gemini-2.5-flash"),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
/// );
/// ```
pub fn generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        normalize_base_url(base_url),
        model
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com/v1"),
            "https://api.example.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1/"),
            "https://api.example.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1///"),
            "https://api.example.com/v1"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn test_generate_content_url() {
        assert_eq!(
            generate_content_url("https://generativelanguage.googleapis.com/v1beta", "gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        // Trailing slashes on the base URL collapse
        assert_eq!(
            generate_content_url("https://example.com/api//", "m"),
            "https://example.com/api/models/m:generateContent"
        );
    }
}
