//! Error types for the TNTVillage scraper
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for TNTVillage scraper operations
#[derive(Error, Debug)]
pub enum TntError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    /// Required HTML element was not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Requested resource was not found (HTTP 404)
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Episode database lookup failed
    #[error("Episode database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for TNTVillage scraper operations
pub type Result<T> = std::result::Result<T, TntError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tnt_error_display_parse_error() {
        let error = TntError::ParseError("missing pagination".to_string());
        assert_eq!(error.to_string(), "Failed to parse HTML: missing pagination");
    }

    #[test]
    fn test_tnt_error_display_element_not_found() {
        let error = TntError::ElementNotFound("div.pagination".to_string());
        assert_eq!(error.to_string(), "Element not found: div.pagination");
    }

    #[test]
    fn test_tnt_error_display_http_status() {
        let error = TntError::HttpStatus(503);
        assert_eq!(error.to_string(), "HTTP status 503");
    }

    #[test]
    fn test_tnt_error_display_rate_limited() {
        let error = TntError::RateLimited;
        assert_eq!(error.to_string(), "Rate limited - too many requests");
    }

    #[test]
    fn test_tnt_error_display_not_found() {
        let error = TntError::NotFound("/src/releaselist.php".to_string());
        assert_eq!(error.to_string(), "Page not found: /src/releaselist.php");
    }

    #[test]
    fn test_tnt_error_from_rusqlite() {
        let error: TntError = rusqlite::Error::InvalidQuery.into();
        assert!(error.to_string().starts_with("Episode database error"));
    }
}
