//! Post-submit navigation.
//!
//! A submit ends in one of two places: the in-app articles list, or a full
//! navigation out to the discussion service where a thread for the new
//! article is started.

use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use url::Url;

use crate::util::{validate_navigation_url, UrlValidationError};

/// In-app route of the articles listing.
pub const ARTICLES_ROUTE: &str = "/articles";

/// Fragment that opens the new-topic composer on the discussion service.
const NEW_TOPIC_FRAGMENT: &str = "new_topic";

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Invalid discussion URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    #[error("Failed to open browser: {0}")]
    Open(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Leave the composition context entirely.
    Discussion(Url),
    /// Client-side route change to [`ARTICLES_ROUTE`].
    ArticleList,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Discussion(url) => write!(f, "{url}"),
            Destination::ArticleList => f.write_str(ARTICLES_ROUTE),
        }
    }
}

/// Build `<base>?article=<slug>&language=<language>#new_topic`.
pub fn discussion_url(base: &str, article_slug: &str, language_slug: &str) -> Result<Url, NavigationError> {
    let mut url = validate_navigation_url(base)?;
    url.query_pairs_mut()
        .append_pair("article", article_slug)
        .append_pair("language", language_slug);
    url.set_fragment(Some(NEW_TOPIC_FRAGMENT));
    Ok(url)
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &Destination) -> Result<(), NavigationError>;
}

/// Opens discussion URLs in the system browser. The articles list has no
/// browser counterpart outside the admin UI, so it is only logged.
#[derive(Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, destination: &Destination) -> Result<(), NavigationError> {
        match destination {
            Destination::Discussion(url) => {
                // Re-check: the URL may not have come from discussion_url()
                validate_navigation_url(url.as_str())?;
                tracing::info!(url = %url, "Opening discussion thread");
                open::that(url.as_str())?;
            }
            Destination::ArticleList => {
                tracing::info!(route = ARTICLES_ROUTE, "Navigating to articles list");
            }
        }
        Ok(())
    }
}

/// Records destinations instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Destination> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Destination> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &Destination) -> Result<(), NavigationError> {
        tracing::debug!(destination = %destination, "Navigation recorded");
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(destination.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discussion_url_shape() {
        let url = discussion_url("https://forum.example.com/discuss", "my-post", "en").unwrap();
        assert_eq!(
            url.as_str(),
            "https://forum.example.com/discuss?article=my-post&language=en#new_topic"
        );
    }

    #[test]
    fn test_discussion_url_encodes_values() {
        let url = discussion_url("https://forum.example.com/", "a&b c", "pt-br").unwrap();
        assert_eq!(
            url.as_str(),
            "https://forum.example.com/?article=a%26b+c&language=pt-br#new_topic"
        );
    }

    #[test]
    fn test_discussion_url_rejects_bad_base() {
        assert!(matches!(
            discussion_url("javascript:alert(1)", "x", "en"),
            Err(NavigationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(&Destination::ArticleList).unwrap();
        assert_eq!(navigator.visited(), vec![Destination::ArticleList]);
        assert_eq!(navigator.last(), Some(Destination::ArticleList));
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(Destination::ArticleList.to_string(), "/articles");
    }
}
