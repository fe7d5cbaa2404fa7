use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host to navigate to.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a URL string before it is handed to a browser.
///
/// Rejects anything but `http`/`https` with a host, so configuration can
/// never turn a navigation into `file://` or `javascript:` access.
///
/// # Examples
///
/// ```
/// use article_composer::util::validate_navigation_url;
///
/// let url = validate_navigation_url("https://forum.example.com/t").unwrap();
/// assert_eq!(url.host_str(), Some("forum.example.com"));
///
/// assert!(validate_navigation_url("file:///etc/passwd").is_err());
/// assert!(validate_navigation_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_navigation_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
