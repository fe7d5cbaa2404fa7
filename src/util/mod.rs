//! Utility functions for common operations.
//!
//! - **URL validation**: scheme/host checks before handing a URL to a browser
//! - **HTML escaping**: attribute-safe text for generated markup
//!
//! # Examples
//!
//! ```
//! use article_composer::util::{escape_attr, validate_navigation_url};
//!
//! let url = validate_navigation_url("https://forum.example.com/").unwrap();
//! let alt = escape_attr("A \"quoted\" caption");
//! ```

mod html;
mod url_validator;

pub use html::escape_attr;
pub use url_validator::{validate_navigation_url, UrlValidationError};
