//! Admin API access: reference lists, image listing and article submission.
//!
//! - [`routes`] - named route → URL resolution
//! - [`client`] - the [`ArticleService`] seam and its reqwest implementation

mod client;
pub mod routes;

pub use client::{ApiError, ArticleService, HttpArticleService};
pub use routes::RouteTable;
