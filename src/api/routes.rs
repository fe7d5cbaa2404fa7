use std::collections::HashMap;
use url::Url;

use super::ApiError;

pub const LANGUAGES: &str = "admin.languages";
pub const CATEGORIES: &str = "admin.categories";
pub const ARTICLES: &str = "admin.articles";
pub const IMAGES: &str = "image.images";
pub const STORAGE_IMAGES: &str = "storage.images";
pub const STORAGE_THUMBS: &str = "storage.images.thumbs";

/// Built-in route name → relative path mapping.
const DEFAULT_ROUTES: &[(&str, &str)] = &[
    (LANGUAGES, "admin/languages"),
    (CATEGORIES, "admin/categories"),
    (ARTICLES, "admin/articles"),
    (IMAGES, "image/images"),
    (STORAGE_IMAGES, "storage/images"),
    (STORAGE_THUMBS, "storage/images/thumbs"),
];

/// Resolves named admin routes to absolute URLs under one base.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base: Url,
    paths: HashMap<String, String>,
}

impl RouteTable {
    /// Build a table over `base`, with `overrides` replacing or adding paths.
    pub fn new(base: &str, overrides: &HashMap<String, String>) -> Result<Self, ApiError> {
        // Url::join drops the last segment of a base without a trailing slash
        let normalized = if base.ends_with('/') {
            base.to_owned()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|_| ApiError::InvalidBaseUrl(base.to_owned()))?;

        let mut paths: HashMap<String, String> = DEFAULT_ROUTES
            .iter()
            .map(|(name, path)| ((*name).to_owned(), (*path).to_owned()))
            .collect();
        for (name, path) in overrides {
            paths.insert(name.clone(), path.trim_start_matches('/').to_owned());
        }

        Ok(Self { base, paths })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a route name.
    pub fn url(&self, name: &str) -> Result<Url, ApiError> {
        let path = self
            .paths
            .get(name)
            .ok_or_else(|| ApiError::UnknownRoute(name.to_owned()))?;
        self.base
            .join(path)
            .map_err(|_| ApiError::UnknownRoute(name.to_owned()))
    }
}
