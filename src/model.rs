use serde::{Deserialize, Serialize};

// ============================================================================
// Reference Data
// ============================================================================

/// A publishable language, as served by the `admin.languages` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Canonical category record, as served by the `admin.categories` route.
///
/// Carries no selection state: the cached copy is shared between drafts.
/// See [`crate::compose::CategorySelection`] for the per-draft view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// ============================================================================
// Images
// ============================================================================

/// One image chosen in the picker dialog.
///
/// Field names on the wire follow the image listing endpoint
/// (`u_id`, `thumb_url`, `alt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSelection {
    #[serde(rename = "u_id")]
    pub id: String,
    #[serde(rename = "thumb_url")]
    pub url: String,
    #[serde(rename = "alt", default)]
    pub alt_text: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

// ============================================================================
// Draft
// ============================================================================

/// Values captured from the composition form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftForm {
    pub title: String,
    pub sub_title: String,
    pub published: bool,
    pub language_id: i64,
    pub slug: String,
    /// Open a discussion thread for the article after a published submit.
    pub forum_published: bool,
}

/// The article payload sent to the submission route.
///
/// Only ever built whole, immediately before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDraft {
    pub title: String,
    pub sub_title: String,
    pub body: String,
    pub keywords: Vec<String>,
    #[serde(serialize_with = "bool_as_int")]
    pub published: bool,
    pub language_id: i64,
    pub slug: String,
    #[serde(rename = "category")]
    pub category_ids: Vec<i64>,
    #[serde(rename = "image")]
    pub cover_image_id: Option<String>,
}

/// The admin API stores publication state as 1/0.
fn bool_as_int<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}
