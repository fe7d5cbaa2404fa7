use thiserror::Error;

use super::controller::DraftState;
use crate::api::ApiError;
use crate::editor::EditorError;
use crate::navigation::NavigationError;

/// Failures surfaced by the composition workflow.
///
/// None of these are fatal: the controller stays usable (or terminal after
/// a successful submit) and the message is meant for inline display.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A reference list could not be loaded; the draft stays in `Loading`.
    #[error("Failed to load {key}: {message}")]
    ReferenceLoad { key: &'static str, message: String },

    /// The article was not stored; the draft is back in `Ready`, unchanged.
    #[error("Failed to save article: {0}")]
    Submission(#[source] ApiError),

    /// The discussion hand-off needs a language that is not loaded.
    #[error("No language with id {language_id} is available")]
    InvalidSelection { language_id: i64 },

    #[error("Discussion service URL is not configured")]
    DiscussUrlMissing,

    #[error("Draft cannot be submitted while {0:?}")]
    NotReady(DraftState),

    #[error("Editor has not been initialized")]
    EditorNotInitialized,

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
