//! Article composition workflow.
//!
//! [`ArticleDraftController`] owns one draft from the moment the screen
//! opens: it loads reference data, binds the editor once both lists are in,
//! gathers keywords, categories and images, and submits.

mod categories;
mod controller;
mod error;
mod images;
mod keywords;
mod subscriptions;

pub use categories::{CategoryChoice, CategorySelection};
pub use controller::{
    ArticleDraftController, Collaborators, ComposeEvent, ComposerSettings, DraftState,
};
pub use error::ComposeError;
pub use images::{apply_inline, image_markup, CoverBinding, CoverImage, ImageAttachmentFlow};
pub use keywords::{ChipKey, KeywordInput, KeywordList, SEPARATOR_KEYS};
pub use subscriptions::SubscriptionSet;
