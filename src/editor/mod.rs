//! Rich-text editor seam.
//!
//! The composition workflow only talks to the editor through
//! [`RichTextEditor`] and creates instances through an [`EditorHost`].
//! [`MarkdownEditor`] is the bundled implementation used by the CLI: the
//! author writes Markdown, `content()` yields HTML.

mod markdown;

pub use markdown::{MarkdownEditor, MarkdownEditorHost};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Editor binding target {0} is not present")]
    TargetMissing(String),
    #[error("Editor failed to initialize: {0}")]
    Init(String),
}

/// Editor setup, mirrored from the admin UI's widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Id of the element the editor binds to.
    pub element_id: String,
    pub height: u32,
    pub plugins: Vec<String>,
    pub toolbar: String,
    pub skin_url: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            element_id: "tinymce-textarea".to_string(),
            height: 420,
            plugins: ["link", "paste", "table", "image"]
                .into_iter()
                .map(String::from)
                .collect(),
            toolbar: "image".to_string(),
            skin_url: "/assets/skins/lightgray".to_string(),
        }
    }
}

impl EditorOptions {
    /// CSS selector of the binding target.
    pub fn selector(&self) -> String {
        format!("#{}", self.element_id)
    }
}

/// Editor events a controller can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorEvent {
    /// A key was released; the callback receives the current content.
    KeyUp,
}

/// An entry in one of the editor's menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: &'static str,
    pub text: &'static str,
    /// Menu the item is placed in (e.g. `tools`).
    pub context: &'static str,
}

/// The tools-menu action that opens the image picker for inline insertion.
pub const ADD_IMAGE_ITEM: MenuItem = MenuItem {
    id: "add-image",
    text: "Add Image",
    context: "tools",
};

pub type ContentCallback = Box<dyn FnMut(&str) + Send>;
pub type ClickCallback = Box<dyn FnMut() + Send>;

/// A live editor instance.
pub trait RichTextEditor: Send {
    /// Current document as HTML.
    fn content(&self) -> String;

    /// Insert an HTML fragment at the insertion point.
    fn insert_content(&mut self, html: &str);

    fn on(&mut self, event: EditorEvent, callback: ContentCallback);

    fn add_menu_item(&mut self, item: MenuItem, on_click: ClickCallback);

    /// Release DOM bindings and listeners. Further calls are no-ops.
    fn destroy(&mut self);
}

/// Creates editors bound to a target element.
pub trait EditorHost: Send + Sync {
    /// Whether the element matched by `selector` exists yet.
    fn has_target(&self, selector: &str) -> bool;

    fn initialize(&self, options: &EditorOptions) -> Result<Box<dyn RichTextEditor>, EditorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = EditorOptions::default();
        assert_eq!(options.selector(), "#tinymce-textarea");
        assert_eq!(options.height, 420);
        assert_eq!(options.plugins, vec!["link", "paste", "table", "image"]);
        assert_eq!(options.skin_url, "/assets/skins/lightgray");
    }
}
