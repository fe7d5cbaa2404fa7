use pulldown_cmark::{html, Options, Parser};
use std::collections::HashMap;

use super::{
    ClickCallback, ContentCallback, EditorError, EditorEvent, EditorHost, EditorOptions, MenuItem,
    RichTextEditor,
};

/// Editor over a Markdown source. Inserted HTML fragments are kept as raw
/// HTML blocks, which CommonMark passes through unchanged.
pub struct MarkdownEditor {
    source: String,
    listeners: HashMap<EditorEvent, Vec<ContentCallback>>,
    menu: Vec<(MenuItem, ClickCallback)>,
    destroyed: bool,
}

impl MarkdownEditor {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            listeners: HashMap::new(),
            menu: Vec::new(),
            destroyed: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Append typed text and fire `KeyUp` listeners.
    pub fn type_text(&mut self, text: &str) {
        if self.destroyed {
            return;
        }
        self.source.push_str(text);
        let content = self.content();
        if let Some(listeners) = self.listeners.get_mut(&EditorEvent::KeyUp) {
            for listener in listeners.iter_mut() {
                listener(&content);
            }
        }
    }

    /// Activate a menu item by id. Returns false if no such item exists.
    pub fn click_menu_item(&mut self, id: &str) -> bool {
        match self.menu.iter_mut().find(|(item, _)| item.id == id) {
            Some((_, on_click)) => {
                on_click();
                true
            }
            None => false,
        }
    }

    pub fn menu_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.menu.iter().map(|(item, _)| item)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl RichTextEditor for MarkdownEditor {
    fn content(&self) -> String {
        render_markdown(&self.source)
    }

    fn insert_content(&mut self, html: &str) {
        if self.destroyed {
            return;
        }
        if !self.source.is_empty() && !self.source.ends_with("\n\n") {
            self.source.push_str(if self.source.ends_with('\n') { "\n" } else { "\n\n" });
        }
        self.source.push_str(html);
        self.source.push('\n');
    }

    fn on(&mut self, event: EditorEvent, callback: ContentCallback) {
        if !self.destroyed {
            self.listeners.entry(event).or_default().push(callback);
        }
    }

    fn add_menu_item(&mut self, item: MenuItem, on_click: ClickCallback) {
        if !self.destroyed {
            self.menu.push((item, on_click));
        }
    }

    fn destroy(&mut self) {
        self.listeners.clear();
        self.menu.clear();
        self.destroyed = true;
    }
}

/// Hands out [`MarkdownEditor`]s seeded with a fixed Markdown document.
/// There is no DOM, so the binding target is always present.
#[derive(Debug, Clone, Default)]
pub struct MarkdownEditorHost {
    source: String,
}

impl MarkdownEditorHost {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl EditorHost for MarkdownEditorHost {
    fn has_target(&self, _selector: &str) -> bool {
        true
    }

    fn initialize(&self, options: &EditorOptions) -> Result<Box<dyn RichTextEditor>, EditorError> {
        tracing::debug!(selector = %options.selector(), height = options.height, "Markdown editor initialized");
        Ok(Box::new(MarkdownEditor::new(self.source.clone())))
    }
}

fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
