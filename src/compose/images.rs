use std::sync::Arc;

use crate::api::routes;
use crate::api::{ApiError, ArticleService};
use crate::editor::RichTextEditor;
use crate::model::ImageSelection;
use crate::picker::{ImagePicker, PickerHandle, PickerOutcome, PickerRequest};
use crate::util::escape_attr;

/// The draft's cover image: what the preview shows and what gets submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub id: String,
    pub preview_url: String,
}

/// Cover image state of one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverBinding {
    current: Option<CoverImage>,
}

impl CoverBinding {
    /// Bind a selected image; a cancellation keeps the previous binding.
    /// Returns true if the binding changed.
    pub fn apply(&mut self, outcome: PickerOutcome) -> bool {
        match outcome {
            PickerOutcome::Selected(image) => {
                tracing::debug!(image_id = %image.id, "Cover image bound");
                self.current = Some(CoverImage {
                    id: image.id,
                    preview_url: image.url,
                });
                true
            }
            PickerOutcome::Cancelled => false,
        }
    }

    pub fn current(&self) -> Option<&CoverImage> {
        self.current.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id.as_str())
    }
}

/// Opens pickers for the two places an image can go: inline in the body,
/// or as the cover.
///
/// Holds no per-dialog state; every `open_*` call owns its own handle, so
/// several pickers may be open at once.
#[derive(Clone)]
pub struct ImageAttachmentFlow {
    picker: Arc<dyn ImagePicker>,
    inline_request: PickerRequest,
    cover_request: PickerRequest,
}

impl ImageAttachmentFlow {
    pub fn new(
        picker: Arc<dyn ImagePicker>,
        inline_request: PickerRequest,
        cover_request: PickerRequest,
    ) -> Self {
        Self {
            picker,
            inline_request,
            cover_request,
        }
    }

    /// Build both picker requests from the service's route table. Inline
    /// images use full-size storage URLs, the cover uses thumbnails.
    pub fn from_service(
        picker: Arc<dyn ImagePicker>,
        service: &dyn ArticleService,
    ) -> Result<Self, ApiError> {
        let listing = service.endpoint(routes::IMAGES)?;
        let inline_request = PickerRequest {
            image_request: listing.clone(),
            thumb_image_url: service.endpoint(routes::STORAGE_IMAGES)?,
        };
        let cover_request = PickerRequest {
            image_request: listing,
            thumb_image_url: service.endpoint(routes::STORAGE_THUMBS)?,
        };
        Ok(Self::new(picker, inline_request, cover_request))
    }

    pub fn open_inline(&self) -> PickerHandle {
        self.picker.open(self.inline_request.clone())
    }

    pub fn open_cover(&self) -> PickerHandle {
        self.picker.open(self.cover_request.clone())
    }

    /// Abandon every picker still open through this flow's picker.
    pub fn close(&self) {
        self.picker.close();
    }
}

/// Insert a selected image at the editor's insertion point. Cancellation
/// inserts nothing. Returns true if markup was inserted.
pub fn apply_inline(editor: &mut dyn RichTextEditor, outcome: PickerOutcome) -> bool {
    match outcome {
        PickerOutcome::Selected(image) => {
            editor.insert_content(&image_markup(&image));
            tracing::debug!(image_id = %image.id, "Inline image inserted");
            true
        }
        PickerOutcome::Cancelled => false,
    }
}

/// Self-closing `<img>` fragment for an inline image.
pub fn image_markup(image: &ImageSelection) -> String {
    format!(
        r#"<img src="{}" alt="{}" width="{}" height="{}" />"#,
        escape_attr(&image.url),
        escape_attr(&image.alt_text),
        image.width,
        image.height
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MarkdownEditor;
    use crate::picker::PickerResponder;
    use std::sync::Mutex;
    use url::Url;

    /// Keeps every responder so the test decides when, and in which order,
    /// open dialogs answer.
    #[derive(Default)]
    struct HeldPicker {
        open: Mutex<Vec<(PickerRequest, PickerResponder)>>,
    }

    impl HeldPicker {
        fn take(&self, thumb_path: &str) -> PickerResponder {
            let mut open = self.open.lock().unwrap();
            let index = open
                .iter()
                .position(|(request, _)| request.thumb_image_url.path() == thumb_path)
                .unwrap();
            open.remove(index).1
        }
    }

    impl ImagePicker for HeldPicker {
        fn open(&self, request: PickerRequest) -> PickerHandle {
            let (responder, handle) = PickerHandle::channel();
            self.open.lock().unwrap().push((request, responder));
            handle
        }
    }

    fn held_flow() -> (Arc<HeldPicker>, ImageAttachmentFlow) {
        let picker = Arc::new(HeldPicker::default());
        let listing = Url::parse("https://admin.example.com/image/images").unwrap();
        let flow = ImageAttachmentFlow::new(
            picker.clone(),
            PickerRequest {
                image_request: listing.clone(),
                thumb_image_url: Url::parse("https://admin.example.com/storage/images").unwrap(),
            },
            PickerRequest {
                image_request: listing,
                thumb_image_url: Url::parse("https://admin.example.com/storage/images/thumbs")
                    .unwrap(),
            },
        );
        (picker, flow)
    }

    fn selection(id: &str) -> ImageSelection {
        ImageSelection {
            id: id.to_string(),
            url: format!("https://cdn.example.com/{id}.jpg"),
            alt_text: "A \"nice\" view".to_string(),
            width: 800,
            height: 600,
        }
    }

    #[test]
    fn test_image_markup() {
        assert_eq!(
            image_markup(&selection("v1")),
            r#"<img src="https://cdn.example.com/v1.jpg" alt="A &quot;nice&quot; view" width="800" height="600" />"#
        );
    }

    #[test]
    fn test_cover_selection_replaces_binding() {
        let mut cover = CoverBinding::default();
        assert!(cover.apply(PickerOutcome::Selected(selection("a"))));
        assert!(cover.apply(PickerOutcome::Selected(selection("b"))));
        assert_eq!(cover.id(), Some("b"));
        assert_eq!(
            cover.current().map(|c| c.preview_url.as_str()),
            Some("https://cdn.example.com/b.jpg")
        );
    }

    #[test]
    fn test_cover_cancel_keeps_binding() {
        let mut cover = CoverBinding::default();
        cover.apply(PickerOutcome::Selected(selection("a")));
        assert!(!cover.apply(PickerOutcome::Cancelled));
        assert_eq!(cover.id(), Some("a"));

        let mut empty = CoverBinding::default();
        empty.apply(PickerOutcome::Cancelled);
        assert_eq!(empty.id(), None);
    }

    #[test]
    fn test_inline_cancel_inserts_nothing() {
        let mut editor = MarkdownEditor::new("Body");
        let before = editor.content();
        assert!(!apply_inline(&mut editor, PickerOutcome::Cancelled));
        assert_eq!(editor.content(), before);
    }

    #[tokio::test]
    async fn test_concurrent_pickers_resolve_independently() {
        let (picker, flow) = held_flow();
        let inline = flow.open_inline();
        let cover = flow.open_cover();
        assert_eq!(picker.open.lock().unwrap().len(), 2);

        // answered in reverse order of opening
        picker.take("/storage/images/thumbs").select(selection("cover"));
        picker.take("/storage/images").select(selection("inline"));

        let mut binding = CoverBinding::default();
        assert!(binding.apply(cover.outcome().await));
        let mut editor = MarkdownEditor::new("Body");
        assert!(apply_inline(&mut editor, inline.outcome().await));

        assert_eq!(binding.id(), Some("cover"));
        let content = editor.content();
        assert!(content.contains("https://cdn.example.com/inline.jpg"));
        assert!(!content.contains("cover.jpg"));
    }

    #[tokio::test]
    async fn test_cancelled_picker_does_not_affect_other() {
        let (picker, flow) = held_flow();
        let mut binding = CoverBinding::default();
        binding.apply(PickerOutcome::Selected(selection("old")));

        let inline = flow.open_inline();
        let cover = flow.open_cover();
        picker.take("/storage/images").select(selection("inline"));
        picker.take("/storage/images/thumbs").cancel();

        assert!(!binding.apply(cover.outcome().await));
        assert_eq!(binding.id(), Some("old"));

        let mut editor = MarkdownEditor::new("");
        assert!(apply_inline(&mut editor, inline.outcome().await));
        assert!(editor.content().contains("inline.jpg"));
    }

    #[test]
    fn test_inline_selection_inserted() {
        let mut editor = MarkdownEditor::new("Body");
        assert!(apply_inline(&mut editor, PickerOutcome::Selected(selection("z"))));
        assert!(editor
            .content()
            .contains(r#"<img src="https://cdn.example.com/z.jpg""#));
    }
}
