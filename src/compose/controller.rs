use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::categories::CategorySelection;
use super::error::ComposeError;
use super::images::{apply_inline, CoverBinding, CoverImage, ImageAttachmentFlow};
use super::keywords::{ChipKey, KeywordInput, KeywordList};
use super::subscriptions::SubscriptionSet;
use crate::api::routes;
use crate::api::ArticleService;
use crate::cache::{CacheError, ReferenceDataCache};
use crate::editor::{
    EditorError, EditorEvent, EditorHost, EditorOptions, RichTextEditor, ADD_IMAGE_ITEM,
};
use crate::model::{ArticleDraft, Category, DraftForm, Language};
use crate::navigation::{discussion_url, Destination, Navigator};
use crate::picker::ImagePicker;

/// Capacity of the controller's event channel.
const EVENT_CHANNEL_SIZE: usize = 32;

// ============================================================================
// State and Events
// ============================================================================

/// Lifecycle of one draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Waiting for languages and categories.
    Loading,
    /// Form interactive; submit allowed.
    Ready,
    /// Submit call in flight.
    Submitting,
    /// Stored and navigated away. Terminal.
    Submitted,
}

/// Completions and editor signals delivered to [`ArticleDraftController::handle_event`].
#[derive(Debug)]
pub enum ComposeEvent {
    LanguagesLoaded(Arc<Vec<Language>>),
    CategoriesLoaded(Arc<Vec<Category>>),
    ReferenceLoadFailed { key: &'static str, error: String },
    /// Editor content after a keyup.
    BodyChanged(String),
    /// The editor's "Add Image" menu item was activated.
    InlineImageRequested,
}

// ============================================================================
// Construction
// ============================================================================

/// External collaborators a composition screen works with.
#[derive(Clone)]
pub struct Collaborators {
    pub service: Arc<dyn ArticleService>,
    pub cache: ReferenceDataCache,
    pub picker: Arc<dyn ImagePicker>,
    pub navigator: Arc<dyn Navigator>,
    pub editor_host: Arc<dyn EditorHost>,
}

#[derive(Debug, Clone, Default)]
pub struct ComposerSettings {
    /// Discussion service base URL for the post-publish hand-off.
    pub discuss_url: Option<String>,
    pub editor: EditorOptions,
}

/// Drives one article draft from reference loading through submission.
///
/// All mutation goes through `&mut self`; background work (reference loads,
/// editor callbacks) reports back as [`ComposeEvent`]s on the channel
/// returned by [`new`](Self::new), which the owner feeds to
/// [`handle_event`](Self::handle_event).
pub struct ArticleDraftController {
    service: Arc<dyn ArticleService>,
    cache: ReferenceDataCache,
    images: ImageAttachmentFlow,
    navigator: Arc<dyn Navigator>,
    editor_host: Arc<dyn EditorHost>,
    settings: ComposerSettings,

    state: DraftState,
    languages: Option<Arc<Vec<Language>>>,
    categories: Option<CategorySelection>,
    keywords: KeywordList,
    keyword_input: KeywordInput,
    cover: CoverBinding,
    editor: Option<Box<dyn RichTextEditor>>,

    subscriptions: SubscriptionSet,
    event_tx: mpsc::Sender<ComposeEvent>,
    body_tx: watch::Sender<String>,
    last_error: Option<String>,
    /// Reference loads spawned and not yet failed.
    loads_pending: bool,
    torn_down: bool,
}

impl ArticleDraftController {
    pub fn new(
        collaborators: Collaborators,
        settings: ComposerSettings,
    ) -> Result<(Self, mpsc::Receiver<ComposeEvent>), ComposeError> {
        let Collaborators {
            service,
            cache,
            picker,
            navigator,
            editor_host,
        } = collaborators;

        let images = ImageAttachmentFlow::from_service(picker, service.as_ref())?;
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (body_tx, _) = watch::channel(String::new());

        let controller = Self {
            service,
            cache,
            images,
            navigator,
            editor_host,
            settings,
            state: DraftState::Loading,
            languages: None,
            categories: None,
            keywords: KeywordList::new(),
            keyword_input: KeywordInput::default(),
            cover: CoverBinding::default(),
            editor: None,
            subscriptions: SubscriptionSet::new(),
            event_tx,
            body_tx,
            last_error: None,
            loads_pending: false,
            torn_down: false,
        };
        Ok((controller, event_rx))
    }

    // ========================================================================
    // Reference Data
    // ========================================================================

    /// Start both reference loads in the background. Each reports back with
    /// a `*Loaded` or `ReferenceLoadFailed` event.
    pub fn load_reference_data(&mut self) {
        if self.torn_down {
            tracing::debug!("Reference load requested after teardown, ignoring");
            return;
        }
        self.loads_pending = true;

        let (service, cache, tx) = (
            Arc::clone(&self.service),
            self.cache.clone(),
            self.event_tx.clone(),
        );
        let languages = tokio::spawn(async move {
            let event = match cache.languages(service.as_ref()).await {
                Ok(list) => ComposeEvent::LanguagesLoaded(list),
                Err(e) => ComposeEvent::ReferenceLoadFailed {
                    key: routes::LANGUAGES,
                    error: load_failure(e),
                },
            };
            // Receiver gone means the screen was torn down
            let _ = tx.send(event).await;
        });
        self.subscriptions.track(&languages);

        let (service, cache, tx) = (
            Arc::clone(&self.service),
            self.cache.clone(),
            self.event_tx.clone(),
        );
        let categories = tokio::spawn(async move {
            let event = match cache.categories(service.as_ref()).await {
                Ok(list) => ComposeEvent::CategoriesLoaded(list),
                Err(e) => ComposeEvent::ReferenceLoadFailed {
                    key: routes::CATEGORIES,
                    error: load_failure(e),
                },
            };
            let _ = tx.send(event).await;
        });
        self.subscriptions.track(&categories);
    }

    /// True once both languages and categories are loaded.
    pub fn is_ready(&self) -> bool {
        self.languages.is_some() && self.categories.is_some()
    }

    fn check_ready(&mut self) -> Result<(), ComposeError> {
        if self.state != DraftState::Loading || !self.is_ready() {
            return Ok(());
        }
        self.state = DraftState::Ready;
        self.last_error = None;
        tracing::info!(
            languages = self.languages.as_ref().map_or(0, |l| l.len()),
            categories = self.categories.as_ref().map_or(0, |c| c.len()),
            "Draft ready"
        );
        self.try_initialize_editor()?;
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub async fn handle_event(&mut self, event: ComposeEvent) -> Result<(), ComposeError> {
        if self.torn_down {
            return Ok(());
        }
        match event {
            ComposeEvent::LanguagesLoaded(list) => {
                if self.languages.is_none() {
                    tracing::debug!(count = list.len(), "Languages loaded");
                    self.languages = Some(list);
                }
                self.check_ready()
            }
            ComposeEvent::CategoriesLoaded(list) => {
                // Selection state is built once, from the first list seen
                if self.categories.is_none() {
                    tracing::debug!(count = list.len(), "Categories loaded");
                    self.categories = Some(CategorySelection::from_canonical(&list));
                }
                self.check_ready()
            }
            ComposeEvent::ReferenceLoadFailed { key, error } => {
                self.loads_pending = false;
                tracing::warn!(key, error = %error, "Reference data unavailable");
                Err(self.surface(ComposeError::ReferenceLoad {
                    key,
                    message: error,
                }))
            }
            ComposeEvent::BodyChanged(content) => {
                self.body_tx.send_replace(content);
                Ok(())
            }
            ComposeEvent::InlineImageRequested => self.insert_inline_image().await.map(|_| ()),
        }
    }

    /// Apply every event already queued, without waiting for more.
    pub async fn drain_events(
        &mut self,
        events: &mut mpsc::Receiver<ComposeEvent>,
    ) -> Result<(), ComposeError> {
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    /// Apply events until both reference lists are loaded.
    ///
    /// Starts the reference loads if none are pending, so calling this again
    /// after a load failure retries. Fails on the first load failure, after
    /// teardown, or once the caller has closed `events`.
    pub async fn wait_until_ready(
        &mut self,
        events: &mut mpsc::Receiver<ComposeEvent>,
    ) -> Result<(), ComposeError> {
        if self.torn_down {
            return Err(ComposeError::NotReady(self.state));
        }
        if !self.is_ready() && !self.loads_pending {
            self.load_reference_data();
        }
        while !self.is_ready() {
            // None only after `events.close()`; the controller holds a sender
            let Some(event) = events.recv().await else {
                return Err(ComposeError::NotReady(self.state));
            };
            self.handle_event(event).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Editor
    // ========================================================================

    /// Initialize the editor if the draft is ready and the host has the
    /// binding target. Returns true once an editor exists.
    pub fn try_initialize_editor(&mut self) -> Result<bool, ComposeError> {
        if self.editor.is_some() {
            return Ok(true);
        }
        if self.torn_down || !self.is_ready() {
            return Ok(false);
        }

        let selector = self.settings.editor.selector();
        if !self.editor_host.has_target(&selector) {
            tracing::debug!(selector = %selector, "Editor target not present yet, deferring");
            return Ok(false);
        }

        let mut editor = self.editor_host.initialize(&self.settings.editor)?;

        let tx = self.event_tx.clone();
        editor.on(
            EditorEvent::KeyUp,
            Box::new(move |content| {
                if let Err(e) = tx.try_send(ComposeEvent::BodyChanged(content.to_owned())) {
                    tracing::warn!(error = %e, "Dropped editor keyup event");
                }
            }),
        );

        let tx = self.event_tx.clone();
        editor.add_menu_item(
            ADD_IMAGE_ITEM,
            Box::new(move || {
                if let Err(e) = tx.try_send(ComposeEvent::InlineImageRequested) {
                    tracing::warn!(error = %e, "Dropped image menu action");
                }
            }),
        );

        tracing::info!(selector = %selector, "Editor initialized");
        self.editor = Some(editor);
        Ok(true)
    }

    /// The host reports the binding target now exists. Fails with
    /// `TargetMissing` if the host still cannot find it once the draft is
    /// ready.
    pub fn binding_target_attached(&mut self) -> Result<bool, ComposeError> {
        if self.editor.is_none() && !self.torn_down && self.is_ready() {
            let selector = self.settings.editor.selector();
            if !self.editor_host.has_target(&selector) {
                return Err(self.surface(EditorError::TargetMissing(selector).into()));
            }
        }
        self.try_initialize_editor()
    }

    pub fn editor(&self) -> Option<&dyn RichTextEditor> {
        self.editor.as_deref()
    }

    /// Latest editor content seen on keyup.
    pub fn body_updates(&self) -> watch::Receiver<String> {
        self.body_tx.subscribe()
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Open a picker and insert the chosen image into the body. Returns
    /// false if the picker was cancelled.
    pub async fn insert_inline_image(&mut self) -> Result<bool, ComposeError> {
        if self.editor.is_none() {
            return Err(ComposeError::EditorNotInitialized);
        }
        let outcome = self.images.open_inline().outcome().await;
        match self.editor.as_deref_mut() {
            Some(editor) => Ok(apply_inline(editor, outcome)),
            None => Ok(false),
        }
    }

    /// Open a picker for the cover image. Cancelling keeps the previous
    /// cover. Returns true if the cover changed.
    pub async fn choose_cover_image(&mut self) -> bool {
        let outcome = self.images.open_cover().outcome().await;
        self.cover.apply(outcome)
    }

    pub fn cover_image(&self) -> Option<&CoverImage> {
        self.cover.current()
    }

    // ========================================================================
    // Keywords and Categories
    // ========================================================================

    pub fn keyword_input_mut(&mut self) -> &mut KeywordInput {
        &mut self.keyword_input
    }

    /// Commit the keyword input. See [`KeywordList::add`].
    pub fn add_keyword(&mut self) -> bool {
        self.keywords.add(&mut self.keyword_input)
    }

    /// Feed a key press to the chip input. Separator keys commit it.
    pub fn keyword_key(&mut self, key: ChipKey) -> bool {
        self.keywords.key(&mut self.keyword_input, key)
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        self.keywords.remove(keyword)
    }

    pub fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    pub fn keywords_mut(&mut self) -> &mut KeywordList {
        &mut self.keywords
    }

    pub fn categories(&self) -> Option<&CategorySelection> {
        self.categories.as_ref()
    }

    /// Flip selection of category `id`. `None` if categories are not loaded
    /// or the id is unknown.
    pub fn toggle_category(&mut self, id: i64) -> Option<bool> {
        self.categories.as_mut()?.toggle(id)
    }

    pub fn languages(&self) -> Option<&[Language]> {
        self.languages.as_deref().map(Vec::as_slice)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    pub fn state(&self) -> DraftState {
        self.state
    }

    /// Message of the most recent surfaced error, for inline display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Store the draft and navigate.
    ///
    /// The body is read from the editor at call time. The destination is
    /// resolved before anything is sent, so a discussion hand-off with an
    /// unknown language fails with `InvalidSelection` and stores nothing.
    /// On a failed store the draft returns to `Ready` with all state intact.
    pub async fn submit(&mut self, form: &DraftForm) -> Result<Destination, ComposeError> {
        if self.state != DraftState::Ready {
            return Err(ComposeError::NotReady(self.state));
        }
        let body = match self.editor.as_deref() {
            Some(editor) => editor.content(),
            None => return Err(self.surface(ComposeError::EditorNotInitialized)),
        };

        let destination = match self.plan_destination(form) {
            Ok(destination) => destination,
            Err(e) => return Err(self.surface(e)),
        };
        let draft = self.assemble(form, body);

        self.state = DraftState::Submitting;
        tracing::info!(slug = %draft.slug, published = draft.published, "Submitting article");

        if let Err(e) = self.service.put_article(&draft).await {
            self.state = DraftState::Ready;
            tracing::warn!(error = %e, slug = %draft.slug, "Article submission failed");
            return Err(self.surface(ComposeError::Submission(e)));
        }

        self.state = DraftState::Submitted;
        self.last_error = None;
        if let Err(e) = self.navigator.navigate(&destination) {
            return Err(self.surface(ComposeError::Navigation(e)));
        }
        tracing::info!(destination = %destination, "Article submitted");
        Ok(destination)
    }

    fn plan_destination(&self, form: &DraftForm) -> Result<Destination, ComposeError> {
        if !(form.forum_published && form.published) {
            return Ok(Destination::ArticleList);
        }

        let language = self
            .languages
            .as_deref()
            .and_then(|list| list.iter().find(|l| l.id == form.language_id))
            .ok_or(ComposeError::InvalidSelection {
                language_id: form.language_id,
            })?;
        let base = self
            .settings
            .discuss_url
            .as_deref()
            .ok_or(ComposeError::DiscussUrlMissing)?;

        Ok(Destination::Discussion(discussion_url(
            base,
            &form.slug,
            &language.slug,
        )?))
    }

    fn assemble(&self, form: &DraftForm, body: String) -> ArticleDraft {
        ArticleDraft {
            title: form.title.clone(),
            sub_title: form.sub_title.clone(),
            body,
            keywords: self.keywords.as_slice().to_vec(),
            published: form.published,
            language_id: form.language_id,
            slug: form.slug.clone(),
            category_ids: self
                .categories
                .as_ref()
                .map(CategorySelection::selected_ids)
                .unwrap_or_default(),
            cover_image_id: self.cover.id().map(str::to_owned),
        }
    }

    fn surface(&mut self, error: ComposeError) -> ComposeError {
        self.last_error = Some(error.to_string());
        error
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Destroy the editor and release all background work. Safe to call
    /// more than once; also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(mut editor) = self.editor.take() {
            editor.destroy();
        }
        self.images.close();
        let aborted = self.subscriptions.release();
        tracing::debug!(aborted, state = ?self.state, "Composition screen torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

fn load_failure(error: CacheError) -> String {
    match error {
        CacheError::Producer { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

impl Drop for ArticleDraftController {
    fn drop(&mut self) {
        self.teardown();
    }
}
