//! Image picker dialog seam.
//!
//! Opening a picker returns a [`PickerHandle`]: a single-shot receiver that
//! resolves to exactly one [`PickerOutcome`]. Awaiting consumes the handle,
//! so a result can never be applied twice and no listener outlives the
//! dialog. A picker that goes away without answering counts as cancelled.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use url::Url;

use crate::api::HttpArticleService;
use crate::model::ImageSelection;

/// Data the dialog opens with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRequest {
    /// Where the dialog fetches its image listing from.
    pub image_request: Url,
    /// Base URL thumbnails are served under.
    pub thumb_image_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    Selected(ImageSelection),
    Cancelled,
}

/// Receiving half of one picker invocation.
#[must_use = "a picker handle does nothing unless awaited"]
pub struct PickerHandle {
    rx: oneshot::Receiver<PickerOutcome>,
}

/// Answering half of one picker invocation, held by the dialog.
pub struct PickerResponder {
    tx: oneshot::Sender<PickerOutcome>,
}

impl PickerHandle {
    pub fn channel() -> (PickerResponder, PickerHandle) {
        let (tx, rx) = oneshot::channel();
        (PickerResponder { tx }, PickerHandle { rx })
    }

    /// Wait for the dialog to close.
    pub async fn outcome(self) -> PickerOutcome {
        self.rx.await.unwrap_or(PickerOutcome::Cancelled)
    }
}

impl PickerResponder {
    pub fn select(self, image: ImageSelection) {
        self.respond(PickerOutcome::Selected(image));
    }

    pub fn cancel(self) {
        self.respond(PickerOutcome::Cancelled);
    }

    fn respond(self, outcome: PickerOutcome) {
        // The opener may have stopped waiting (screen torn down)
        if self.tx.send(outcome).is_err() {
            tracing::debug!("Picker closed after its opener went away");
        }
    }
}

/// Opens image-selection dialogs.
pub trait ImagePicker: Send + Sync {
    fn open(&self, request: PickerRequest) -> PickerHandle;

    /// Abandon every dialog still open. Their handles resolve as cancelled.
    fn close(&self) {}
}

/// Non-interactive picker: answers each `open` with the next queued image id,
/// resolved against the server's image listing. `None` in the queue (or an
/// empty queue) cancels.
///
/// Each lookup runs as a background task owned by the picker until it
/// answers; [`close`](ImagePicker::close) aborts the ones still running.
#[derive(Clone)]
pub struct ListingPicker {
    service: HttpArticleService,
    choices: Arc<Mutex<VecDeque<Option<String>>>>,
    lookups: Arc<Mutex<Vec<AbortHandle>>>,
}

impl ListingPicker {
    pub fn new(service: HttpArticleService) -> Self {
        Self {
            service,
            choices: Arc::new(Mutex::new(VecDeque::new())),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue the answer for the next `open`.
    pub fn enqueue(&self, image_id: Option<String>) {
        self.choices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(image_id);
    }

    fn next_choice(&self) -> Option<String> {
        self.choices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten()
    }

    fn track(&self, lookup: AbortHandle) {
        let mut lookups = self.lookups.lock().unwrap_or_else(PoisonError::into_inner);
        lookups.retain(|h| !h.is_finished());
        lookups.push(lookup);
    }
}

impl ImagePicker for ListingPicker {
    fn open(&self, request: PickerRequest) -> PickerHandle {
        let (responder, handle) = PickerHandle::channel();
        let Some(wanted) = self.next_choice() else {
            responder.cancel();
            return handle;
        };

        let service = self.service.clone();
        let lookup = tokio::spawn(async move {
            match service.list_images(&request.image_request).await {
                Ok(images) => match images.into_iter().find(|image| image.id == wanted) {
                    Some(mut image) => {
                        image.url = resolve_thumb(&request.thumb_image_url, &image.url);
                        responder.select(image);
                    }
                    None => {
                        tracing::warn!(image_id = %wanted, "Image not found in listing");
                        responder.cancel();
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to list images");
                    responder.cancel();
                }
            }
        });
        self.track(lookup.abort_handle());

        handle
    }

    fn close(&self) {
        let lookups: Vec<AbortHandle> = self
            .lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let mut aborted = 0;
        for lookup in lookups {
            if !lookup.is_finished() {
                lookup.abort();
                aborted += 1;
            }
        }
        tracing::debug!(aborted, "Image picker closed");
    }
}

/// Relative thumbnail paths are served under the thumbnail base.
fn resolve_thumb(base: &Url, thumb: &str) -> String {
    if Url::parse(thumb).is_ok() {
        return thumb.to_owned();
    }
    base.join(thumb)
        .map(String::from)
        .unwrap_or_else(|_| thumb.to_owned())
}
