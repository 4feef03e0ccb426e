use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

use super::types::ProcessedPreview;

type Slot = Arc<OnceCell<ProcessedPreview>>;

/// Process-lifetime cache of uploaded previews keyed by the remote media URL.
///
/// Concurrent requests for the same key share one in-flight fetch: the first
/// caller runs the initializer, later callers await its result. A failed
/// initializer leaves the key empty so the next caller retries.
#[derive(Clone, Default)]
pub struct PreviewCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl PreviewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, media_url: &str) -> Option<ProcessedPreview> {
        self.lock().get(media_url).and_then(|slot| slot.get().cloned())
    }

    pub fn store(&self, media_url: &str, preview: ProcessedPreview) {
        self.lock().insert(
            media_url.to_string(),
            Arc::new(OnceCell::new_with(Some(preview))),
        );
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached preview for `media_url`, running `init` at most once
    /// across concurrent callers when it is absent.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        media_url: &str,
        init: F,
    ) -> Result<ProcessedPreview, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ProcessedPreview, E>>,
    {
        let slot = Arc::clone(self.lock().entry(media_url.to_string()).or_default());

        if let Some(hit) = slot.get() {
            tracing::info!(media_url, "preview cache hit");
            return Ok(hit.clone());
        }

        let mut ran_init = false;
        let result = slot
            .get_or_try_init(|| {
                ran_init = true;
                tracing::info!(media_url, "preview cache miss");
                init()
            })
            .await
            .cloned();

        match result {
            Ok(preview) => {
                if !ran_init {
                    tracing::debug!(media_url, "joined in-flight preview fetch");
                }
                Ok(preview)
            }
            Err(e) => {
                let mut slots = self.lock();
                if slots
                    .get(media_url)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized())
                {
                    slots.remove(media_url);
                }
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
