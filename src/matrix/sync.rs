use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::api::{MatrixApi, SyncRequest};
use super::models::SyncResponse;
use crate::config::LinkListenerConfig;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Consumer of sync batches. Handlers run in registration order for each
/// batch; an error is logged and does not stop the loop.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, batch: &SyncResponse) -> anyhow::Result<()>;
}

/// Long-poll `/sync` until cancelled, fanning each batch out to handlers.
pub struct SyncLoop {
    api: Arc<dyn MatrixApi>,
    handlers: Vec<Arc<dyn SyncHandler>>,
    settings: LinkListenerConfig,
}

impl SyncLoop {
    pub fn new(api: Arc<dyn MatrixApi>, settings: LinkListenerConfig) -> Self {
        Self {
            api,
            handlers: Vec::new(),
            settings,
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut since: Option<String> = None;
        let mut backoff = INITIAL_BACKOFF;

        tracing::info!(
            timeout_ms = self.settings.timeout_ms,
            presence = ?self.settings.presence,
            "sync loop started"
        );

        loop {
            let started = Instant::now();
            let request = SyncRequest {
                since: since.clone(),
                timeout: self.settings.sync_timeout(),
                set_presence: self.settings.presence,
                filter: None,
            };

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.api.sync(&request) => result,
            };

            match result {
                Ok(batch) => {
                    backoff = INITIAL_BACKOFF;
                    self.dispatch(&batch).await;
                    since = Some(batch.next_batch);
                }
                Err(e) => {
                    tracing::warn!(error = %e, retry_in = ?backoff, "sync failed");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
                    continue;
                }
            }

            let remaining = self
                .settings
                .minimum_sync_time()
                .saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(remaining) => {}
                }
            }
        }

        tracing::info!("sync loop stopped");
    }

    async fn dispatch(&self, batch: &SyncResponse) {
        for handler in &self.handlers {
            if let Err(e) = handler.handle(batch).await {
                tracing::warn!(handler = handler.name(), error = %e, "sync handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::content::MessageContent;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves numbered batches, failing the first `failures` calls.
    struct ScriptedSync {
        calls: AtomicUsize,
        failures: usize,
        seen_since: Mutex<Vec<Option<String>>>,
        stop_after: usize,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl MatrixApi for ScriptedSync {
        async fn whoami(&self) -> anyhow::Result<String> {
            Ok("@bot:x".into())
        }
        async fn joined_rooms(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn join_room(&self, _room_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn sync(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_since.lock().unwrap().push(request.since.clone());
            if n + 1 >= self.stop_after {
                self.cancel.cancel();
            }
            if n < self.failures {
                anyhow::bail!("homeserver unavailable");
            }
            Ok(serde_json::from_value(serde_json::json!({ "next_batch": format!("s{n}") }))?)
        }
        async fn upload(&self, _: &str, _: &str, _: Bytes) -> anyhow::Result<String> {
            unreachable!()
        }
        async fn send_message(&self, _: &str, _: &MessageContent) -> anyhow::Result<String> {
            unreachable!()
        }
        async fn redact(&self, _: &str, _: &str, _: &str) -> anyhow::Result<()> {
            unreachable!()
        }
        async fn set_typing(&self, _: &str, _: bool, _: Duration) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        batches: AtomicUsize,
    }

    #[async_trait]
    impl SyncHandler for CountingHandler {
        fn name(&self) -> &str {
            "counting"
        }
        async fn handle(&self, _batch: &SyncResponse) -> anyhow::Result<()> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("handler errors are not fatal")
        }
    }

    fn scripted(failures: usize, stop_after: usize, cancel: &CancellationToken) -> Arc<ScriptedSync> {
        Arc::new(ScriptedSync {
            calls: AtomicUsize::new(0),
            failures,
            seen_since: Mutex::new(Vec::new()),
            stop_after,
            cancel: cancel.clone(),
        })
    }

    fn settings() -> LinkListenerConfig {
        LinkListenerConfig {
            timeout_ms: 0,
            ..LinkListenerConfig::default()
        }
    }

    #[tokio::test]
    async fn threads_next_batch_into_since() {
        let cancel = CancellationToken::new();
        let api = scripted(0, 3, &cancel);
        let handler = Arc::new(CountingHandler::default());
        let sync_loop = SyncLoop::new(api.clone(), settings()).with_handler(handler.clone());

        sync_loop.run(cancel).await;

        let seen = api.seen_since.lock().unwrap().clone();
        assert_eq!(seen[0], None);
        assert_eq!(seen[1].as_deref(), Some("s0"));
        assert_eq!(seen[2].as_deref(), Some("s1"));
        assert!(handler.batches.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_sync_backs_off_and_retries() {
        let cancel = CancellationToken::new();
        let api = scripted(2, 4, &cancel);
        let sync_loop = SyncLoop::new(api.clone(), settings());

        sync_loop.run(cancel).await;

        assert!(api.calls.load(Ordering::SeqCst) >= 3);
        let seen = api.seen_since.lock().unwrap().clone();
        assert_eq!(seen[0], None);
        assert_eq!(seen[1], None);
        assert_eq!(seen[2], None);
    }

    #[tokio::test]
    async fn cancelled_before_start_returns() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let api = scripted(0, usize::MAX, &cancel);
        SyncLoop::new(api, settings()).run(cancel.clone()).await;
    }
}
