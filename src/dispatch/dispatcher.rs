use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::settings::{DispatchSettings, PLACEHOLDER_REDACT_REASON, TRIGGER_REDACT_REASON};
use crate::links::LinkMessage;
use crate::matrix::{MatrixApi, MessageContent};
use crate::processors::ProcessorChain;

/// What happened to one incoming message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Preview payloads delivered, excluding the loading notice and prefix
    pub sent: usize,
    pub redacted_trigger: bool,
}

/// Turns link messages into posted previews.
///
/// Messages go out through `api`; typing notifications and redactions go
/// through `control`, which may point at a different endpoint when the
/// primary connection sits behind an encryption proxy.
pub struct Dispatcher {
    api: Arc<dyn MatrixApi>,
    control: Arc<dyn MatrixApi>,
    chain: ProcessorChain,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn MatrixApi>,
        control: Arc<dyn MatrixApi>,
        chain: ProcessorChain,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            api,
            control,
            chain,
            settings,
        }
    }

    /// Receive link messages until the channel closes or `cancel` fires,
    /// handling each on its own task. In-flight messages are finished
    /// before returning.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<LinkMessage>, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
                received = rx.recv() => {
                    let Some(message) = received else { break };
                    let this = Arc::clone(&self);
                    tasks.spawn(async move { this.dispatch(&message).await });
                }
            }
        }

        rx.close();
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!("dispatcher stopped");
    }

    /// Resolve every link of `message` concurrently, then post the results
    /// in link order and optionally redact the trigger.
    pub async fn dispatch(&self, message: &LinkMessage) -> DispatchOutcome {
        tracing::info!(
            room_id = %message.room_id,
            event_id = %message.event_id,
            links = message.links.urls.len(),
            "dispatching link message"
        );

        let room_id = message.room_id.as_str();
        let stop_typing = CancellationToken::new();
        let work = async {
            let per_link = join_all(
                message
                    .links
                    .urls
                    .iter()
                    .map(|url| self.process_link(room_id, url)),
            )
            .await;
            stop_typing.cancel();
            per_link
        };
        let (per_link, ()) = tokio::join!(work, self.keep_typing(room_id, &stop_typing));

        // Cleared once, after the slowest link of the message.
        if let Err(e) = self
            .control
            .set_typing(room_id, false, self.settings.typing_timeout)
            .await
        {
            tracing::debug!(room_id, error = %e, "failed to clear typing indicator");
        }
        let groups: Vec<Vec<MessageContent>> = per_link.into_iter().flatten().collect();

        let sent = self.emit(message, &groups).await;

        let redacted_trigger = self.should_redact_trigger(message, sent)
            && match self
                .control
                .redact(&message.room_id, &message.event_id, TRIGGER_REDACT_REASON)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        room_id = %message.room_id,
                        event_id = %message.event_id,
                        error = %e,
                        "failed to redact trigger message"
                    );
                    false
                }
            };

        DispatchOutcome {
            sent,
            redacted_trigger,
        }
    }

    fn should_redact_trigger(&self, message: &LinkMessage, sent: usize) -> bool {
        self.settings.delete_original_if_empty && !message.links.contains_other_text() && sent > 0
    }

    /// Loading notice around the processor chain for one link. The notice
    /// is redacted whether or not anything was produced.
    async fn process_link(&self, room_id: &str, url: &Url) -> Vec<Vec<MessageContent>> {
        let notice = MessageContent::notice(self.settings.loading_message.as_str());
        let placeholder = match self.api.send_message(room_id, &notice).await {
            Ok(event_id) => Some(event_id),
            Err(e) => {
                tracing::warn!(room_id, url = %url, error = %e, "failed to send loading notice");
                None
            }
        };
        let groups = self.chain.run(room_id, url).await;

        if let Some(event_id) = placeholder
            && let Err(e) = self
                .control
                .redact(room_id, &event_id, PLACEHOLDER_REDACT_REASON)
                .await
        {
            tracing::warn!(room_id, event_id = %event_id, error = %e, "failed to redact loading notice");
        }

        groups
    }

    async fn keep_typing(&self, room_id: &str, stop: &CancellationToken) {
        loop {
            if let Err(e) = self
                .control
                .set_typing(room_id, true, self.settings.typing_timeout)
                .await
            {
                tracing::debug!(room_id, error = %e, "failed to set typing indicator");
            }
            tokio::select! {
                biased;
                () = stop.cancelled() => break,
                () = tokio::time::sleep(self.settings.typing_refresh) => {}
            }
        }
    }

    /// Send payloads in order. The sender prefix, if configured, precedes
    /// the first payload. Failed sends are logged and skipped.
    async fn emit(&self, message: &LinkMessage, groups: &[Vec<MessageContent>]) -> usize {
        let room_id = message.room_id.as_str();
        let mut prefix = self.settings.render_sender_prefix(&message.sender);
        let mut sent = 0;

        for payload in groups.iter().flatten() {
            if let Some(line) = prefix.take()
                && let Err(e) = self.api.send_message(room_id, &MessageContent::notice(line)).await
            {
                tracing::warn!(room_id, error = %e, "failed to send sender prefix");
            }

            match self.api.send_message(room_id, payload).await {
                Ok(event_id) => {
                    sent += 1;
                    tracing::debug!(room_id, event_id = %event_id, "preview sent");
                }
                Err(e) => tracing::warn!(room_id, error = %e, "failed to send preview"),
            }
        }
        sent
    }
}

fn log_join(joined: Result<DispatchOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => tracing::debug!(
            sent = outcome.sent,
            redacted_trigger = outcome.redacted_trigger,
            "link message done"
        ),
        Err(e) => tracing::error!(error = %e, "link message task failed"),
    }
}
