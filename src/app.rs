//! Service lifecycle: wire the Matrix connection, the sync listener and the
//! dispatcher together and run them until ctrl-c.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatch::{DispatchSettings, Dispatcher};
use crate::links::{LinkListener, LinkMessage};
use crate::matrix::{InviteHandler, MatrixApi, MatrixClient, MessageContent, SyncLoop};
use crate::media::{HttpFetcher, PreviewCache};
use crate::processors::{MediaUploader, ProcessorChain};

pub const READY_MESSAGE: &str = "Ready!";

/// Capacity of the listener -> dispatcher queue.
const LINK_QUEUE_CAPACITY: usize = 64;

/// Everything a running bot needs, built from one config.
pub struct Service {
    api: Arc<dyn MatrixApi>,
    sync: SyncLoop,
    dispatcher: Arc<Dispatcher>,
    links: mpsc::Receiver<LinkMessage>,
    announce_ready: bool,
}

impl Service {
    /// Build the service on top of `api` (messages, uploads, sync) and
    /// `control` (typing, redactions).
    pub async fn build(
        config: &Config,
        api: Arc<dyn MatrixApi>,
        control: Arc<dyn MatrixApi>,
    ) -> Result<Self> {
        let own_user_id = api.whoami().await.context("whoami failed")?;
        let startup_ms = chrono::Utc::now().timestamp_millis();
        tracing::info!(user_id = %own_user_id, startup_ms, "connected to homeserver");

        let bot = &config.url_preview_bot;
        let fetcher = HttpFetcher::new(&bot.user_agent, bot.request_timeout());
        let uploader = MediaUploader::new(fetcher, Arc::clone(&api));
        let chain = ProcessorChain::standard(
            &uploader,
            &PreviewCache::new(),
            config.compiled_site_replacements()?,
        );
        tracing::debug!(processors = ?chain.names(), "processor chain ready");

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&api),
            control,
            chain,
            DispatchSettings::from(bot),
        ));

        let (tx, rx) = mpsc::channel(LINK_QUEUE_CAPACITY);
        let sync = SyncLoop::new(Arc::clone(&api), config.link_listener.clone())
            .with_handler(Arc::new(InviteHandler::new(Arc::clone(&api))))
            .with_handler(Arc::new(LinkListener::new(own_user_id, startup_ms, tx)));

        Ok(Self {
            api,
            sync,
            dispatcher,
            links: rx,
            announce_ready: bot.announce_ready,
        })
    }

    /// Run until `cancel` fires. The sync loop stops first; the dispatcher
    /// then finishes the messages it already accepted.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if self.announce_ready {
            announce_ready(self.api.as_ref()).await;
        }

        let Self {
            sync,
            dispatcher,
            links,
            ..
        } = self;

        let dispatch_task = tokio::spawn(dispatcher.run(links, cancel.child_token()));
        sync.run(cancel.clone()).await;
        // Dropping the loop closes the queue so the dispatcher can finish.
        drop(sync);

        dispatch_task.await.context("dispatcher task panicked")?;
        Ok(())
    }
}

/// Post the ready notice into every joined room. Failures are logged.
pub async fn announce_ready(api: &dyn MatrixApi) -> usize {
    let rooms = match api.joined_rooms().await {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::warn!(error = %e, "could not list joined rooms for ready notice");
            return 0;
        }
    };

    let notice = MessageContent::notice(READY_MESSAGE);
    let mut announced = 0;
    for room_id in rooms {
        match api.send_message(&room_id, &notice).await {
            Ok(_) => announced += 1,
            Err(e) => tracing::warn!(room_id = %room_id, error = %e, "ready notice failed"),
        }
    }
    announced
}

/// Connect to the configured homeserver(s) and run until ctrl-c.
///
/// An invalid config is rejected before any connection is made.
pub async fn run(config: Config) -> crate::error::Result<()> {
    config.validate()?;

    let primary = MatrixClient::new(&config.matrix.homeserver, &config.matrix.access_token);
    let api: Arc<dyn MatrixApi> = Arc::new(primary.clone());
    let control: Arc<dyn MatrixApi> =
        if config.matrix.control_homeserver() == config.matrix.homeserver {
            Arc::new(primary)
        } else {
            tracing::info!(
                endpoint = config.matrix.control_homeserver(),
                "typing and redactions use the decrypted endpoint"
            );
            Arc::new(MatrixClient::new(
                config.matrix.control_homeserver(),
                &config.matrix.access_token,
            ))
        };

    let service = Service::build(&config, api, control).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        tracing::info!("shutdown requested");
        on_signal.cancel();
    });

    service.run(cancel).await?;
    tracing::info!("preview bot stopped");
    Ok(())
}

/// Human-readable description of a loaded config for `check-config`.
pub fn describe(config: &Config) -> String {
    let bot = &config.url_preview_bot;
    let mut out = String::new();
    let _ = writeln!(out, "config:        {}", config.config_path.display());
    let _ = writeln!(out, "homeserver:    {}", config.matrix.homeserver);
    let _ = writeln!(out, "control:       {}", config.matrix.control_homeserver());
    let _ = writeln!(out, "user agent:    {}", bot.user_agent);
    let _ = writeln!(out, "delete empty:  {}", bot.delete_original_if_empty);
    let _ = writeln!(
        out,
        "sender prefix: {}",
        bot.sender_prefix.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "site rules:    {}", bot.site_replacements.len());
    let _ = writeln!(out, "sync timeout:  {}ms", config.link_listener.timeout_ms);
    let _ = writeln!(out, "log level:     {}", config.log_level);
    out
}
