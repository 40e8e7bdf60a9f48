//! Update processing and the long-polling loop.
//!
//! Every incoming message is recorded in the history store synchronously,
//! before anything else happens, and only then is a task spawned for a
//! command it may carry. A command therefore always sees the messages that
//! arrived before it in its fallback search.

pub mod capabilities;
pub mod handlers;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::command::parse_command;
use crate::model::{AppError, Message, Update};
use crate::render::Rasterizer;
use crate::store::{LastStickerCache, RecentMessageStore};
use capabilities::{AvatarSource, Replier, StickerPackApi, StickerSender, UpdateSource};
use handlers::CommandContext;

/// Pause after a failed `getUpdates` before polling again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// How long in-flight commands may run after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/start`
    Start,
    /// `/help`
    Help,
    /// `/sticker [n]`
    Sticker,
    /// `/preview`
    Preview,
    /// `/pack`
    Pack,
}

impl CommandKind {
    /// Parse a command name without the slash or bot suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "sticker" => Some(Self::Sticker),
            "preview" => Some(Self::Preview),
            "pack" => Some(Self::Pack),
            _ => None,
        }
    }

    /// Command name as used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Sticker => "sticker",
            Self::Preview => "preview",
            Self::Pack => "pack",
        }
    }
}

/// Shared state of a running bot.
pub struct BotState {
    /// Recent messages per conversation, for fallback.
    pub history: Mutex<RecentMessageStore>,
    /// Last sticker rendered per user, for `/pack`.
    pub stickers: Mutex<LastStickerCache>,
    /// Renderer shared by every command task.
    pub rasterizer: Arc<dyn Rasterizer>,
}

impl BotState {
    /// Empty stores with the given capacities.
    pub fn new(history_capacity: usize, sticker_capacity: usize, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            history: Mutex::new(RecentMessageStore::new(history_capacity)),
            stickers: Mutex::new(LastStickerCache::new(sticker_capacity)),
            rasterizer,
        }
    }
}

/// A polling bot over some Bot API implementation.
pub struct Bot<A> {
    api: Arc<A>,
    state: Arc<BotState>,
    bot_username: Option<String>,
}

impl<A> Bot<A>
where
    A: UpdateSource + Replier + StickerSender + AvatarSource + StickerPackApi + Send + Sync + 'static,
{
    /// Wrap an API implementation and shared state.
    pub fn new(api: A, state: BotState, bot_username: Option<String>) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(state),
            bot_username,
        }
    }

    /// Shared state, exposed for tests.
    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Record the update's message and spawn a task for its command, if any.
    pub fn handle_update(&self, update: Update, tasks: &mut JoinSet<()>) {
        let Some(message) = update.message else {
            return;
        };

        self.state
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(&message);

        let Some(kind) = self.command_kind(&message) else {
            return;
        };

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        tasks.spawn(async move {
            dispatch(api.as_ref(), &state, kind, &message).await;
        });
    }

    fn command_kind(&self, message: &Message) -> Option<CommandKind> {
        let command = parse_command(message.raw_text()?)?;
        let addressed = self
            .bot_username
            .as_deref()
            .is_none_or(|name| command.is_addressed_to(name));
        if !addressed {
            debug!(command = %command.name, mention = ?command.mention, "Ignoring command for another bot");
            return None;
        }
        CommandKind::from_name(&command.name)
    }

    /// Poll for updates until `shutdown` resolves.
    ///
    /// Transport failures are logged and retried; they never end the loop.
    pub async fn run_polling(&self, poll_timeout_secs: u64, shutdown: impl Future<Output = ()>) {
        let mut offset: Option<i64> = None;
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        info!("Reply sticker bot started");
        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => break,
                polled = self.api.get_updates(offset, poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(update, &mut tasks);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Polling failed, retrying");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!(error = %e, "Update task panicked");
                }
            }
        }

        info!(in_flight = tasks.len(), "Shutting down");
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("In-flight commands did not finish in time, aborting them");
        }
    }
}

/// Run one command, answering with an apology if it failed unanswered.
async fn dispatch<A>(api: &A, state: &BotState, kind: CommandKind, message: &Message)
where
    A: Replier + StickerSender + AvatarSource + StickerPackApi,
{
    let Some(ctx) = CommandContext::new(message) else {
        warn!(command = kind.as_str(), "Command without a chat, ignoring");
        return;
    };
    debug!(command = kind.as_str(), chat = %ctx.chat_id, "Handling command");

    let result: Result<(), AppError> = match kind {
        CommandKind::Start | CommandKind::Help => handlers::handle_help(api, ctx).await,
        CommandKind::Sticker => handlers::handle_sticker(api, state, ctx).await,
        CommandKind::Preview => handlers::handle_preview(api, state, ctx).await,
        CommandKind::Pack => handlers::handle_pack(api, state, ctx).await,
    };

    if let Err(e) = result {
        error!(command = kind.as_str(), error = %e, "Unhandled bot error");
        if let Err(e) = api.reply(ctx.chat_id, handlers::APOLOGY, None).await {
            debug!(error = %e, "Apology could not be sent");
        }
    }
}

#[cfg(test)]
mod tests;
