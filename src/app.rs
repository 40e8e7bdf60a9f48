//! Startup wiring: resolve the bot identity, build state, poll until stopped.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bot::capabilities::TelegramApi;
use crate::bot::{Bot, BotState};
use crate::config::ResolvedConfig;
use crate::model::AppError;
use crate::render::CanvasRasterizer;
use crate::transport::TelegramClient;

/// Run the bot until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Fails on a missing token, or when the Bot API is unreachable at startup.
pub async fn run(config: ResolvedConfig) -> Result<(), AppError> {
    let token = config.require_token()?;
    let client = TelegramClient::new(&config.api_url, token.expose())?;

    client.delete_webhook(config.drop_pending_updates).await?;
    let me = client.get_me().await?;
    let bot_username = me.username.filter(|name| !name.is_empty());
    if bot_username.is_none() {
        warn!("Bot has no username; /pack will be unavailable");
    }
    info!(
        username = bot_username.as_deref().unwrap_or("<none>"),
        drop_pending_updates = config.drop_pending_updates,
        "Connected to Bot API"
    );

    let state = BotState::new(
        config.history_capacity,
        config.sticker_cache_capacity,
        Arc::new(CanvasRasterizer::default()),
    );
    let api = TelegramApi::new(client, bot_username.clone());
    let bot = Bot::new(api, state, bot_username);

    bot.run_polling(config.poll_timeout_secs, shutdown_signal()).await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
