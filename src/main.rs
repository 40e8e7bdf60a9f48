//! Reply Sticker Bot - Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// Telegram bot that turns replied-to messages into chat-bubble stickers
#[derive(Parser, Debug)]
#[command(name = "replysticker")]
#[command(version)]
#[command(about = "Telegram bot that turns a replied-to message into a chat-bubble sticker")]
pub struct Args {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Process updates that queued up while the bot was offline
    #[arg(long)]
    pub keep_pending_updates: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = replysticker::config::load_config_with_precedence(args.config.clone())?;
        let merged = replysticker::config::merge_config(config_file);
        let with_env = replysticker::config::apply_env_overrides(merged);
        replysticker::config::apply_cli_overrides(with_env, args.log_file.clone(), args.keep_pending_updates)
    };

    replysticker::logging::init(config.log_file_path.as_deref())?;

    info!(config = ?config, "Configuration loaded and resolved");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    if let Err(e) = runtime.block_on(replysticker::app::run(config)) {
        error!(error = %e, "Bot stopped with an error");
        return Err(e.into());
    }

    info!("Bot stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["replysticker", "--help"]);
        let err = result.expect_err("--help exits through the error path");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["replysticker", "--version"]);
        let err = result.expect_err("--version exits through the error path");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["replysticker"]);
        assert_eq!(args.config, None);
        assert_eq!(args.log_file, None);
        assert!(!args.keep_pending_updates);
    }

    #[test]
    fn test_config_path() {
        let args = Args::parse_from(["replysticker", "--config", "/custom/config.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_log_file_path() {
        let args = Args::parse_from(["replysticker", "--log-file", "/var/log/replysticker.log"]);
        assert_eq!(args.log_file, Some(PathBuf::from("/var/log/replysticker.log")));
    }

    #[test]
    fn test_positional_arguments_rejected() {
        let result = Args::try_parse_from(["replysticker", "extra"]);
        assert!(result.is_err(), "The bot takes no positional arguments");
    }

    #[test]
    fn test_keep_pending_updates_flows_through_precedence_chain() {
        use replysticker::config::{apply_cli_overrides, merge_config, ConfigFile};

        let config_file = ConfigFile {
            drop_pending_updates: Some(true),
            ..ConfigFile::default()
        };
        let merged = merge_config(Some(config_file));
        assert!(merged.drop_pending_updates, "Config file value should apply");

        let args = Args::parse_from(["replysticker", "--keep-pending-updates"]);
        let with_cli = apply_cli_overrides(merged, args.log_file, args.keep_pending_updates);
        assert!(
            !with_cli.drop_pending_updates,
            "CLI flag should override all other sources"
        );
    }
}
