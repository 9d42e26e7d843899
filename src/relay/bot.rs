use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::aggregator;
use super::commands::{self, CommandParser, CommandSpec, ParsedCommand, RelayCommand, COMMANDS};
use super::directory::OnlineDirectory;
use super::errors::RelayError;
use super::message::{ChatEvent, Outbound};
use super::store::PendingStore;
use crate::config::Config;
use crate::logutil::escape_log;

/// # Relay Bot - per-event entry point
///
/// Hosts hand every observed chat line to [RelayBot::handle_event] together with their
/// current [OnlineDirectory] and send whatever [Outbound] messages come back.
///
/// For each event the bot:
/// 1. flushes the sender's pending messages (unless the bot itself is speaking),
/// 2. then, if the line is a relay command, runs it.
///
/// Events are expected one at a time; the store is mutated only through `&mut self`.
///
/// ```rust,no_run
/// use relaybot::config::Config;
/// use relaybot::relay::{ChatEvent, OnlineUsers, RelayBot, UserRef};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::default();
///     let mut bot = RelayBot::open(&config).await;
///     let online = OnlineUsers::new();
///     let event = ChatEvent::new(UserRef::nick_only("alice"), "!msg bob hello", false);
///     for out in bot.handle_event(&event, &online) {
///         println!("{:?}", out);
///     }
///     bot.shutdown().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RelayBot {
    nick: String,
    parser: CommandParser,
    store: PendingStore,
}

impl RelayBot {
    pub fn new(nick: impl Into<String>, parser: CommandParser, store: PendingStore) -> Self {
        Self {
            nick: nick.into(),
            parser,
            store,
        }
    }

    /// Build a bot from configuration, opening (or degrading) the persistent store.
    pub async fn open(config: &Config) -> Self {
        let storage = &config.storage;
        let store = PendingStore::open_or_degrade(&storage.data_dir, storage.save_coalesce()).await;
        let parser = CommandParser::new_with_prefix(config.bot.command_prefix.clone());
        Self::new(config.bot.nick.clone(), parser, store)
    }

    /// Commands to register with the host.
    pub fn commands(&self) -> &'static [CommandSpec] {
        &COMMANDS
    }

    pub fn store(&self) -> &PendingStore {
        &self.store
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    pub fn handle_event(
        &mut self,
        event: &ChatEvent,
        online: &dyn OnlineDirectory,
    ) -> Vec<Outbound> {
        self.handle_event_at(event, online, Utc::now())
    }

    /// Same as [RelayBot::handle_event] with an explicit clock for message ages.
    pub fn handle_event_at(
        &mut self,
        event: &ChatEvent,
        online: &dyn OnlineDirectory,
        now: DateTime<Utc>,
    ) -> Vec<Outbound> {
        let from_self = event.sender.nick == self.nick;
        let preview = escape_log(&event.text);
        debug!(
            "event from {} (private={}): {}",
            event.sender, event.private, preview
        );

        let mut out = if from_self {
            Vec::new()
        } else {
            aggregator::flush_at(&mut self.store, event, now)
        };

        let Some(cmd) = self.parser.parse(&event.text) else {
            return out;
        };
        if from_self && cmd.command.spec().ignore_self {
            return out;
        }
        match self.execute(event, &cmd, online, now) {
            Ok(replies) => out.extend(replies),
            Err(e) => {
                let name = cmd.command.spec().name;
                warn!("{} rejected {} command: {}", event.sender, name, e);
                out.push(Outbound::to(event.sender.clone(), e.to_string(), event.private));
            }
        }
        out
    }

    /// Run one parsed command. A rejected target leaves the store untouched.
    pub fn execute(
        &mut self,
        event: &ChatEvent,
        cmd: &ParsedCommand,
        online: &dyn OnlineDirectory,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>, RelayError> {
        match cmd.command {
            RelayCommand::Message => {
                commands::execute_message(&mut self.store, online, event, cmd, now)
            }
            RelayCommand::Tell => commands::execute_relay(online, event, cmd, false),
            RelayCommand::Whisper => commands::execute_relay(online, event, cmd, true),
            RelayCommand::Say => Ok(commands::execute_say(cmd)),
        }
    }

    /// Wait for pending writes to reach disk.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        self.store.flush().await
    }
}
