//! Relay commands: parsing and handlers.
//!
//! Commands are recognised only when a chat line starts with the configured prefix
//! (default `!`), e.g. `!msg bob see you tomorrow` or `!whisper carol psst`. The command word
//! is case-insensitive; arguments are kept verbatim.
//!
//! | command   | aliases  | effect                                                   |
//! |-----------|----------|----------------------------------------------------------|
//! | `message` | `msg`, `m` | queue text for someone who is not around              |
//! | `tell`    |          | relay text publicly to an online user                    |
//! | `whisper` |          | relay text privately to an online user                   |
//! | `say`     |          | broadcast the argument string                            |
use chrono::{DateTime, Utc};
use log::{info, trace};

use super::aggregator;
use super::directory::OnlineDirectory;
use super::errors::RelayError;
use super::identity::resolve_target;
use super::message::{ChatEvent, Outbound, QueuedMessage};
use super::store::PendingStore;
use crate::logutil::escape_log;
use crate::validation::{Target, TargetError};

/// Prefixes a host may configure. Anything else falls back to [DEFAULT_PREFIX].
pub const ALLOWED_PREFIXES: [&str; 6] = ["!", "^", "+", "$", "/", ">"];
pub const DEFAULT_PREFIX: &str = "!";

/// Registration data a host needs for each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Skip events authored by the bot itself
    pub ignore_self: bool,
}

pub static COMMANDS: [CommandSpec; 4] = [
    CommandSpec {
        name: "message",
        aliases: &["msg", "m"],
        ignore_self: true,
    },
    CommandSpec {
        name: "tell",
        aliases: &[],
        ignore_self: true,
    },
    CommandSpec {
        name: "whisper",
        aliases: &[],
        ignore_self: true,
    },
    CommandSpec {
        name: "say",
        aliases: &[],
        ignore_self: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    Message,
    Tell,
    Whisper,
    Say,
}

impl RelayCommand {
    pub fn spec(self) -> &'static CommandSpec {
        match self {
            RelayCommand::Message => &COMMANDS[0],
            RelayCommand::Tell => &COMMANDS[1],
            RelayCommand::Whisper => &COMMANDS[2],
            RelayCommand::Say => &COMMANDS[3],
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        let word = word.to_ascii_lowercase();
        let spec = COMMANDS
            .iter()
            .find(|c| c.name == word || c.aliases.contains(&word.as_str()))?;
        Some(match spec.name {
            "message" => RelayCommand::Message,
            "tell" => RelayCommand::Tell,
            "whisper" => RelayCommand::Whisper,
            _ => RelayCommand::Say,
        })
    }
}

/// A recognised command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: RelayCommand,
    /// Whitespace-separated argument tokens
    pub args: Vec<String>,
    /// Everything after the command word, surrounding whitespace removed
    pub arg_string: String,
}

impl ParsedCommand {
    pub fn target_token(&self) -> Result<&str, RelayError> {
        self.args
            .first()
            .map(String::as_str)
            .ok_or(RelayError::InvalidTarget(TargetError::Missing))
    }

    /// Argument string with the leading target token removed and trimmed.
    pub fn trailing_text(&self) -> String {
        let Some(target) = self.args.first() else {
            return String::new();
        };
        let rest = self.arg_string.strip_prefix(target.as_str());
        rest.unwrap_or(&self.arg_string).trim().to_string()
    }
}

/// Minimal prefix command parser
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Use `prefix` when it is one of [ALLOWED_PREFIXES], the default otherwise.
    pub fn new_with_prefix(prefix: Option<String>) -> Self {
        match prefix {
            Some(p) if ALLOWED_PREFIXES.contains(&p.trim()) => Self {
                prefix: p.trim().to_string(),
            },
            _ => Self::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn parse(&self, raw: &str) -> Option<ParsedCommand> {
        let body = raw.trim_start().strip_prefix(self.prefix.as_str())?;
        let (word, rest) = match body.find(char::is_whitespace) {
            Some(pos) => (&body[..pos], &body[pos..]),
            None => (body, ""),
        };
        let command = RelayCommand::from_word(word)?;
        let arg_string = rest.trim().to_string();
        let args = arg_string.split_whitespace().map(str::to_string).collect();
        trace!("Parsed {:?} from '{}'", command, escape_log(raw));
        Some(ParsedCommand {
            command,
            args,
            arg_string,
        })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `message <target> <text...>`: flush the issuer, then queue `text` for `target`.
///
/// With no text after the target this is only a "check my messages" query.
pub fn execute_message(
    store: &mut PendingStore,
    online: &dyn OnlineDirectory,
    event: &ChatEvent,
    cmd: &ParsedCommand,
    now: DateTime<Utc>,
) -> Result<Vec<Outbound>, RelayError> {
    let token = cmd.target_token()?;
    let text = cmd.trailing_text();
    let target = if text.is_empty() {
        None
    } else {
        Some(Target::parse(token)?)
    };

    // Issuing any command counts as being seen
    let presence = ChatEvent::presence(event.sender.clone(), event.private);
    let mut out = aggregator::flush_at(store, &presence.at(event.timestamp), now);

    let Some(target) = target else {
        return Ok(out);
    };
    let key = resolve_target(&target, online, store.known());
    let queued = QueuedMessage::new(text, event.sender.clone(), event.timestamp, event.private);
    let depth = store.enqueue(key.clone(), queued);
    info!(
        "queued message from {} for {} ({} pending)",
        event.sender, key, depth
    );

    let to = token.trim_start_matches('@');
    out.push(Outbound::to(
        event.sender.clone(),
        format!("@{} will receive your message once they're back", to),
        event.private,
    ));
    Ok(out)
}

/// `tell`/`whisper <target> <text...>`: relay to an online user right away, never queued.
pub fn execute_relay(
    online: &dyn OnlineDirectory,
    event: &ChatEvent,
    cmd: &ParsedCommand,
    private: bool,
) -> Result<Vec<Outbound>, RelayError> {
    let token = cmd.target_token()?.trim();
    let nick = token.trim_start_matches('@');
    let Some(recipient) = online.lookup(nick) else {
        let reply = format!("{} isn't online", nick);
        return Ok(vec![Outbound::to(event.sender.clone(), reply, event.private)]);
    };
    trace!(
        "relaying from {} to {} (private={})",
        event.sender, recipient.nick, private
    );
    Ok(vec![Outbound::to(recipient.user_ref(), cmd.trailing_text(), private)])
}

/// `say <text...>`: broadcast the argument string as-is.
pub fn execute_say(cmd: &ParsedCommand) -> Vec<Outbound> {
    vec![Outbound::broadcast(cmd.arg_string.clone())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_message() {
        let parser = CommandParser::new();
        for line in ["!message bob", "!msg bob", "!m bob", "!MSG bob"] {
            assert_eq!(
                parser.parse(line).map(|c| c.command),
                Some(RelayCommand::Message),
                "{line}"
            );
        }
    }

    #[test]
    fn trailing_text_keeps_inner_spacing() {
        let cmd = CommandParser::new().parse("!msg @bob  see   you ").unwrap();
        assert_eq!(cmd.args, ["@bob", "see", "you"]);
        assert_eq!(cmd.trailing_text(), "see   you");
    }

    #[test]
    fn invalid_prefix_falls_back_to_default() {
        let parser = CommandParser::new_with_prefix(Some("#".into()));
        assert_eq!(parser.prefix(), "!");
        let parser = CommandParser::new_with_prefix(Some("^".into()));
        assert!(parser.parse("^say hello").is_some());
        assert!(parser.parse("!say hello").is_none());
    }

    #[test]
    fn unknown_or_glued_words_are_ignored() {
        let parser = CommandParser::new();
        assert!(parser.parse("!weather").is_none());
        assert!(parser.parse("!msgbob hi").is_none());
        assert!(parser.parse("msg bob hi").is_none());
    }
}
