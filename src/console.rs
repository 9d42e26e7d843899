//! Line-oriented console host.
//!
//! Stands in for a chat network when running `relaybot start`: every input line is either a
//! directory change or a chat line, and every outbound message is printed.
//!
//! ```text
//! /join bob#42          bob (stable id 42) comes online
//! /part bob             bob goes offline
//! /who                  list online users
//! alice: !msg bob hi    public chat line from alice
//! *alice#7: hello       private chat line from alice (id 7)
//! bob:                  presence ping from bob (empty text)
//! ```
use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::relay::{ChatEvent, OnlineUser, OnlineUsers, Outbound, RelayBot, UserRef};
use crate::validation::{Target, TargetError};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("expected `nick: text` or a /command")]
    MissingSeparator,

    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    #[error("bad user: {0}")]
    User(#[from] TargetError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Blank,
    Join(OnlineUser),
    Part(String),
    Who,
    Chat(ChatEvent),
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Blank);
    }
    if let Some(directive) = line.strip_prefix('/') {
        let mut parts = directive.split_whitespace();
        let word = parts.next().unwrap_or_default();
        let arg = parts.next().unwrap_or_default();
        return match word.to_ascii_lowercase().as_str() {
            "join" => {
                let target = Target::parse(arg)?;
                let id = target.id.unwrap_or_default();
                Ok(ConsoleInput::Join(OnlineUser::new(target.nick, id)))
            }
            "part" => Ok(ConsoleInput::Part(Target::parse(arg)?.nick)),
            "who" => Ok(ConsoleInput::Who),
            other => Err(ConsoleError::UnknownDirective(other.to_string())),
        };
    }
    let (private, rest) = match line.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let (who, text) = rest.split_once(':').ok_or(ConsoleError::MissingSeparator)?;
    let target = Target::parse(who)?;
    let sender = UserRef::new(target.nick, target.id.unwrap_or_default());
    let event = ChatEvent::new(sender, text.trim(), private);
    Ok(ConsoleInput::Chat(event))
}

/// `-> [private] @bob: text`, continuation lines indented.
pub fn render(out: &Outbound) -> String {
    let visibility = if out.private { "private" } else { "public" };
    let to = match &out.recipient {
        Some(user) => format!("@{}", user.nick),
        None => "*".to_string(),
    };
    let body = out.text.trim_end_matches('\n').replace('\n', "\n   ");
    format!("-> [{}] {}: {}", visibility, to, body)
}

/// Drive `bot` from `input` until EOF, writing deliveries and notices to `output`.
pub async fn run<R, W>(
    bot: &mut RelayBot,
    online: &mut OnlineUsers,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match parse_line(&line) {
            Ok(ConsoleInput::Blank) => continue,
            Ok(ConsoleInput::Join(user)) => {
                debug!("{} joined", user.nick);
                let note = format!("** {} is online", user.user_ref());
                online.insert(user);
                note
            }
            Ok(ConsoleInput::Part(nick)) => match online.remove(&nick) {
                Some(_) => format!("** {} is offline", nick),
                None => format!("** {} was not online", nick),
            },
            Ok(ConsoleInput::Who) => {
                let mut nicks: Vec<&str> = online.nicks().collect();
                nicks.sort_unstable();
                format!("** online: {}", nicks.join(", "))
            }
            Ok(ConsoleInput::Chat(event)) => bot
                .handle_event(&event, &*online)
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!("ignoring console line: {}", e);
                format!("!! {}", e)
            }
        };
        if !reply.is_empty() {
            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }
    bot.shutdown().await?;
    Ok(())
}
