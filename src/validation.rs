//! Validation of address tokens used by the relay commands.
//!
//! Commands address people with tokens like `alice`, `@alice` or `@alice#42`. A token is
//! only ever parsed here; resolving it to a queue key happens in [crate::relay::identity].

/// Longest nickname accepted in an address token.
pub const MAX_NICK_LEN: usize = 64;

/// Address token errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("no target given")]
    Missing,

    #[error("target nickname is empty")]
    EmptyNick,

    #[error("target nickname is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("target contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

/// A parsed address token: nickname plus the optional stable id after the first `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub nick: String,
    pub id: Option<String>,
}

impl Target {
    /// Parse a raw token. Leading `@` characters are stripped and the token is split on the
    /// first `#`; an empty id half is treated as absent.
    pub fn parse(token: &str) -> Result<Self, TargetError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TargetError::Missing);
        }
        let stripped = token.trim_start_matches('@');
        let (nick, id) = match stripped.split_once('#') {
            Some((nick, id)) => (nick, (!id.is_empty()).then(|| id.to_string())),
            None => (stripped, None),
        };
        let nick = validate_nick(nick)?;
        Ok(Target { nick, id })
    }
}

/// Validate a nickname as it appears in an address token.
pub fn validate_nick(nick: &str) -> Result<String, TargetError> {
    if nick.is_empty() {
        return Err(TargetError::EmptyNick);
    }
    if nick.chars().count() > MAX_NICK_LEN {
        return Err(TargetError::TooLong { max: MAX_NICK_LEN });
    }
    let bad: String = nick
        .chars()
        .filter(|c| c.is_whitespace() || c.is_control())
        .collect();
    if !bad.is_empty() {
        let chars = bad.escape_debug().to_string();
        return Err(TargetError::InvalidCharacters { chars });
    }
    Ok(nick.to_string())
}
