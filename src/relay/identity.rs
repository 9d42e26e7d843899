//! Recipient identities.
//!
//! A recipient can be addressed by nickname before the relay has ever seen their stable id,
//! so queue entries are keyed by an [IdentityKey] that carries either one or the other.
//! [KnownUsers] remembers which stable id belongs to which nickname across restarts so that
//! [resolve_target] can pick the id-based key even when the recipient is offline.
use log::{debug, trace};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::directory::OnlineDirectory;
use crate::validation::Target;

/// Lightweight snapshot of a chat user taken when an event is observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub nick: String,
    #[serde(default)]
    pub id: String,
}

impl UserRef {
    pub fn new(nick: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            id: id.into(),
        }
    }

    /// A user known only by nickname.
    pub fn nick_only(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            id: String::new(),
        }
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_empty() {
            write!(f, "{}", self.nick)
        } else {
            write!(f, "{}#{}", self.nick, self.id)
        }
    }
}

/// Key of a pending queue. Empty strings mean "not populated".
///
/// Keys produced by the resolver populate exactly one half. Two keys are equal only when
/// both halves match, so a nick-only key never equals an id-only key for the same person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    nick: String,
    id: String,
}

impl IdentityKey {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            nick: String::new(),
            id: id.into(),
        }
    }

    pub fn by_nick(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            id: String::new(),
        }
    }

    /// Prefer the stable id, fall back to the nickname.
    pub fn for_user(user: &UserRef) -> Self {
        if user.id.is_empty() {
            Self::by_nick(user.nick.clone())
        } else {
            Self::by_id(user.id.clone())
        }
    }

    pub fn nick(&self) -> Option<&str> {
        (!self.nick.is_empty()).then_some(self.nick.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        (!self.id.is_empty()).then_some(self.id.as_str())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.nick, self.id)
    }
}

impl FromStr for IdentityKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (nick, id) = s.split_once('#').unwrap_or((s, ""));
        Ok(Self {
            nick: nick.to_string(),
            id: id.to_string(),
        })
    }
}

impl Serialize for IdentityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse::<IdentityKey>() {
            Ok(key) => Ok(key),
            Err(never) => match never {},
        }
    }
}

/// Persistent nickname -> stable id directory, learned from observed traffic.
///
/// An id belongs to at most one nickname: seeing the id under a new nickname forgets the
/// old one, so a nickname given up after a rename no longer routes to that id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownUsers {
    ids: HashMap<String, String>,
}

impl KnownUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the id seen for a nickname. Returns true when the mapping changed.
    pub fn learn(&mut self, user: &UserRef) -> bool {
        if user.nick.is_empty() || user.id.is_empty() {
            return false;
        }
        if self.id_for(&user.nick) == Some(user.id.as_str()) {
            return false;
        }
        self.ids.retain(|nick, id| {
            let stale = *id == user.id;
            if stale {
                debug!("nick {} no longer maps to id {}", nick, id);
            }
            !stale
        });
        debug!("learned id {} for nick {}", user.id, user.nick);
        self.ids.insert(user.nick.clone(), user.id.clone());
        true
    }

    pub fn id_for(&self, nick: &str) -> Option<&str> {
        self.ids.get(nick).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolve an address token to the key its queue should live under.
///
/// Order: online directory (id if it has one), explicit `#id` in the token, a previously
/// learned id for the nickname, and finally the bare nickname.
pub fn resolve_target(
    target: &Target,
    online: &dyn OnlineDirectory,
    known: &KnownUsers,
) -> IdentityKey {
    if let Some(user) = online.lookup(&target.nick) {
        trace!("target {} resolved through online directory", target.nick);
        return IdentityKey::for_user(&UserRef::new(user.nick.clone(), user.id.clone()));
    }
    let synthetic = match &target.id {
        Some(id) => UserRef::new(target.nick.clone(), id.clone()),
        None => match known.id_for(&target.nick) {
            Some(id) => {
                trace!("target {} resolved through known users", target.nick);
                UserRef::new(target.nick.clone(), id)
            }
            None => UserRef::nick_only(target.nick.clone()),
        },
    };
    IdentityKey::for_user(&synthetic)
}
