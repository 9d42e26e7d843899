//! Online directory: who the host bot currently sees connected.
//!
//! The relay only reads it. Hosts either implement [OnlineDirectory] over their own user
//! list or feed an [OnlineUsers] map from join/part notifications.
use std::collections::HashMap;

use super::identity::UserRef;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineUser {
    pub nick: String,
    pub id: String,
    pub moderator: bool,
    pub admin: bool,
}

impl OnlineUser {
    pub fn new(nick: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            id: id.into(),
            moderator: false,
            admin: false,
        }
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef::new(self.nick.clone(), self.id.clone())
    }
}

/// Lookup of currently connected users by exact nickname.
pub trait OnlineDirectory {
    fn lookup(&self, nick: &str) -> Option<&OnlineUser>;
}

/// Map-backed directory keyed by nickname.
#[derive(Debug, Clone, Default)]
pub struct OnlineUsers {
    users: HashMap<String, OnlineUser>,
}

impl OnlineUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: OnlineUser) {
        self.users.insert(user.nick.clone(), user);
    }

    pub fn remove(&mut self, nick: &str) -> Option<OnlineUser> {
        self.users.remove(nick)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn nicks(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }
}

impl OnlineDirectory for OnlineUsers {
    fn lookup(&self, nick: &str) -> Option<&OnlineUser> {
        self.users.get(nick)
    }
}

impl FromIterator<OnlineUser> for OnlineUsers {
    fn from_iter<I: IntoIterator<Item = OnlineUser>>(iter: I) -> Self {
        let mut users = OnlineUsers::new();
        for user in iter {
            users.insert(user);
        }
        users
    }
}
