use relaybot::relay::commands::CommandParser;
use relaybot::relay::{ChatEvent, OnlineUser, OnlineUsers, PendingStore, RelayBot, UserRef};

fn setup() -> (RelayBot, OnlineUsers) {
    let bot = RelayBot::new("relaybot", CommandParser::new(), PendingStore::in_memory());
    let users = [OnlineUser::new("dave", "7"), OnlineUser::new("erin", "")];
    let online: OnlineUsers = users.into_iter().collect();
    (bot, online)
}

fn line(nick: &str, text: &str, private: bool) -> ChatEvent {
    ChatEvent::new(UserRef::nick_only(nick), text, private)
}

#[test]
fn tell_to_offline_user_reports_and_queues_nothing() {
    let (mut bot, online) = setup();
    let alice = UserRef::nick_only("alice");
    let out = bot.handle_event(&line("alice", "!tell carol hi", false), &online);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text, "carol isn't online");
    assert_eq!(out[0].recipient.as_ref(), Some(&alice));
    assert!(!out[0].private);
    assert!(bot.store().is_empty());
}

#[test]
fn offline_notice_follows_sender_visibility() {
    let (mut bot, online) = setup();
    let out = bot.handle_event(&line("alice", "!whisper @carol psst", true), &online);
    assert_eq!(out[0].text, "carol isn't online");
    assert!(out[0].private);
}

#[test]
fn tell_relays_publicly_to_online_user() {
    let (mut bot, online) = setup();
    let event = line("alice", "!tell @dave lunch is ready", true);
    let out = bot.handle_event(&event, &online);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text, "lunch is ready");
    assert_eq!(out[0].recipient, Some(UserRef::new("dave", "7")));
    assert!(!out[0].private);
    assert!(bot.store().is_empty());
}

#[test]
fn whisper_relays_privately() {
    let (mut bot, online) = setup();
    let event = line("alice", "!whisper erin the code is 1234", false);
    let out = bot.handle_event(&event, &online);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text, "the code is 1234");
    assert_eq!(out[0].recipient, Some(UserRef::nick_only("erin")));
    assert!(out[0].private);
}

#[test]
fn lookup_is_exact_nickname() {
    let (mut bot, online) = setup();
    let out = bot.handle_event(&line("alice", "!tell Dave hi", false), &online);
    assert_eq!(out[0].text, "Dave isn't online");
}

#[test]
fn say_broadcasts_argument_string() {
    let (mut bot, online) = setup();
    let event = line("alice", "!say  hello   everyone", false);
    let out = bot.handle_event(&event, &online);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text, "hello   everyone");
    assert_eq!(out[0].recipient, None);
    assert!(!out[0].private);
}

#[test]
fn tell_without_target_is_rejected() {
    let (mut bot, online) = setup();
    let out = bot.handle_event(&line("alice", "!tell", false), &online);
    assert_eq!(out.len(), 1);
    assert!(out[0].text.starts_with("invalid target"));
}

#[test]
fn relay_commands_still_flush_the_sender() {
    let (mut bot, online) = setup();
    bot.handle_event(&line("bob", "!msg alice call me", false), &online);
    let out = bot.handle_event(&line("alice", "!tell dave ok", false), &online);
    assert_eq!(out.len(), 2);
    assert!(out[0].text.starts_with("you have 1 new message\n"));
    assert_eq!(out[1].text, "ok");
}
