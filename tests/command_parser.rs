use relaybot::relay::commands::{CommandParser, RelayCommand, ALLOWED_PREFIXES, COMMANDS};
use relaybot::relay::RelayError;
use relaybot::validation::TargetError;

#[test]
fn test_message_command() {
    let parser = CommandParser::new();
    match parser.parse("!msg bob see you at 6") {
        Some(cmd) => {
            assert_eq!(cmd.command, RelayCommand::Message);
            assert_eq!(cmd.target_token().unwrap(), "bob");
            assert_eq!(cmd.trailing_text(), "see you at 6");
        }
        other => panic!("Expected Message, got {:?}", other),
    }
}

#[test]
fn test_message_full_name_and_short_alias() {
    let parser = CommandParser::new();
    for line in ["!message @bob hi", "!m @bob hi", "!Message @bob hi"] {
        match parser.parse(line) {
            Some(cmd) => assert_eq!(cmd.command, RelayCommand::Message),
            other => panic!("Expected Message for {line}, got {:?}", other),
        }
    }
}

#[test]
fn test_tell_and_whisper() {
    let parser = CommandParser::new();
    match parser.parse("!tell dave hello") {
        Some(cmd) => assert_eq!(cmd.command, RelayCommand::Tell),
        other => panic!("Expected Tell, got {:?}", other),
    }
    match parser.parse("!WHISPER dave hello") {
        Some(cmd) => assert_eq!(cmd.command, RelayCommand::Whisper),
        other => panic!("Expected Whisper, got {:?}", other),
    }
}

#[test]
fn test_say_keeps_argument_string() {
    let parser = CommandParser::new();
    match parser.parse("!say   two  spaces") {
        Some(cmd) => {
            assert_eq!(cmd.command, RelayCommand::Say);
            assert_eq!(cmd.arg_string, "two  spaces");
            assert_eq!(cmd.args, ["two", "spaces"]);
        }
        other => panic!("Expected Say, got {:?}", other),
    }
}

#[test]
fn test_missing_target() {
    let parser = CommandParser::new();
    match parser.parse("!msg") {
        Some(cmd) => match cmd.target_token() {
            Err(RelayError::InvalidTarget(TargetError::Missing)) => {}
            other => panic!("Expected missing target, got {:?}", other),
        },
        other => panic!("Expected Message, got {:?}", other),
    }
}

#[test]
fn test_target_only_has_no_text() {
    let parser = CommandParser::new();
    let cmd = parser.parse("!msg bob").unwrap();
    assert_eq!(cmd.target_token().unwrap(), "bob");
    assert_eq!(cmd.trailing_text(), "");
}

#[test]
fn test_unknown() {
    let parser = CommandParser::new();
    assert!(parser.parse("garbage").is_none());
    assert!(parser.parse("!dance").is_none());
    assert!(parser.parse("!").is_none());
}

#[test]
fn test_missing_prefix() {
    let parser = CommandParser::new();
    assert!(parser.parse("msg bob hi").is_none());
    assert!(parser.parse("^msg bob hi").is_none());
}

#[test]
fn test_leading_whitespace_before_prefix() {
    let parser = CommandParser::new();
    assert!(parser.parse("   !tell dave hi").is_some());
}

#[test]
fn test_every_allowed_prefix() {
    for prefix in ALLOWED_PREFIXES {
        let parser = CommandParser::new_with_prefix(Some(prefix.to_string()));
        assert_eq!(parser.prefix(), prefix);
        match parser.parse(&format!("{prefix}say hi")) {
            Some(cmd) => assert_eq!(cmd.command, RelayCommand::Say),
            other => panic!("Expected Say with prefix {prefix}, got {:?}", other),
        }
    }
}

#[test]
fn test_disallowed_prefix_falls_back() {
    for bad in ["#", "!!", "", "hey"] {
        let parser = CommandParser::new_with_prefix(Some(bad.to_string()));
        assert_eq!(parser.prefix(), "!");
    }
    assert_eq!(CommandParser::new_with_prefix(None).prefix(), "!");
}

#[test]
fn test_command_table() {
    let names: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
    assert_eq!(names, ["message", "tell", "whisper", "say"]);
    assert!(RelayCommand::Message.spec().ignore_self);
    assert!(RelayCommand::Tell.spec().ignore_self);
    assert!(RelayCommand::Whisper.spec().ignore_self);
    assert!(!RelayCommand::Say.spec().ignore_self);
    assert_eq!(RelayCommand::Message.spec().aliases, ["msg", "m"]);
}
