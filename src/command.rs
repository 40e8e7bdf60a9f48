//! Bot command recognition.
//!
//! A command is text starting with `/name`, where the name is ASCII
//! alphanumerics or `_`, optionally followed by `@botname`.

use crate::store::fallback::MAX_MERGE;

/// A parsed `/name[@bot] args` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    /// Lowercased command name without the slash.
    pub name: String,
    /// `@botname` suffix without the `@`, if present.
    pub mention: Option<&'a str>,
    /// Remaining text after the command token, trimmed.
    pub args: &'a str,
}

impl Command<'_> {
    /// Whether this command is meant for the bot named `bot_username`.
    ///
    /// Unaddressed commands are meant for every bot in the chat.
    pub fn is_addressed_to(&self, bot_username: &str) -> bool {
        match self.mention {
            Some(mention) => mention.eq_ignore_ascii_case(bot_username.trim_start_matches('@')),
            None => true,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `text` starts with a command token.
pub fn is_command_text(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('/') && chars.next().is_some_and(is_name_char)
}

/// Parse a command token and its arguments from message text.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    if !is_command_text(text) {
        return None;
    }

    let body = &text[1..];
    let token_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let (token, rest) = body.split_at(token_end);

    let name_end = token.find(|c: char| !is_name_char(c)).unwrap_or(token.len());
    let (name, suffix) = token.split_at(name_end);
    let mention = suffix
        .strip_prefix('@')
        .filter(|m| !m.is_empty() && m.chars().all(is_name_char));

    Some(Command {
        name: name.to_ascii_lowercase(),
        mention,
        args: rest.trim(),
    })
}

/// Number of messages to merge, from the command's raw text.
///
/// The second whitespace-separated token, if it is an integer in
/// `1..=`[`MAX_MERGE`], is the count. Anything else, including out-of-range
/// values, yields 1.
pub fn parse_merge_count(raw_text: &str) -> usize {
    raw_text
        .split_whitespace()
        .nth(1)
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|count| (1..=MAX_MERGE).contains(count))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== is_command_text Tests =====

    #[test]
    fn recognises_commands() {
        assert!(is_command_text("/sticker"));
        assert!(is_command_text("/Sticker@MyBot 3"));
        assert!(is_command_text("/a_b1"));
    }

    #[test]
    fn rejects_non_commands() {
        assert!(!is_command_text("hello /sticker"));
        assert!(!is_command_text("/"));
        assert!(!is_command_text("/ sticker"));
        assert!(!is_command_text("//x"));
        assert!(!is_command_text(""));
    }

    // ===== parse_command Tests =====

    #[test]
    fn parses_name_mention_and_args() {
        let command = parse_command("/Sticker@ReplyBot  3  ").unwrap();
        assert_eq!(command.name, "sticker");
        assert_eq!(command.mention, Some("ReplyBot"));
        assert_eq!(command.args, "3");
    }

    #[test]
    fn parses_bare_command() {
        let command = parse_command("/help").unwrap();
        assert_eq!(command.name, "help");
        assert_eq!(command.mention, None);
        assert_eq!(command.args, "");
    }

    #[test]
    fn addressed_to_matches_case_insensitively() {
        let command = parse_command("/pack@replybot").unwrap();
        assert!(command.is_addressed_to("ReplyBot"));
        assert!(!command.is_addressed_to("OtherBot"));
        assert!(parse_command("/pack").unwrap().is_addressed_to("AnyBot"));
    }

    // ===== parse_merge_count Tests =====

    #[test]
    fn merge_count_defaults_to_one() {
        assert_eq!(parse_merge_count("/sticker"), 1);
    }

    #[test]
    fn merge_count_reads_second_token() {
        assert_eq!(parse_merge_count("/sticker 3"), 3);
        assert_eq!(parse_merge_count("/sticker@bot\t2 extra"), 2);
    }

    #[test]
    fn merge_count_malformed_falls_back_to_one() {
        assert_eq!(parse_merge_count("/sticker three"), 1);
        assert_eq!(parse_merge_count("/sticker 0"), 1);
        assert_eq!(parse_merge_count("/sticker -2"), 1);
        assert_eq!(parse_merge_count("/sticker 99999999999999999999999"), 1);
    }

    #[test]
    fn merge_count_out_of_range_falls_back_to_one() {
        assert_eq!(
            parse_merge_count("/sticker 9"),
            1,
            "Counts above the merge limit are treated as malformed"
        );
        assert_eq!(parse_merge_count("/sticker 10"), 1);
    }

    #[test]
    fn merge_count_accepts_upper_limit() {
        assert_eq!(parse_merge_count("/sticker 4"), 4, "The merge limit itself is valid");
    }
}
