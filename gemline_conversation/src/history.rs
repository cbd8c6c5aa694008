//! Mapping persisted memory onto chat turns.

use gemline_core::timestamp::strip_timestamp;
use gemline_core::{ChatMessage, MemoryEntry, Timestamp};

/// Replay stored entries as model turns.
///
/// Any bracket artifact that slipped into stored text is removed first, so
/// with `with_timestamps` each turn carries exactly one prefix taken from
/// the entry's own timestamp.
#[must_use]
pub fn replay_turns(entries: &[MemoryEntry], with_timestamps: bool) -> Vec<ChatMessage> {
    entries
        .iter()
        .map(|entry| {
            let text = strip_timestamp(&entry.text);
            let mut turn = entry.to_chat_message(false);
            turn.content = if with_timestamps {
                entry.timestamp.stamp(text)
            } else {
                text.to_string()
            };
            turn
        })
        .collect()
}

/// History turns followed by the new user turn stamped with `now`.
#[must_use]
pub fn build_llm_messages(
    history: &[MemoryEntry],
    with_timestamps: bool,
    user_text: &str,
    now: Timestamp,
) -> Vec<ChatMessage> {
    let mut messages = replay_turns(history, with_timestamps);
    messages.push(ChatMessage::user(now.stamp(user_text)));
    messages
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gemline_core::Role;

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn history() -> Vec<MemoryEntry> {
        vec![
            MemoryEntry::user("早安", at("2024-05-01 08:00:00")),
            MemoryEntry::assistant("[2024-05-01 08:00:00] 早安！", at("2024-05-01 08:00:00")),
        ]
    }

    #[test]
    fn plain_replay_strips_artifacts() {
        let turns = replay_turns(&history(), false);
        assert_eq!(turns[0], ChatMessage::user("早安"));
        assert_eq!(turns[1], ChatMessage::model("早安！"));
    }

    #[test]
    fn stamped_replay_has_one_prefix() {
        let turns = replay_turns(&history(), true);
        assert_eq!(turns[0].content, "[2024-05-01 08:00:00] 早安");
        assert_eq!(turns[1].content, "[2024-05-01 08:00:00] 早安！");
    }

    #[test]
    fn new_turn_is_last_and_stamped() {
        let messages =
            build_llm_messages(&history(), false, "現在幾點？", at("2024-05-01 09:30:00"));
        assert_eq!(messages.len(), 3);
        let last = &messages[2];
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "[2024-05-01 09:30:00] 現在幾點？");
    }

    #[test]
    fn empty_history_yields_single_turn() {
        let messages = build_llm_messages(&[], true, "hi", at("2024-05-01 09:30:00"));
        assert_eq!(messages, vec![ChatMessage::user("[2024-05-01 09:30:00] hi")]);
    }
}
