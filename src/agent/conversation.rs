//! Conversation history with a sliding window.

use crate::model::{Message, Role};

/// Default number of messages retained per conversation.
pub const DEFAULT_WINDOW_SIZE: usize = 40;

/// Ordered messages exchanged with the model.
///
/// After trimming, the history always starts with a plain user message, so a
/// tool result is never separated from the tool use that produced it.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    window_size: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl Conversation {
    pub fn new(window_size: usize) -> Self {
        Self {
            messages: Vec::new(),
            window_size: window_size.max(1),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop everything after `len` messages.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Trim the oldest messages until the window fits, then advance to the
    /// next message that can legally open a conversation.
    ///
    /// The most recent user turn is never dropped, even if it alone exceeds
    /// the window.
    pub fn apply_window(&mut self) {
        if self.messages.len() <= self.window_size {
            return;
        }

        let mut start = self.messages.len() - self.window_size;
        while start < self.messages.len() && !is_turn_start(&self.messages[start]) {
            start += 1;
        }

        if start >= self.messages.len() {
            // No clean boundary inside the window; keep from the last user turn.
            start = self
                .messages
                .iter()
                .rposition(is_turn_start)
                .unwrap_or(0);
        }

        if start > 0 {
            self.messages.drain(..start);
        }
    }
}

fn is_turn_start(message: &Message) -> bool {
    message.role == Role::User && !message.is_tool_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentBlock;

    fn tool_use(id: &str) -> Message {
        Message {
            role: Role::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: "weather".to_string(),
                input: serde_json::json!({}),
            }],
        }
    }

    fn tool_result(id: &str) -> Message {
        Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: id.to_string(),
                content: "sunny".to_string(),
                is_error: false,
            }],
        }
    }

    #[test]
    fn test_window_under_limit_is_untouched() {
        let mut conversation = Conversation::new(4);
        conversation.push(Message::user_text("a"));
        conversation.push(Message::assistant_text("b"));
        conversation.apply_window();
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_window_drops_oldest_turns() {
        let mut conversation = Conversation::new(4);
        for i in 0..4 {
            conversation.push(Message::user_text(format!("q{}", i)));
            conversation.push(Message::assistant_text(format!("a{}", i)));
        }
        conversation.apply_window();

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[0].first_text(), Some("q2"));
    }

    #[test]
    fn test_window_never_starts_with_tool_result() {
        let mut conversation = Conversation::new(3);
        conversation.push(Message::user_text("weather?"));
        conversation.push(tool_use("t1"));
        conversation.push(tool_result("t1"));
        conversation.push(Message::assistant_text("sunny"));
        conversation.push(Message::user_text("thanks"));
        conversation.push(Message::assistant_text("welcome"));

        conversation.apply_window();

        let first = &conversation.messages()[0];
        assert_eq!(first.role, Role::User);
        assert!(!first.is_tool_result());
        assert_eq!(first.first_text(), Some("thanks"));
    }

    #[test]
    fn test_window_keeps_oversized_last_turn() {
        let mut conversation = Conversation::new(2);
        conversation.push(Message::user_text("weather twice?"));
        conversation.push(tool_use("t1"));
        conversation.push(tool_result("t1"));
        conversation.push(tool_use("t2"));
        conversation.push(tool_result("t2"));

        conversation.apply_window();

        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.messages()[0].first_text(), Some("weather twice?"));
    }
}
