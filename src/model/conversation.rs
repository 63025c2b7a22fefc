use serde::{Deserialize, Serialize};

use crate::model::message::{Message, Role};

/// Append-only transcript of the session.
///
/// Growth is unbounded: nothing here summarizes or windows old turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Replaces any prior content with the opening three-message transcript.
    pub fn seed(
        &mut self,
        system: impl Into<String>,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) {
        self.messages = vec![
            Message::system(system),
            Message::user(user),
            Message::assistant(assistant),
        ];
    }

    pub fn append_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
    }

    /// Records a reply to a replayed transcript (no new user message).
    pub fn append_assistant(&mut self, assistant: impl Into<String>) {
        self.messages.push(Message::assistant(assistant));
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Overwrites the most recent assistant message. Returns false when the
    /// last entry is not an assistant message.
    pub fn replace_last(&mut self, content: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content = content.into();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
