use std::collections::VecDeque;

use crate::types::Content;

/// Speaker of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
}

/// Append-only window over the most recent conversation entries.
///
/// Once more than `limit` entries have been pushed the oldest are evicted.
/// Entries are never edited in place.
#[derive(Debug, Clone)]
pub struct Conversation {
    entries: VecDeque<ConversationEntry>,
    limit: usize,
}

impl Conversation {
    /// A `limit` of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Conversation {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push_back(ConversationEntry {
            role,
            text: text.into(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    /// `preamble` followed by every entry, with consecutive same-role turns
    /// merged (newline-joined) so roles strictly alternate.
    pub fn to_contents(&self, preamble: &[Content]) -> Vec<Content> {
        let mut contents: Vec<Content> = Vec::with_capacity(preamble.len() + self.entries.len());
        let turns = preamble
            .iter()
            .filter_map(|c| c.parts.first().map(|p| (c.role.as_str(), p.text.as_str())))
            .chain(self.entries.iter().map(|e| (e.role.as_str(), e.text.as_str())));

        for (role, text) in turns {
            match contents.last_mut() {
                Some(last) if last.role == role => {
                    if let Some(part) = last.parts.first_mut() {
                        part.text.push('\n');
                        part.text.push_str(text);
                    }
                }
                _ => contents.push(Content::text(role, text)),
            }
        }
        contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_limit() {
        let mut c = Conversation::new(3);
        for i in 0..5 {
            c.push(Role::User, format!("m{i}"));
        }
        let texts: Vec<&str> = c.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn contents_alternate_roles() {
        let mut c = Conversation::new(10);
        c.push(Role::User, "Output of last command: ok");
        c.push(Role::User, "make it day");
        c.push(Role::Model, "Executed command: /time set day");

        let preamble = [Content::text("user", "system"), Content::text("model", "ack")];
        let contents = c.to_contents(&preamble);
        let roles: Vec<&str> = contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "model", "user", "model"]);
        assert_eq!(
            contents[2].parts[0].text,
            "Output of last command: ok\nmake it day"
        );
    }

    #[test]
    fn model_entry_after_preamble_merges_into_ack() {
        let mut c = Conversation::new(1);
        c.push(Role::User, "dropped");
        c.push(Role::Model, "kept");
        let contents = c.to_contents(&[Content::text("user", "s"), Content::text("model", "ack")]);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].parts[0].text, "ack\nkept");
    }
}
