// tests/harness/virtual_mailbox.rs
//
// In-memory Gmail mailbox for testing.
// Keeps messages in arrival order and groups them by thread id.

use std::collections::{HashMap, HashSet};

use gmail_thread_probe::gmail::api::{GmailMessage, Header, MessagePayload};

/// A message stored in the virtual mailbox.
#[derive(Debug, Clone)]
pub struct MailboxMessage {
    pub id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    pub labels: HashSet<String>,
}

impl MailboxMessage {
    /// Create a message with an empty id; the mailbox assigns one on insert.
    pub fn new(thread_id: &str, from: &str, subject: &str) -> Self {
        Self {
            id: String::new(),
            thread_id: thread_id.to_string(),
            from: from.to_string(),
            to: "me@example.com".to_string(),
            subject: subject.to_string(),
            message_id: None,
            in_reply_to: None,
            references: Vec::new(),
            labels: HashSet::new(),
        }
    }

    /// Builder method to pin the provider id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Builder method to set the RFC 2822 Message-ID.
    pub fn with_message_id(mut self, message_id: &str) -> Self {
        self.message_id = Some(message_id.to_string());
        self
    }

    /// Builder method to add labels.
    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        for label in labels {
            self.labels.insert(label.to_string());
        }
        self
    }

    /// Render as a `format=full` API response.
    pub fn to_gmail(&self) -> GmailMessage {
        let mut headers = vec![
            Header {
                name: "From".to_string(),
                value: self.from.clone(),
            },
            Header {
                name: "To".to_string(),
                value: self.to.clone(),
            },
            Header {
                name: "Subject".to_string(),
                value: self.subject.clone(),
            },
        ];
        if let Some(message_id) = &self.message_id {
            headers.push(Header {
                name: "Message-ID".to_string(),
                value: message_id.clone(),
            });
        }
        if let Some(in_reply_to) = &self.in_reply_to {
            headers.push(Header {
                name: "In-Reply-To".to_string(),
                value: in_reply_to.clone(),
            });
        }
        if !self.references.is_empty() {
            headers.push(Header {
                name: "References".to_string(),
                value: self.references.join(" "),
            });
        }

        let mut label_ids: Vec<String> = self.labels.iter().cloned().collect();
        label_ids.sort();

        GmailMessage {
            id: self.id.clone(),
            thread_id: self.thread_id.clone(),
            label_ids: Some(label_ids),
            snippet: None,
            payload: Some(MessagePayload {
                headers: Some(headers),
                mime_type: Some("text/html".to_string()),
            }),
        }
    }
}

/// A stored draft: the raw message and the thread it was created for.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub id: String,
    pub raw: String,
    pub thread_id: Option<String>,
}

/// In-memory mailbox. Messages keep insertion (arrival) order.
#[derive(Debug, Default)]
pub struct VirtualMailbox {
    messages: Vec<MailboxMessage>,
    drafts: HashMap<String, DraftRecord>,
    next_id: u32,
}

impl VirtualMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id with the given prefix.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Add a message, assigning an id when it has none. Returns the id.
    pub fn add_message(&mut self, mut message: MailboxMessage) -> String {
        if message.id.is_empty() {
            message.id = self.next_id("msg");
        }
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    pub fn get_message(&self, id: &str) -> Option<&MailboxMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages of a thread in arrival order.
    pub fn thread(&self, thread_id: &str) -> Vec<&MailboxMessage> {
        self.messages.iter().filter(|m| m.thread_id == thread_id).collect()
    }

    /// Inbox messages not sent by us, newest first.
    pub fn incoming_newest_first(&self) -> Vec<&MailboxMessage> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.labels.contains("INBOX") && !m.labels.contains("SENT"))
            .collect()
    }

    /// Thread holding the message with this RFC 2822 Message-ID.
    pub fn thread_of_message_id(&self, message_id: &str) -> Option<String> {
        self.messages
            .iter()
            .find(|m| m.message_id.as_deref() == Some(message_id))
            .map(|m| m.thread_id.clone())
    }

    pub fn add_draft(&mut self, raw: &str, thread_id: Option<&str>) -> DraftRecord {
        let draft = DraftRecord {
            id: self.next_id("r"),
            raw: raw.to_string(),
            thread_id: thread_id.map(String::from),
        };
        self.drafts.insert(draft.id.clone(), draft.clone());
        draft
    }

    pub fn take_draft(&mut self, id: &str) -> Option<DraftRecord> {
        self.drafts.remove(id)
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_message_assigns_id() {
        let mut mailbox = VirtualMailbox::new();
        let first = mailbox.add_message(MailboxMessage::new("t1", "a@b.com", "Hi"));
        let second = mailbox.add_message(MailboxMessage::new("t1", "a@b.com", "Hi").with_id("fixed"));

        assert_eq!(first, "msg-1");
        assert_eq!(second, "fixed");
        assert_eq!(mailbox.message_count(), 2);
    }

    #[test]
    fn test_thread_keeps_arrival_order() {
        let mut mailbox = VirtualMailbox::new();
        mailbox.add_message(MailboxMessage::new("t1", "a@b.com", "one").with_id("a"));
        mailbox.add_message(MailboxMessage::new("t2", "c@d.com", "other").with_id("b"));
        mailbox.add_message(MailboxMessage::new("t1", "a@b.com", "two").with_id("c"));

        let ids: Vec<&str> = mailbox.thread("t1").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_incoming_excludes_sent() {
        let mut mailbox = VirtualMailbox::new();
        mailbox.add_message(MailboxMessage::new("t1", "a@b.com", "old").with_id("old").with_labels(&["INBOX"]));
        mailbox.add_message(MailboxMessage::new("t1", "me@example.com", "mine").with_id("mine").with_labels(&["INBOX", "SENT"]));
        mailbox.add_message(MailboxMessage::new("t2", "c@d.com", "new").with_id("new").with_labels(&["INBOX"]));

        let ids: Vec<&str> = mailbox.incoming_newest_first().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_to_gmail_headers() {
        let msg = MailboxMessage::new("t1", "a@b.com", "Hi").with_id("m1").with_message_id("<orig@x>");
        let gmail = msg.to_gmail();
        assert_eq!(gmail.header("Message-ID"), Some("<orig@x>"));
        assert_eq!(gmail.header("From"), Some("a@b.com"));
        assert_eq!(gmail.header("References"), None);
    }
}
