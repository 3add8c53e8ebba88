// src/message.rs

use mailparse::{addrparse, MailAddr};

use crate::gmail::api::GmailMessage;

const UNKNOWN_SENDER: &str = "Unknown";
const NO_SUBJECT: &str = "No Subject";

/// The inbox message every strategy replies to.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalMessage {
    pub id: String,
    pub thread_id: String,
    /// RFC 2822 Message-ID header, if the message carried one
    pub message_id: Option<String>,
    pub from: String,
    pub subject: String,
}

/// One message of a thread as seen at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub id: String,
    pub message_id: Option<String>,
    pub from: String,
    pub subject: String,
}

/// Point-in-time view of a thread, in provider order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSnapshot {
    pub thread_id: String,
    pub entries: Vec<ThreadEntry>,
}

impl OriginalMessage {
    pub fn from_gmail(msg: &GmailMessage) -> Self {
        OriginalMessage {
            id: msg.id.clone(),
            thread_id: msg.thread_id.clone(),
            message_id: msg.header("Message-ID").map(String::from),
            from: msg.header("From").unwrap_or(UNKNOWN_SENDER).to_string(),
            subject: msg.header("Subject").unwrap_or(NO_SUBJECT).to_string(),
        }
    }

    /// Bare address to send the reply to, extracted from `From`.
    pub fn reply_address(&self) -> String {
        parse_first_addr(&self.from)
            .or_else(|| angle_addr(&self.from))
            .unwrap_or_else(|| self.from.trim().to_string())
    }
}

impl ThreadEntry {
    pub fn from_gmail(msg: &GmailMessage) -> Self {
        ThreadEntry {
            id: msg.id.clone(),
            message_id: msg.header("Message-ID").map(String::from),
            from: msg.header("From").unwrap_or(UNKNOWN_SENDER).to_string(),
            subject: msg.header("Subject").unwrap_or(NO_SUBJECT).to_string(),
        }
    }
}

impl ThreadSnapshot {
    pub fn empty(thread_id: &str) -> Self {
        ThreadSnapshot {
            thread_id: thread_id.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&ThreadEntry> {
        self.entries.first()
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.entries.iter().any(|e| e.id == message_id)
    }
}

/// First single address of an RFC 5322 address list
fn parse_first_addr(field: &str) -> Option<String> {
    let addrs = addrparse(field).ok()?;
    addrs.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
    })
}

/// Text between `<` and `>` for headers the parser rejects
fn angle_addr(field: &str) -> Option<String> {
    let start = field.find('<')? + 1;
    let end = field[start..].find('>')? + start;
    Some(field[start..end].trim().to_string()).filter(|s| !s.is_empty())
}
