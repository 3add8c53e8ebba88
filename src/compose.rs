// src/compose.rs
//
// Builds the RFC 2822 text of a reply and its transport encoding.

use base64::{engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE, Engine};

pub const REPLY_PREFIX: &str = "Re:";
const CRLF: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Html,
    PlainText,
}

impl BodyType {
    pub fn content_type(self) -> &'static str {
        match self {
            BodyType::Html => "text/html; charset=utf-8",
            BodyType::PlainText => "text/plain; charset=utf-8",
        }
    }
}

/// A reply about to be sent. Built per strategy, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub body_type: BodyType,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl OutboundMessage {
    pub fn new(to: &str, subject: &str, body: &str, body_type: BodyType) -> Self {
        OutboundMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            body_type,
            in_reply_to: None,
            references: None,
        }
    }

    pub fn in_reply_to(mut self, message_id: Option<&str>) -> Self {
        self.in_reply_to = message_id.map(String::from);
        self
    }

    pub fn references(mut self, references: Option<&str>) -> Self {
        self.references = references.map(String::from);
        self
    }

    /// Subject as it will be sent: replies gain a single `Re: ` prefix.
    pub fn effective_subject(&self) -> String {
        if self.in_reply_to.is_some() && !self.subject.starts_with(REPLY_PREFIX) {
            format!("{} {}", REPLY_PREFIX, self.subject)
        } else {
            self.subject.clone()
        }
    }

    /// UTF-8 bytes of the full message with CRLF line endings throughout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut lines = vec![
            format!("To: {}", self.to),
            format!("Subject: {}", encode_subject(&self.effective_subject())),
            "MIME-Version: 1.0".to_string(),
            format!("Content-Type: {}", self.body_type.content_type()),
        ];

        if let Some(in_reply_to) = &self.in_reply_to {
            lines.push(format!("In-Reply-To: {}", in_reply_to));
        }
        if let Some(references) = &self.references {
            lines.push(format!("References: {}", references));
        }

        lines.push(String::new());
        lines.push(normalize_line_endings(&self.body));

        lines.join(CRLF).into_bytes()
    }
}

/// Build a raw message from loose fields.
pub fn build_message(
    to: &str,
    subject: &str,
    body: &str,
    body_type: BodyType,
    in_reply_to: Option<&str>,
    references: Option<&str>,
) -> Vec<u8> {
    OutboundMessage::new(to, subject, body, body_type)
        .in_reply_to(in_reply_to)
        .references(references)
        .to_bytes()
}

/// RFC 2047 encoded-word, applied to every subject whether or not it is ASCII.
pub fn encode_subject(subject: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
}

/// URL-safe base64 (padded) as the Gmail `raw` field expects.
pub fn encode_raw(message: &[u8]) -> String {
    URL_SAFE.encode(message)
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\n', CRLF)
}
