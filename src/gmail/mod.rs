//! Gmail REST API integration
//!
//! - wire types for the handful of endpoints the probe touches
//! - a blocking HTTP client implementing [`MailboxOps`](crate::client_ops::MailboxOps)

mod client;

pub use client::GmailClient;

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: String,
    }

    /// Message as returned by `messages.get`, `messages.send` and
    /// `drafts.send`. Send responses carry no payload.
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: String,
        pub label_ids: Option<Vec<String>>,
        pub snippet: Option<String>,
        pub payload: Option<MessagePayload>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePayload {
        pub headers: Option<Vec<Header>>,
        pub mime_type: Option<String>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct GmailThread {
        pub id: String,
        #[serde(default)]
        pub messages: Vec<GmailMessage>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Draft {
        pub id: String,
        pub message: MessageRef,
    }

    /// Body of `messages.send`, and the `message` of `drafts.create`
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RawMessage {
        pub raw: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub thread_id: Option<String>,
    }

    #[derive(Debug, Serialize)]
    pub struct CreateDraftRequest {
        pub message: RawMessage,
    }

    #[derive(Debug, Serialize)]
    pub struct SendDraftRequest {
        pub id: String,
    }

    impl GmailMessage {
        /// First header with this name, compared case-insensitively.
        pub fn header(&self, name: &str) -> Option<&str> {
            self.payload
                .as_ref()?
                .headers
                .as_ref()?
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        }
    }

}
