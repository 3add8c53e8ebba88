// src/strategy.rs
//
// The send-strategy matrix: six descriptors, one build-and-send routine.

use log::{debug, error, warn};

use crate::client_ops::MailboxOps;
use crate::compose::{encode_raw, BodyType, OutboundMessage};
use crate::error::ProbeError;
use crate::gmail::api::GmailMessage;
use crate::mailbox::fetch_thread;

/// Which reply-chain headers go into the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingHeaders {
    None,
    /// `In-Reply-To` and `References`, both set to the original's Message-ID
    ReplyTo,
    /// `References` = first message of the thread, then the original
    ReferenceChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Direct,
    /// `drafts.create` followed by `drafts.send`
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub number: u8,
    pub name: &'static str,
    pub headers: ThreadingHeaders,
    pub include_thread_id: bool,
    pub delivery: Delivery,
    pub body_type: BodyType,
}

pub const STRATEGIES: [Strategy; 6] = [
    Strategy {
        number: 1,
        name: "threadId + In-Reply-To + References",
        headers: ThreadingHeaders::ReplyTo,
        include_thread_id: true,
        delivery: Delivery::Direct,
        body_type: BodyType::Html,
    },
    Strategy {
        number: 2,
        name: "threadId only",
        headers: ThreadingHeaders::None,
        include_thread_id: true,
        delivery: Delivery::Direct,
        body_type: BodyType::Html,
    },
    Strategy {
        number: 3,
        name: "In-Reply-To + References only",
        headers: ThreadingHeaders::ReplyTo,
        include_thread_id: false,
        delivery: Delivery::Direct,
        body_type: BodyType::Html,
    },
    Strategy {
        number: 4,
        name: "Create draft first",
        headers: ThreadingHeaders::ReplyTo,
        include_thread_id: true,
        delivery: Delivery::Draft,
        body_type: BodyType::Html,
    },
    Strategy {
        number: 5,
        name: "Plain text",
        headers: ThreadingHeaders::ReplyTo,
        include_thread_id: true,
        delivery: Delivery::Direct,
        body_type: BodyType::PlainText,
    },
    Strategy {
        number: 6,
        name: "References chain",
        headers: ThreadingHeaders::ReferenceChain,
        include_thread_id: true,
        delivery: Delivery::Direct,
        body_type: BodyType::Html,
    },
];

/// What every strategy replies with and to.
#[derive(Debug, Clone, Copy)]
pub struct ReplyTarget<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub thread_id: &'a str,
    /// Message-ID of the message being replied to
    pub in_reply_to: Option<&'a str>,
}

impl Strategy {
    pub fn label(&self) -> String {
        format!("Method {}: {}", self.number, self.name)
    }

    /// Assemble the outbound message. Only the reference chain needs the
    /// client, to read the thread's first Message-ID.
    pub fn compose<C: MailboxOps>(
        &self,
        client: &mut C,
        target: &ReplyTarget<'_>,
    ) -> Result<OutboundMessage, ProbeError> {
        let (in_reply_to, references) = match self.headers {
            ThreadingHeaders::None => (None, None),
            ThreadingHeaders::ReplyTo => {
                if target.in_reply_to.is_none() {
                    warn!("Original has no Message-ID; {} goes out without threading headers", self.label());
                }
                (target.in_reply_to.map(String::from), target.in_reply_to.map(String::from))
            }
            ThreadingHeaders::ReferenceChain => {
                let snapshot = fetch_thread(client, target.thread_id);
                if snapshot.len() < 2 {
                    return Err(ProbeError::Precondition(format!(
                        "need at least 2 messages in thread for References chain, found {}",
                        snapshot.len()
                    )));
                }
                let first = snapshot
                    .first()
                    .and_then(|entry| entry.message_id.clone())
                    .ok_or_else(|| ProbeError::Precondition("could not find original message ID".to_string()))?;
                let reply_to = target.in_reply_to.ok_or_else(|| {
                    ProbeError::Precondition("original message has no Message-ID to reply to".to_string())
                })?;
                (Some(reply_to.to_string()), Some(format!("{} {}", first, reply_to)))
            }
        };

        Ok(OutboundMessage::new(target.to, target.subject, target.body, self.body_type)
            .in_reply_to(in_reply_to.as_deref())
            .references(references.as_deref()))
    }

    /// Build, encode and submit the reply. Returns the provider's record of
    /// the sent message.
    pub fn execute<C: MailboxOps>(
        &self,
        client: &mut C,
        target: &ReplyTarget<'_>,
    ) -> Result<GmailMessage, ProbeError> {
        let result = self.compose(client, target).and_then(|outbound| {
            debug!(
                "{}: In-Reply-To={:?} References={:?} threadId={}",
                self.label(),
                outbound.in_reply_to,
                outbound.references,
                self.include_thread_id
            );
            let raw = encode_raw(&outbound.to_bytes());
            self.deliver(client, &raw, target.thread_id)
        });

        if let Err(e) = &result {
            error!("   ❌ {}: {}", self.label(), e);
        }
        result
    }

    fn deliver<C: MailboxOps>(&self, client: &mut C, raw: &str, thread_id: &str) -> Result<GmailMessage, ProbeError> {
        let thread_id = self.include_thread_id.then_some(thread_id);

        match self.delivery {
            Delivery::Direct => client.send_message(raw, thread_id),
            Delivery::Draft => {
                let draft = client.create_draft(raw, thread_id)?;
                println!("   📝 Draft created: {}", draft.id);
                client
                    .send_draft(&draft.id)
                    .inspect_err(|e| {
                        warn!("Draft {} was created but not sent and is left behind: {}", draft.id, e)
                    })
            }
        }
    }
}
