// src/mailbox.rs
//
// Read side of the probe: pick the message to reply to, and snapshot threads.
// Provider failures are logged here and turned into empty results.

use log::{debug, error};

use crate::client_ops::MailboxOps;
use crate::message::{OriginalMessage, ThreadEntry, ThreadSnapshot};

/// Most recent message matching `query`, or `None` when nothing matches or
/// the lookup fails.
pub fn find_recent_incoming_message<C: MailboxOps>(
    client: &mut C,
    query: &str,
    max_results: u32,
) -> Option<OriginalMessage> {
    debug!("Searching for messages matching {:?}", query);

    let refs = match client.list_messages(query, max_results) {
        Ok(refs) => refs,
        Err(e) => {
            error!("❌ Error finding email: {}", e);
            return None;
        }
    };
    debug!("Search returned {} candidates", refs.len());

    let first = refs.first()?;
    match client.get_message(&first.id) {
        Ok(msg) => Some(OriginalMessage::from_gmail(&msg)),
        Err(e) => {
            error!("❌ Error fetching message {}: {}", first.id, e);
            None
        }
    }
}

/// All messages of a thread in provider order; empty when the fetch fails.
pub fn fetch_thread<C: MailboxOps>(client: &mut C, thread_id: &str) -> ThreadSnapshot {
    match client.get_thread(thread_id) {
        Ok(thread) => {
            let entries: Vec<ThreadEntry> = thread.messages.iter().map(ThreadEntry::from_gmail).collect();
            debug!("Thread {} has {} messages", thread_id, entries.len());
            ThreadSnapshot {
                thread_id: thread_id.to_string(),
                entries,
            }
        }
        Err(e) => {
            error!("❌ Error getting thread {}: {}", thread_id, e);
            ThreadSnapshot::empty(thread_id)
        }
    }
}
