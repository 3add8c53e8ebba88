// src/verify.rs

use log::{debug, warn};
use std::time::Duration;

use crate::client_ops::{MailboxOps, Pacer};
use crate::mailbox::fetch_thread;

/// Thread state observed after a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCheck {
    pub count_before: usize,
    pub count_after: usize,
    /// Whether the sent message's id shows up in the refetched thread
    pub contains_sent: bool,
}

impl ThreadCheck {
    pub fn grew(&self) -> bool {
        self.count_after > self.count_before
    }

    /// The thread grew and the growth includes our message. A count
    /// increase alone may be an unrelated reply landing at the same time.
    pub fn threaded(&self) -> bool {
        self.grew() && self.contains_sent
    }
}

/// Re-reads a thread after Gmail has had time to file a new message.
#[derive(Debug, Clone, Copy)]
pub struct ThreadingVerifier {
    pub settle: Duration,
}

impl ThreadingVerifier {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Count-only check: true iff the thread now holds more than `count_before` messages.
    pub fn verify_threaded<C: MailboxOps, P: Pacer>(
        &self,
        client: &mut C,
        pacer: &P,
        thread_id: &str,
        count_before: usize,
    ) -> bool {
        pacer.pause(self.settle);
        let count_after = fetch_thread(client, thread_id).len();
        debug!("Thread {}: {} -> {} messages", thread_id, count_before, count_after);
        count_after > count_before
    }

    /// Count check plus membership of the message we just sent.
    pub fn inspect<C: MailboxOps, P: Pacer>(
        &self,
        client: &mut C,
        pacer: &P,
        thread_id: &str,
        count_before: usize,
        sent_id: &str,
    ) -> ThreadCheck {
        pacer.pause(self.settle);
        let snapshot = fetch_thread(client, thread_id);
        let check = ThreadCheck {
            count_before,
            count_after: snapshot.len(),
            contains_sent: snapshot.contains(sent_id),
        };

        if check.grew() && !check.contains_sent {
            warn!(
                "Thread {} grew from {} to {} messages but not with sent message {}",
                thread_id, check.count_before, check.count_after, sent_id
            );
        }
        check
    }
}
