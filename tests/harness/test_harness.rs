// tests/harness/test_harness.rs
//
// High-level test harness combining all components.
// Provides a convenient API for writing integration tests.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use gmail_thread_probe::probe::{ProbeSettings, ThreadingProbe};

use crate::harness::mock_client::{MockGmailClient, RecordedCall, ThreadingRule};
use crate::harness::virtual_clock::VirtualClock;
use crate::harness::virtual_mailbox::{MailboxMessage, VirtualMailbox};

pub const SETTLE: Duration = Duration::from_secs(3);
pub const PACE: Duration = Duration::from_secs(2);

/// Mailbox, clock and client wired together.
pub struct TestHarness {
    pub mailbox: Arc<RwLock<VirtualMailbox>>,
    pub clock: VirtualClock,
    pub client: MockGmailClient,
}

impl TestHarness {
    /// Create a new test harness whose mock files replies by `rule`.
    pub fn new(rule: ThreadingRule) -> Self {
        let mailbox = Arc::new(RwLock::new(VirtualMailbox::new()));
        let client = MockGmailClient::new(Arc::clone(&mailbox)).with_rule(rule);

        Self {
            mailbox,
            clock: VirtualClock::new(),
            client,
        }
    }

    /// Replace the client, keeping the shared mailbox.
    pub fn configure(mut self, f: impl FnOnce(MockGmailClient) -> MockGmailClient) -> Self {
        self.client = f(self.client);
        self
    }

    // ===== Message Management =====

    pub fn add_message(&self, message: MailboxMessage) -> String {
        self.mailbox.write().unwrap().add_message(message)
    }

    pub fn thread_len(&self, thread_id: &str) -> usize {
        self.mailbox.read().unwrap().thread(thread_id).len()
    }

    // ===== Probe =====

    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            settle: SETTLE,
            pace: PACE,
            ..ProbeSettings::default()
        }
    }

    /// A probe over a clone of the client; calls stay visible through `self.client`.
    pub fn probe(&self) -> ThreadingProbe<MockGmailClient, VirtualClock> {
        ThreadingProbe::new(self.client.clone(), self.clock.clone(), self.settings())
    }

    // ===== Assertions =====

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.client.calls()
    }

    pub fn assert_no_sends(&self) {
        assert_eq!(self.client.send_calls(), 0, "expected no send calls, got {:?}", self.calls());
    }
}
