// src/client_ops.rs
//
// Trait abstraction for the Gmail operations the probe needs.
// Allows the probe to run against the real API or an in-memory mock.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::ProbeError;
use crate::gmail::api::{Draft, GmailMessage, GmailThread, MessageRef};

/// Mailbox capabilities used by the probe.
/// Implemented by:
/// - `GmailClient` (production, Gmail REST API)
/// - mock clients (testing)
pub trait MailboxOps {
    /// Obtain a usable credential; must be called before any other operation
    fn authenticate(&mut self) -> Result<(), ProbeError>;

    /// List message references matching a Gmail search query, newest first
    fn list_messages(&mut self, query: &str, max_results: u32) -> Result<Vec<MessageRef>, ProbeError>;

    /// Fetch one message with its full header payload
    fn get_message(&mut self, id: &str) -> Result<GmailMessage, ProbeError>;

    /// Fetch a thread with every message's full header payload
    fn get_thread(&mut self, thread_id: &str) -> Result<GmailThread, ProbeError>;

    /// Send a base64url-encoded message, optionally pinned to a thread
    fn send_message(&mut self, raw: &str, thread_id: Option<&str>) -> Result<GmailMessage, ProbeError>;

    /// Store a base64url-encoded message as a draft
    fn create_draft(&mut self, raw: &str, thread_id: Option<&str>) -> Result<Draft, ProbeError>;

    /// Send a previously created draft
    fn send_draft(&mut self, draft_id: &str) -> Result<GmailMessage, ProbeError>;
}

/// Trait for time providers.
/// Allows production code to use real time or virtual time for testing.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time.
#[derive(Clone, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Blocking delays between provider calls.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Clone, Default)]
pub struct RealPacer;

impl Pacer for RealPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
