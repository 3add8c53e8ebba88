// src/lib.rs
//
// Library entry point for gmail-thread-probe.
// Re-exports modules needed by the binary and integration tests.

pub mod cfg;
pub mod cli;
pub mod client_ops;
pub mod compose;
pub mod error;
pub mod gmail;
pub mod mailbox;
pub mod message;
pub mod oauth2;
pub mod probe;
pub mod strategy;
pub mod verify;

pub use client_ops::{Clock, MailboxOps, Pacer, RealClock, RealPacer};
pub use error::ProbeError;
