// src/probe.rs

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::fmt;
use std::time::Duration;

use crate::cfg::config::Config;
use crate::client_ops::{MailboxOps, Pacer};
use crate::error::ProbeError;
use crate::mailbox::{fetch_thread, find_recent_incoming_message};
use crate::message::OriginalMessage;
use crate::strategy::{ReplyTarget, Strategy, STRATEGIES};
use crate::verify::ThreadingVerifier;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub search_query: String,
    pub max_results: u32,
    pub reply_subject: String,
    pub settle: Duration,
    pub pace: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Config::default().probe_settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Init,
    Authenticated,
    TargetFound,
    /// Running the strategy with this number
    Running(u8),
    Summarized,
    Done,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    NoTargetMessage,
}

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub number: u8,
    pub name: String,
    pub sent: bool,
    pub threaded_correctly: bool,
    pub error: Option<String>,
    /// Provider id of the message we sent
    pub sent_message_id: Option<String>,
    /// Thread the provider filed the sent message under
    pub assigned_thread_id: Option<String>,
    /// Message-ID header Gmail generated for the sent message
    pub assigned_message_id: Option<String>,
}

impl StrategyResult {
    fn failed(strategy: &Strategy, err: &ProbeError) -> Self {
        StrategyResult {
            number: strategy.number,
            name: strategy.label(),
            sent: false,
            threaded_correctly: false,
            error: Some(err.to_string()),
            sent_message_id: None,
            assigned_thread_id: None,
            assigned_message_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub target: Option<OriginalMessage>,
    pub results: Vec<StrategyResult>,
    pub halted: Option<HaltReason>,
}

impl ProbeReport {
    pub fn successful(&self) -> impl Iterator<Item = &StrategyResult> + '_ {
        self.results.iter().filter(|r| r.threaded_correctly)
    }

    /// The first strategy that threaded, if any.
    pub fn recommendation(&self) -> Option<&StrategyResult> {
        self.successful().next()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "📊 TEST SUMMARY")?;
        writeln!(f, "{}", rule)?;

        for r in &self.results {
            let mark = match (r.sent, r.threaded_correctly) {
                (true, true) => "✅",
                (true, false) => "⚠️ ",
                (false, _) => "❌",
            };
            write!(f, "{} {}", mark, r.name)?;
            if let Some(thread_id) = &r.assigned_thread_id {
                write!(f, " (threadId {})", thread_id)?;
            }
            if let Some(err) = &r.error {
                write!(f, " - {}", err)?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        let successful: Vec<&StrategyResult> = self.successful().collect();
        if successful.is_empty() {
            writeln!(f, "❌ No methods worked - Gmail threading may have issues")?;
        } else {
            writeln!(f, "✅ {} method(s) worked:", successful.len())?;
            for r in &successful {
                writeln!(f, "   • {}", r.name)?;
            }
        }

        if let Some(best) = self.recommendation() {
            writeln!(f, "\n💡 Recommendation: use {} for your application", best.name)?;
        }
        Ok(())
    }
}

/// Drives authentication, target selection and the strategy matrix.
pub struct ThreadingProbe<C: MailboxOps, P: Pacer> {
    client: C,
    pacer: P,
    settings: ProbeSettings,
    verifier: ThreadingVerifier,
    state: ProbeState,
}

impl<C: MailboxOps, P: Pacer> ThreadingProbe<C, P> {
    pub fn new(client: C, pacer: P, settings: ProbeSettings) -> Self {
        debug!("Initializing ThreadingProbe with {:?}", settings);

        ThreadingProbe {
            client,
            pacer,
            verifier: ThreadingVerifier::new(settings.settle),
            settings,
            state: ProbeState::Init,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Run the full suite. Authentication failure is returned as an error;
    /// every other problem ends up in the report.
    pub fn run(&mut self) -> Result<ProbeReport, ProbeError> {
        println!("🚀 Starting Gmail Threading Test Suite");
        println!("{}", "=".repeat(50));

        println!("🔐 Authenticating with Gmail API...");
        if let Err(e) = self.client.authenticate() {
            error!("Authentication failed: {}", e);
            self.state = ProbeState::Halted;
            return Err(e);
        }
        self.state = ProbeState::Authenticated;
        println!("✅ Authentication successful!");

        println!("📧 Searching for recent incoming email...");
        let Some(original) =
            find_recent_incoming_message(&mut self.client, &self.settings.search_query, self.settings.max_results)
        else {
            println!("❌ No incoming emails found in inbox");
            println!("❌ Cannot proceed without an incoming email to reply to");
            self.state = ProbeState::Halted;
            return Ok(ProbeReport {
                target: None,
                results: Vec::new(),
                halted: Some(HaltReason::NoTargetMessage),
            });
        };
        self.state = ProbeState::TargetFound;

        println!("\n📧 Will reply to: {}", original.subject);
        println!("   From: {}", original.from);
        println!("   Thread ID: {}", original.thread_id);
        println!("   Message ID: {}", original.message_id.as_deref().unwrap_or("(none)"));

        let to = original.reply_address();
        let subject = self.settings.reply_subject.clone();
        let body = reply_body(Local::now());
        let target = ReplyTarget {
            to: &to,
            subject: &subject,
            body: &body,
            thread_id: &original.thread_id,
            in_reply_to: original.message_id.as_deref(),
        };

        let mut results = Vec::with_capacity(STRATEGIES.len());
        for strategy in STRATEGIES.iter() {
            self.state = ProbeState::Running(strategy.number);
            let result = self.run_strategy(strategy, &original, &target);
            results.push(result);
            self.pacer.pause(self.settings.pace);
        }

        let report = ProbeReport {
            target: Some(original),
            results,
            halted: None,
        };
        self.state = ProbeState::Summarized;
        println!("\n{}", report);
        self.state = ProbeState::Done;

        info!(
            "Probe finished: {}/{} strategies threaded",
            report.successful().count(),
            report.results.len()
        );
        Ok(report)
    }

    fn run_strategy(
        &mut self,
        strategy: &Strategy,
        original: &OriginalMessage,
        target: &ReplyTarget<'_>,
    ) -> StrategyResult {
        let label = strategy.label();
        println!("\n{}", "=".repeat(60));
        println!("🧪 {}", label);
        println!("{}", "=".repeat(60));

        let count_before = fetch_thread(&mut self.client, &original.thread_id).len();
        debug!("{}: thread has {} messages before send", label, count_before);

        let sent = match strategy.execute(&mut self.client, target) {
            Ok(sent) => sent,
            Err(e) => {
                println!("❌ {} failed to send", label);
                return StrategyResult::failed(strategy, &e);
            }
        };
        println!("   ✅ Email sent! Message ID: {}", sent.id);

        let assigned_message_id = self.assigned_message_id(&sent.id);
        if let Some(message_id) = &assigned_message_id {
            println!("   🆔 Gmail assigned Message-ID: {}", message_id);
        }

        println!("🔍 Testing if message threaded correctly...");
        let check = self.verifier.inspect(
            &mut self.client,
            &self.pacer,
            &original.thread_id,
            count_before,
            &sent.id,
        );
        println!("   📊 Thread now has {} messages", check.count_after);

        let threaded = check.threaded();
        if threaded {
            println!("   ✅ Threaded correctly!");
            println!("🎉 SUCCESS! {} worked!", label);
        } else {
            println!("   ❌ New thread created (not threaded)");
            println!("⚠️  {} sent but didn't thread correctly", label);
        }

        StrategyResult {
            number: strategy.number,
            name: label,
            sent: true,
            threaded_correctly: threaded,
            error: None,
            sent_message_id: Some(sent.id.clone()),
            assigned_thread_id: Some(sent.thread_id).filter(|t| !t.is_empty()),
            assigned_message_id,
        }
    }

    /// Read back the Message-ID Gmail generated for a sent message.
    fn assigned_message_id(&mut self, sent_id: &str) -> Option<String> {
        match self.client.get_message(sent_id) {
            Ok(msg) => msg.header("Message-ID").map(String::from),
            Err(e) => {
                warn!("Could not read back sent message {}: {}", sent_id, e);
                None
            }
        }
    }
}

fn reply_body(sent_at: DateTime<Local>) -> String {
    format!(
        "<p>This is a test reply to verify Gmail threading.</p>\n\
         <p>Sent at: {}</p>\n\
         <p>If you see this message in the same thread as the original email, threading is working correctly!</p>",
        sent_at.format("%Y-%m-%d %H:%M:%S")
    )
}
