//! Debounced, cancellable email-uniqueness checks
//!
//! Every `schedule` call for a witness bumps that witness's sequence number
//! and aborts its pending task. Only a resolution carrying the latest
//! sequence number for its witness is accepted, so results are ordered by
//! issuance, never by completion.

use super::rules::is_valid_email;
use crate::api::UserDirectory;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Quiet period and per-request bound for remote checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTiming {
    pub debounce: Duration,
    pub timeout: Duration,
}

impl Default for CheckTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Committed answer of the user directory for one email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Available,
    Taken,
    /// Transport error or timeout; re-checked on the next edit or submit
    Failed,
}

/// Read access to committed verdicts, keyed by the exact email text
pub trait VerdictLookup {
    fn verdict(&self, email: &str) -> Option<Verdict>;
}

impl VerdictLookup for HashMap<String, Verdict> {
    fn verdict(&self, email: &str) -> Option<Verdict> {
        self.get(email).copied()
    }
}

/// Result of one debounced check, delivered over the scheduler's channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResolution {
    pub key: Uuid,
    pub seq: u64,
    pub email: String,
    pub verdict: Verdict,
}

pub struct EmailCheckScheduler {
    directory: Arc<dyn UserDirectory>,
    timing: CheckTiming,
    next_seq: u64,
    /// Latest sequence number issued per witness
    latest: HashMap<Uuid, u64>,
    pending: HashMap<Uuid, JoinHandle<()>>,
    verdicts: HashMap<String, Verdict>,
    tx: mpsc::UnboundedSender<CheckResolution>,
}

impl EmailCheckScheduler {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        timing: CheckTiming,
    ) -> (Self, mpsc::UnboundedReceiver<CheckResolution>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            directory,
            timing,
            next_seq: 0,
            latest: HashMap::new(),
            pending: HashMap::new(),
            verdicts: HashMap::new(),
            tx,
        };
        (scheduler, rx)
    }

    /// Restart the debounce timer for a witness with its new email.
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, key: Uuid, email: &str) {
        self.abort_pending(key);
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest.insert(key, seq);

        if !is_valid_email(email) {
            return;
        }
        if matches!(
            self.verdicts.get(email),
            Some(Verdict::Available | Verdict::Taken)
        ) {
            tracing::debug!("Reusing committed verdict for {email}");
            return;
        }

        let directory = Arc::clone(&self.directory);
        let timing = self.timing;
        let tx = self.tx.clone();
        let email = email.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timing.debounce).await;
            let verdict = lookup(directory.as_ref(), &email, timing.timeout).await;
            // Receiver gone means the form was torn down
            let _ = tx.send(CheckResolution {
                key,
                seq,
                email,
                verdict,
            });
        });
        self.pending.insert(key, handle);
    }

    /// Drop pending work for a witness; late results for it become stale
    pub fn cancel(&mut self, key: Uuid) {
        self.abort_pending(key);
        self.latest.remove(&key);
    }

    /// Cancel everything but keep committed verdicts
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
        self.latest.clear();
    }

    /// Commit a resolution if it is the latest issued for its witness
    pub fn accept(&mut self, resolution: &CheckResolution) -> bool {
        if self.latest.get(&resolution.key) != Some(&resolution.seq) {
            tracing::debug!(
                "Discarding stale email check #{} for {}",
                resolution.seq,
                resolution.email
            );
            return false;
        }
        self.pending.remove(&resolution.key);
        self.verdicts
            .insert(resolution.email.clone(), resolution.verdict);
        true
    }

    /// Immediate lookup, bypassing the debounce; commits its verdict
    pub async fn check_now(&mut self, email: &str) -> Verdict {
        let directory = Arc::clone(&self.directory);
        let verdict = lookup(directory.as_ref(), email, self.timing.timeout).await;
        self.verdicts.insert(email.to_string(), verdict);
        verdict
    }

    pub fn is_pending(&self, key: Uuid) -> bool {
        self.pending
            .get(&key)
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort_pending(&mut self, key: Uuid) {
        if let Some(handle) = self.pending.remove(&key) {
            handle.abort();
        }
    }
}

impl VerdictLookup for EmailCheckScheduler {
    fn verdict(&self, email: &str) -> Option<Verdict> {
        self.verdicts.get(email).copied()
    }
}

impl Drop for EmailCheckScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn lookup(directory: &dyn UserDirectory, email: &str, timeout: Duration) -> Verdict {
    match tokio::time::timeout(timeout, directory.count_matches(email)).await {
        Ok(Ok(0)) => Verdict::Available,
        Ok(Ok(total)) => {
            tracing::debug!("{email} matches {total} registered users");
            Verdict::Taken
        }
        Ok(Err(e)) => {
            tracing::warn!("Email check for {email} failed: {e}");
            Verdict::Failed
        }
        Err(_) => {
            tracing::warn!("Email check for {email} timed out after {timeout:?}");
            Verdict::Failed
        }
    }
}
