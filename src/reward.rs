/// Reward submission: the external call that grants stars for a qualifying
/// match, and the claim guard that keeps it to one submission per match.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitError {
    #[error("could not reach rewards service: {0}")]
    Transport(String),
    #[error("rewards service answered {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("unreadable rewards response: {0}")]
    Decode(String),
}

/// What the service returned for a successful submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardReceipt {
    pub message: Option<String>,
    pub stars: Option<u32>,
}

/// How a started submission went.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Done(Result<RewardReceipt, SubmitError>),
    /// Running elsewhere; the answer comes back as a [`SubmissionResult`]
    /// carrying this ticket.
    Pending(u64),
}

/// Answer to a [`Submission::Pending`] ticket.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionResult {
    pub ticket: u64,
    pub result: Result<RewardReceipt, SubmitError>,
}

/// Single operation consumed by the mini-games.
pub trait RewardSubmitter {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError>;

    /// Start a submission.  Synchronous submitters finish on the spot.
    fn begin_submission(&mut self) -> Submission {
        Submission::Done(self.submit_match_completion())
    }
}

impl<T: RewardSubmitter + ?Sized> RewardSubmitter for Box<T> {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError> {
        (**self).submit_match_completion()
    }

    fn begin_submission(&mut self) -> Submission {
        (**self).begin_submission()
    }
}

// ── Background submission ────────────────────────────────────────────────────

/// Runs each submission of the wrapped submitter on its own thread so the
/// caller's frame loop keeps going.  Results arrive on the receiver handed
/// out by [`BackgroundSubmitter::new`].
pub struct BackgroundSubmitter<T> {
    inner: Arc<Mutex<T>>,
    results: Sender<SubmissionResult>,
    next_ticket: u64,
}

impl<T: RewardSubmitter + Send + 'static> BackgroundSubmitter<T> {
    pub fn new(inner: T) -> (Self, Receiver<SubmissionResult>) {
        let (tx, rx) = mpsc::channel();
        let submitter = Self {
            inner: Arc::new(Mutex::new(inner)),
            results: tx,
            next_ticket: 1,
        };
        (submitter, rx)
    }
}

fn submit_locked<T: RewardSubmitter>(inner: &Mutex<T>) -> Result<RewardReceipt, SubmitError> {
    let mut guard = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.submit_match_completion()
}

impl<T: RewardSubmitter + Send + 'static> RewardSubmitter for BackgroundSubmitter<T> {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError> {
        submit_locked(&self.inner)
    }

    fn begin_submission(&mut self) -> Submission {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let inner = Arc::clone(&self.inner);
        let results = self.results.clone();
        thread::spawn(move || {
            let result = submit_locked(&inner);
            if results.send(SubmissionResult { ticket, result }).is_err() {
                log::debug!("reward result #{ticket} dropped, nobody listening");
            }
        });
        log::debug!("reward submission #{ticket} started");
        Submission::Pending(ticket)
    }
}

/// Why an evaluation did or did not submit.
#[derive(Clone, Debug, PartialEq)]
pub enum RewardOutcome {
    Granted(RewardReceipt),
    Failed(SubmitError),
    /// Submitted in the background; settle with [`settle_reward`].
    Pending { ticket: u64 },
    AlreadyClaimed,
    BelowThreshold { missing: u32 },
}

/// Evaluate a finished round: submit when `score >= threshold` and nothing
/// was claimed yet.  `claimed` is set before the call and cleared again on
/// failure so a later evaluation can retry.  A background submission leaves
/// the claim standing until [`settle_reward`] sees its result.
pub fn evaluate_reward(
    claimed: &mut bool,
    score: u32,
    threshold: u32,
    submitter: &mut impl RewardSubmitter,
) -> RewardOutcome {
    if score < threshold {
        return RewardOutcome::BelowThreshold {
            missing: threshold - score,
        };
    }
    if *claimed {
        log::info!("reward already claimed, skipping duplicate submission");
        return RewardOutcome::AlreadyClaimed;
    }
    *claimed = true;
    match submitter.begin_submission() {
        Submission::Done(result) => settle_reward(claimed, result),
        Submission::Pending(ticket) => RewardOutcome::Pending { ticket },
    }
}

/// Apply a submission result to the claim flag.
pub fn settle_reward(
    claimed: &mut bool,
    result: Result<RewardReceipt, SubmitError>,
) -> RewardOutcome {
    match result {
        Ok(receipt) => {
            log::info!("reward granted");
            RewardOutcome::Granted(receipt)
        }
        Err(e) => {
            log::warn!("reward submission failed: {e}");
            *claimed = false;
            RewardOutcome::Failed(e)
        }
    }
}
