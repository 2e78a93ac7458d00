#![allow(dead_code)]

use reconquest_games::reward::{
    RewardReceipt, RewardSubmitter, SubmitError, Submission, SubmissionResult,
};

/// Counts submissions and fails the first `failures_left` of them.
pub struct RecordingSubmitter {
    pub calls: usize,
    failures_left: usize,
}

impl RecordingSubmitter {
    pub fn succeeding() -> Self {
        Self { calls: 0, failures_left: 0 }
    }

    pub fn failing(times: usize) -> Self {
        Self { calls: 0, failures_left: times }
    }
}

impl RewardSubmitter for RecordingSubmitter {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError> {
        self.calls += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SubmitError::Transport("connection refused".to_string()));
        }
        Ok(RewardReceipt {
            message: Some("stars granted".to_string()),
            stars: Some(15),
        })
    }
}

/// Hands out tickets instead of answering; the test settles them by hand.
pub struct DeferredSubmitter {
    pub tickets: Vec<u64>,
}

impl DeferredSubmitter {
    pub fn new() -> Self {
        Self { tickets: Vec::new() }
    }
}

impl RewardSubmitter for DeferredSubmitter {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError> {
        Err(SubmitError::Transport("only background submissions".to_string()))
    }

    fn begin_submission(&mut self) -> Submission {
        let ticket = self.tickets.len() as u64 + 1;
        self.tickets.push(ticket);
        Submission::Pending(ticket)
    }
}

pub fn granted(ticket: u64) -> SubmissionResult {
    SubmissionResult {
        ticket,
        result: Ok(RewardReceipt {
            message: None,
            stars: Some(15),
        }),
    }
}

pub fn refused(ticket: u64) -> SubmissionResult {
    SubmissionResult {
        ticket,
        result: Err(SubmitError::Transport("timed out".to_string())),
    }
}
