//! Trivia mini-game: a short round of multiple-choice questions drawn at
//! random from a bank.  Enough correct answers earns the same reward as a
//! good catch-game match.

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reward::{
    evaluate_reward, settle_reward, RewardOutcome, RewardSubmitter, SubmissionResult,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizRules {
    pub questions_per_round: usize,
    /// Correct answers needed for the reward.
    pub pass_mark: usize,
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            questions_per_round: 5,
            pass_mark: 3,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("question bank is empty")]
    EmptyBank,
    #[error("question {index} has fewer than two options")]
    TooFewOptions { index: usize },
    #[error("question {index} marks option {correct} correct but has {options} options")]
    BadAnswerKey {
        index: usize,
        correct: usize,
        options: usize,
    },
    #[error("option {option} out of range, question has {options}")]
    OptionOutOfRange { option: usize, options: usize },
    #[error("no question is waiting for an answer")]
    NotAsking,
    #[error("current question has not been answered yet")]
    Unanswered,
    #[error("could not read question bank: {0}")]
    Io(String),
    #[error("malformed question bank: {0}")]
    Parse(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    /// Showing question `index`; `selected` locks once an answer is given.
    Asking { index: usize, selected: Option<usize> },
    Finished,
}

pub fn default_bank() -> Vec<Question> {
    let q = |prompt: &str, options: [&str; 4], correct: usize| Question {
        prompt: prompt.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct,
    };
    vec![
        q(
            "What was the first movie we watched together?",
            ["Inception", "La La Land", "Interstellar", "Avatar"],
            1,
        ),
        q(
            "Which song did I dedicate to you?",
            ["Perfect", "Thinking Out Loud", "All of Me", "Stay With Me"],
            0,
        ),
        q(
            "Which of your favourite dishes can I cook?",
            ["Homemade pizza", "Pasta carbonara", "Tacos", "Sushi"],
            1,
        ),
        q(
            "Where was our first date?",
            ["Downtown café", "The park", "The cinema", "Italian restaurant"],
            2,
        ),
        q(
            "What did I give you for your birthday?",
            ["A book", "A plush toy", "A necklace", "Chocolates"],
            2,
        ),
    ]
}

pub fn validate_bank(bank: &[Question]) -> Result<(), QuizError> {
    if bank.is_empty() {
        return Err(QuizError::EmptyBank);
    }
    for (index, q) in bank.iter().enumerate() {
        if q.options.len() < 2 {
            return Err(QuizError::TooFewOptions { index });
        }
        if q.correct >= q.options.len() {
            return Err(QuizError::BadAnswerKey {
                index,
                correct: q.correct,
                options: q.options.len(),
            });
        }
    }
    Ok(())
}

/// Read a JSON array of questions.
pub fn load_bank(path: &Path) -> Result<Vec<Question>, QuizError> {
    let text = fs::read_to_string(path).map_err(|e| QuizError::Io(e.to_string()))?;
    let bank: Vec<Question> =
        serde_json::from_str(&text).map_err(|e| QuizError::Parse(e.to_string()))?;
    validate_bank(&bank)?;
    Ok(bank)
}

pub struct TriviaQuiz<S, R> {
    bank: Vec<Question>,
    rules: QuizRules,
    round: Vec<Question>,
    phase: QuizPhase,
    answers: Vec<bool>,
    reward_claimed: bool,
    last_reward: Option<RewardOutcome>,
    submitter: S,
    rng: R,
}

impl<S: RewardSubmitter, R: Rng> TriviaQuiz<S, R> {
    pub fn new(
        bank: Vec<Question>,
        rules: QuizRules,
        submitter: S,
        rng: R,
    ) -> Result<Self, QuizError> {
        validate_bank(&bank)?;
        Ok(Self {
            bank,
            rules,
            round: Vec::new(),
            phase: QuizPhase::Idle,
            answers: Vec::new(),
            reward_claimed: false,
            last_reward: None,
            submitter,
            rng,
        })
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    pub fn round_len(&self) -> usize {
        self.round.len()
    }

    pub fn current(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::Asking { index, .. } => self.round.get(index),
            _ => None,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|&&ok| ok).count()
    }

    pub fn passed(&self) -> bool {
        self.phase == QuizPhase::Finished && self.correct_count() >= self.rules.pass_mark
    }

    pub fn last_reward(&self) -> Option<&RewardOutcome> {
        self.last_reward.as_ref()
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Draw a fresh round and show its first question.
    pub fn start(&mut self) {
        let mut round = self.bank.clone();
        round.shuffle(&mut self.rng);
        round.truncate(self.rules.questions_per_round.max(1));
        self.round = round;
        self.answers.clear();
        self.reward_claimed = false;
        self.last_reward = None;
        self.phase = QuizPhase::Asking {
            index: 0,
            selected: None,
        };
        log::info!("quiz round started with {} questions", self.round.len());
    }

    /// Answer the current question.  Returns whether it was right.  A
    /// question accepts one answer; repeats are rejected.
    pub fn answer(&mut self, option: usize) -> Result<bool, QuizError> {
        let QuizPhase::Asking {
            index,
            selected: None,
        } = self.phase
        else {
            return Err(QuizError::NotAsking);
        };
        let question = &self.round[index];
        if option >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                option,
                options: question.options.len(),
            });
        }
        let correct = option == question.correct;
        self.answers.push(correct);
        self.phase = QuizPhase::Asking {
            index,
            selected: Some(option),
        };
        Ok(correct)
    }

    /// Move past an answered question, finishing the round after the last.
    pub fn next(&mut self) -> Result<(), QuizError> {
        match self.phase {
            QuizPhase::Asking { selected: None, .. } => Err(QuizError::Unanswered),
            QuizPhase::Asking { index, .. } if index + 1 < self.round.len() => {
                self.phase = QuizPhase::Asking {
                    index: index + 1,
                    selected: None,
                };
                Ok(())
            }
            QuizPhase::Asking { .. } => {
                self.finish();
                Ok(())
            }
            _ => Err(QuizError::NotAsking),
        }
    }

    /// Re-run reward evaluation for a finished round, e.g. after a failed
    /// submission.
    pub fn retry_reward(&mut self) -> Option<&RewardOutcome> {
        if self.phase != QuizPhase::Finished {
            return None;
        }
        if !matches!(self.last_reward, Some(RewardOutcome::Pending { .. })) {
            self.evaluate();
        }
        self.last_reward.as_ref()
    }

    /// Record the result of a background submission.  Results for a round
    /// that was restarted or reset are dropped.
    pub fn settle_reward(&mut self, done: SubmissionResult) -> Option<&RewardOutcome> {
        match self.last_reward {
            Some(RewardOutcome::Pending { ticket }) if ticket == done.ticket => {
                self.last_reward = Some(settle_reward(&mut self.reward_claimed, done.result));
            }
            _ => log::debug!("quiz reward result #{} is stale", done.ticket),
        }
        self.last_reward.as_ref()
    }

    pub fn reset(&mut self) {
        self.round.clear();
        self.answers.clear();
        self.reward_claimed = false;
        self.last_reward = None;
        self.phase = QuizPhase::Idle;
    }

    fn finish(&mut self) {
        self.phase = QuizPhase::Finished;
        log::info!(
            "quiz round finished: {}/{} correct",
            self.correct_count(),
            self.round.len()
        );
        self.evaluate();
    }

    fn evaluate(&mut self) {
        let correct = self.correct_count() as u32;
        let outcome = evaluate_reward(
            &mut self.reward_claimed,
            correct,
            self.rules.pass_mark as u32,
            &mut self.submitter,
        );
        self.last_reward = Some(outcome);
    }
}
