// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Operator confirmation.
//!
//! Anything that needs a yes or no from the operator goes through
//! [`Confirmer`]. The interactive implementation blocks on standard input
//! until a line is supplied. Non-interactive runs use [`AssumeAnswer`].
//!
//! The interactive prompt needs a terminal. When standard input is piped,
//! prompting fails with [`Error::NoTerminal`] instead of reading the pipe.

use inquire::{Confirm, InquireError};
use tracing::info;

/// Ask the operator a yes or no question.
pub trait Confirmer {
    /// Ask question, and report whether the answer was yes.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(self(prompt))
    }
}

/// Interactive confirmation on the terminal.
///
/// Accepts `y` or `yes` in any case. Anything else, or just pressing enter,
/// means no. Pressing escape also means no.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquireConfirmer;

impl InquireConfirmer {
    /// Construct new interactive confirmer.
    pub fn new() -> Self {
        Self
    }
}

impl Confirmer for InquireConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        settle(
            Confirm::new(prompt)
                .with_default(false)
                .with_parser(&|answer: &str| Ok(parse_answer(answer)))
                .prompt(),
        )
    }
}

/// Turn raw prompt result into an answer.
///
/// Escape means no. Interruption and a missing terminal are errors.
fn settle(result: std::result::Result<bool, InquireError>) -> Result<bool> {
    match result {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled) => Ok(false),
        Err(InquireError::OperationInterrupted) => Err(Error::Interrupted),
        Err(InquireError::NotTTY) => Err(Error::NoTerminal),
        Err(error) => Err(Error::Prompt(error)),
    }
}

/// Fixed answer for every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssumeAnswer(pub bool);

impl Confirmer for AssumeAnswer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let answer = if self.0 { "yes" } else { "no" };
        info!("{prompt} {answer} (non-interactive)");
        Ok(self.0)
    }
}

/// Interpret a typed answer.
///
/// Only `y` and `yes`, ignoring case and surrounding whitespace, mean yes.
pub fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Confirmation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operator interrupted the prompt.
    #[error("prompt interrupted by operator")]
    Interrupted,

    /// Standard input is not a terminal.
    #[error("cannot prompt without a terminal, pass --yes or --no instead")]
    NoTerminal,

    /// Prompt cannot be shown or read.
    #[error(transparent)]
    Prompt(#[from] InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
