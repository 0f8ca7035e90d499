//! # Variable Prompting
//!
//! Resolution asks the user for values through a [`Prompter`], so it can run
//! against a real terminal or a scripted answer queue in tests.
//!
//! ```text
//! Production:  resolve ──▶ TerminalPrompter ──▶ stderr prompt, stdin line
//! Testing:     resolve ──▶ ScriptedPrompter ──▶ VecDeque<String>
//! ```

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of answers for variable prompts
pub trait Prompter {
    /// Ask for `label`. `current` is the stored value offered as default; an
    /// empty answer means "keep it". Returns the trimmed answer.
    fn prompt(&mut self, label: &str, current: Option<&str>) -> Result<String>;
}

/// Prompts on stderr and reads one line from stdin per question
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, label: &str, current: Option<&str>) -> Result<String> {
        let mut stderr = io::stderr();
        let written = match current {
            Some(value) if !value.is_empty() => write!(stderr, "{label} [{value}]: "),
            _ => write!(stderr, "{label}: "),
        };
        written.and_then(|_| stderr.flush()).map_err(Error::Input)?;

        if !atty::is(atty::Stream::Stdin) {
            tracing::debug!("stdin is not a terminal, reading answer for '{}' from pipe", label);
        }

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map_err(Error::Input)?;
        Ok(line.trim().to_string())
    }
}

/// Answers prompts from a fixed queue and records what was asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Labels of every prompt issued so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, label: &str, _current: Option<&str>) -> Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .map(|answer| answer.trim().to_string())
            .ok_or_else(|| {
                Error::Input(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("no scripted answer for '{label}'"),
                ))
            })
    }
}
