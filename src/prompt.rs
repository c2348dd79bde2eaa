//! User input and interaction handling.
//!
//! The runner asks every question through [`Prompter`]. Interactive sessions
//! use [`DialoguerPrompter`]; replayed sessions and tests use
//! [`ScriptedPrompter`], which hands out pre-recorded answers in order.

use crate::error::{Error, Result};
use dialoguer::{Input, Select};
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

pub trait Prompter {
    /// Asks the user to pick one of `options` and returns the picked value.
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String>;

    /// Asks the user for free text.
    fn input(&self, prompt: &str) -> Result<String>;
}

pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String> {
        let selection = Select::new()
            .with_prompt(prompt)
            .default(0)
            .items(options)
            .interact()
            .map_err(|e| Error::PromptError(e.to_string()))?;

        Ok(options[selection].clone())
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| Error::PromptError(e.to_string()))
    }
}

/// Replays answers in the order they were recorded.
///
/// Answers are returned as-is, even when they are not among the offered
/// options; it is up to the caller to validate a choice.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: RefCell::new(answers.into_iter().map(Into::into).collect()) }
    }

    /// Loads answers from a JSON or YAML list of strings.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(Error::IoError)?;
        let answers: Vec<String> = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(_) => serde_yaml::from_str(&content).map_err(|e| {
                Error::ConfigError(format!("invalid answers file '{}': {e}", path.display()))
            })?,
        };
        debug!("Loaded {} scripted answer(s) from {}", answers.len(), path.display());
        Ok(Self::new(answers))
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next_answer(&self, prompt: &str) -> Result<String> {
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::PromptError(format!("no answer left for '{prompt}'")))?;
        debug!("{prompt} -> {answer}");
        Ok(answer)
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&self, prompt: &str, _options: &[String]) -> Result<String> {
        self.next_answer(prompt)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }
}
