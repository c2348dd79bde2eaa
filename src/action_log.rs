//! Append-only record of the side effects of a template run.
//!
//! Each entry reads `<verb>  <description>` with exactly two spaces between
//! the verb and the description. Consumers match on this format verbatim.

use log::info;
use std::fmt;

/// What kind of side effect an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVerb {
    /// An external command was run
    Executing,
    /// A file was written
    File,
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionVerb::Executing => write!(f, "executing"),
            ActionVerb::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionLog {
    entries: Vec<String>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verb: ActionVerb, description: impl AsRef<str>) {
        let entry = format!("{verb}  {}", description.as_ref());
        info!("{entry}");
        self.entries.push(entry);
    }

    pub fn executing(&mut self, command: impl AsRef<str>) {
        self.record(ActionVerb::Executing, command);
    }

    pub fn file(&mut self, path: impl AsRef<str>) {
        self.record(ActionVerb::File, path);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whole log, one entry per line, in append order.
    pub fn full_log(&self) -> String {
        self.entries.join("\n")
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.iter().position(|e| e == entry)
    }
}

impl fmt::Display for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
