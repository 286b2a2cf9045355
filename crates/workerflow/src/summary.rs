//! Run summary
//!
//! Outcomes are recorded as the run progresses and printed once at the end,
//! skipped first, then succeeded, then failed. Any failure makes the process
//! exit non-zero.

use colored::Colorize;
use std::io::{self, Write};
use std::process::ExitCode;

const SKIPPED: &str = "[SKIPPED]";
const SUCCEED: &str = "[SUCCEED]";
const FAILED: &str = "[FAILED] ";

/// Classification of one (flavor, registry) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Succeeded,
    Failed(String),
}

/// Outcomes collected during a run, in recording order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    skipped: Vec<String>,
    succeeded: Vec<String>,
    failed: Vec<String>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, outcome: Outcome) {
        let label = label.into();
        match outcome {
            Outcome::Skipped => self.skipped.push(label),
            Outcome::Succeeded => self.succeeded.push(label),
            Outcome::Failed(reason) => self.failed.push(format!("{} -> {}", label, reason)),
        }
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty() && self.succeeded.is_empty() && self.failed.is_empty()
    }

    /// Report lines without color.
    pub fn lines(&self) -> Vec<String> {
        self.entries()
            .map(|(prefix, entry)| format!("{} {}", prefix, entry))
            .collect()
    }

    fn entries(&self) -> impl Iterator<Item = (&'static str, &String)> {
        self.skipped
            .iter()
            .map(|e| (SKIPPED, e))
            .chain(self.succeeded.iter().map(|e| (SUCCEED, e)))
            .chain(self.failed.iter().map(|e| (FAILED, e)))
    }

    /// Flush pending diagnostics, then print the report to stdout.
    pub fn print(&self) -> io::Result<()> {
        io::stderr().flush()?;
        io::stdout().flush()?;

        let mut out = io::stdout().lock();
        for (prefix, entry) in self.entries() {
            let prefix = match prefix {
                SKIPPED => prefix.yellow(),
                SUCCEED => prefix.green(),
                _ => prefix.red().bold(),
            };
            writeln!(out, "{} {}", prefix, entry)?;
        }
        out.flush()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.has_failures() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_ordered_by_bucket() {
        let mut summary = Summary::new();
        summary.record("Whois (harbor@h)", Outcome::Failed("push of tag devel failed".into()));
        summary.record("DNS_Lookup (harbor@h)", Outcome::Succeeded);
        summary.record("Whois (dockerhub@d)", Outcome::Skipped);

        assert_eq!(
            summary.lines(),
            vec![
                "[SKIPPED] Whois (dockerhub@d)",
                "[SUCCEED] DNS_Lookup (harbor@h)",
                "[FAILED]  Whois (harbor@h) -> push of tag devel failed",
            ]
        );
    }

    #[test]
    fn test_exit_code_follows_failures() {
        let mut summary = Summary::new();
        summary.record("a (r)", Outcome::Skipped);
        summary.record("b (r)", Outcome::Succeeded);
        assert_eq!(summary.exit_code(), ExitCode::SUCCESS);
        assert!(!summary.has_failures());

        summary.record("c (r)", Outcome::Failed("boom".into()));
        assert_eq!(summary.exit_code(), ExitCode::FAILURE);
    }
}
