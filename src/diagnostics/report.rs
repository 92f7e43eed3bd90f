//! Diagnostic report model and rendering

use std::fmt;

const RULE_WIDTH: usize = 60;

/// One printed line of a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Success(String),
    Failure(String),
    Warning(String),
    Info(String),
    Blank,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Success(text) => write!(f, "✓ {text}"),
            Line::Failure(text) => write!(f, "✗ {text}"),
            Line::Warning(text) => write!(f, "⚠ {text}"),
            Line::Info(text) => write!(f, "  {text}"),
            Line::Blank => Ok(()),
        }
    }
}

/// Result of one check, with the lines it produced
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Name shown in the summary
    pub name: &'static str,
    /// Section heading
    pub title: &'static str,
    pub passed: bool,
    pub lines: Vec<Line>,
}

impl CheckOutcome {
    pub fn new(name: &'static str, title: &'static str) -> Self {
        Self {
            name,
            title,
            passed: true,
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Line::Success(text.into()));
    }

    /// Record a failure line and mark the check failed
    pub fn failure(&mut self, text: impl Into<String>) {
        self.passed = false;
        self.push(Line::Failure(text.into()));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Line::Info(text.into()));
    }

    pub fn blank(&mut self) {
        self.push(Line::Blank);
    }

    /// True when any rendered line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.to_string().contains(needle))
    }
}

/// All executed checks plus notes about skipped ones
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    pub checks: Vec<CheckOutcome>,
    pub notes: Vec<Line>,
}

impl DiagnosticReport {
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Process exit status: 0 when every executed check passed, 1 otherwise
    pub fn exit_status(&self) -> u8 {
        if self.passed() { 0 } else { 1 }
    }
}

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

fn header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    rule(f)?;
    writeln!(f, "  {title}")?;
    rule(f)?;
    writeln!(f)
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, "SharePoint Connection Check")?;

        for check in &self.checks {
            header(f, check.title)?;
            for line in &check.lines {
                writeln!(f, "{line}")?;
            }
        }

        for note in &self.notes {
            writeln!(f)?;
            writeln!(f, "{note}")?;
        }

        header(f, "Summary")?;
        for check in &self.checks {
            let line = if check.passed {
                Line::Success(check.name.to_string())
            } else {
                Line::Failure(check.name.to_string())
            };
            writeln!(f, "{line}")?;
        }

        writeln!(f)?;
        rule(f)?;
        if self.passed() {
            writeln!(f, "  All checks passed! The site is reachable with these credentials.")?;
        } else {
            writeln!(f, "  ⚠ Some checks failed. Please fix the issues above.")?;
        }
        rule(f)?;

        writeln!(f)?;
        if self.passed() {
            writeln!(f, "Next steps:")?;
            writeln!(f, "  1. Review the configuration above")?;
            writeln!(f, "  2. Use the same SHP_* variables wherever the site is accessed")?;
            writeln!(f, "  3. Re-run this check after rotating the client secret or certificate")?;
        } else {
            writeln!(f, "Troubleshooting:")?;
            writeln!(f, "  - Confirm the app registration has SharePoint application permissions")?;
            writeln!(f, "  - Confirm admin consent was granted for those permissions")?;
            writeln!(f, "  - Re-run with SHP_LOG_LEVEL=debug for request-level logs")?;
        }

        Ok(())
    }
}
