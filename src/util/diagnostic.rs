//! User-friendly diagnostic messages.
//!
//! Every error shown to a user carries the root cause, any context lines,
//! and where possible a suggested fix.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a component name does not resolve.
    pub const COMPONENT_NOT_FOUND: &str = "Run `roco list` to see available components";

    /// Suggestion when a cached snapshot blocks a write or hides overrides.
    pub const USE_REMAKE: &str = "Pass `--remake` to rebuild and overwrite the cached snapshot";

    /// Suggestion when a component is missing from the relational index.
    pub const NOT_STORED: &str = "Run `roco sync <name>` to add it to the index";

    /// Suggestion when the index database is busy.
    pub const DATABASE_BUSY: &str =
        "Another process may be writing the index; retry once it has finished";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// ANSI SGR code for the label.
    fn ansi(self) -> &'static str {
        match self {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn paint(text: &str, ansi: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", ansi, text)
    } else {
        text.to_string()
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal, optionally with ANSI colors.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!(
            "{}: {}\n",
            paint(self.severity.label(), self.severity.ansi(), color),
            self.message
        );
        if let Some(path) = &self.location {
            out += &format!("  --> {}\n", path.display());
        }
        for line in &self.context {
            out += &format!("  = {}\n", line);
        }
        match self.suggestions.as_slice() {
            [] => {}
            [only] => out += &format!("\n{}: {}\n", paint("help", "1;32", color), only),
            many => {
                out += &format!("\n{}: consider:\n", paint("help", "1;32", color));
                for (i, suggestion) in many.iter().enumerate() {
                    out += &format!("  {}. {}\n", i + 1, suggestion);
                }
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// A declarative component file that failed to parse, with the offending
/// span highlighted.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid component file `{name}`")]
#[diagnostic(
    code(rocolib::library::invalid_definition),
    help("See the declarative file layout in the rocolib documentation")
)]
pub struct DefinitionParseError {
    pub name: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("{message}")]
    pub span: Option<SourceSpan>,
    pub message: String,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("a cached snapshot for `Motor` already exists")
            .with_location("/tmp/cache/Motor.snap.json")
            .with_context("requested without overwrite")
            .with_suggestion(suggestions::USE_REMAKE);

        let output = diag.format(false);
        assert!(output.contains("error: a cached snapshot"));
        assert!(output.contains("--> /tmp/cache/Motor.snap.json"));
        assert!(output.contains("= requested without overwrite"));
        assert!(output.contains("help: Pass `--remake`"));
    }

    #[test]
    fn test_multiple_suggestions_are_numbered() {
        let output = Diagnostic::error("`Ghost` is not in the index")
            .with_suggestion(suggestions::NOT_STORED)
            .with_suggestion(suggestions::COMPONENT_NOT_FOUND)
            .format(false);
        assert!(output.contains("help: consider:"));
        assert!(output.contains("  2. Run `roco list`"));
    }

    #[test]
    fn test_color_wraps_label() {
        let output = Diagnostic::error("boom").format(true);
        assert!(output.starts_with("\x1b[1;31merror\x1b[0m: boom"));
    }

    #[test]
    fn test_warning_has_no_help_section() {
        let output = Diagnostic::warning("2 of 5 components skipped").format(false);
        assert_eq!(output, "warning: 2 of 5 components skipped\n");
    }
}
