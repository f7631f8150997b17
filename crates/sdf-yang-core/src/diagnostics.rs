//! Unified diagnostics for the translation run.
//!
//! A single diagnostic type is used across type translation, structural
//! translation, and reference resolution. Recoverable losses are collected
//! here (and mirrored to `tracing`) rather than aborting: a partial schema
//! translation is still useful output.

use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Diagnostic codes for categorizing translation issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // =========================================================================
    // Malformed input facets - translation continues with the facet omitted
    // =========================================================================
    MalformedRange,
    MalformedPattern,
    MalformedFractionDigits,
    ClampedBound,

    // =========================================================================
    // Reference resolution
    // =========================================================================
    UnresolvedNodeRef,
    UnresolvedTypedefRef,
    UnresolvedTypeRef,
    UnresolvedIdentityRef,
    UnresolvedAugment,

    // =========================================================================
    // Structural translation
    // =========================================================================
    UnsupportedConstruct,
    CapacityExceeded,
}

/// A single recoverable translation issue
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Schema path of the element the issue was found on, when known
    pub path: Option<String>,
}

impl Diagnostic {
    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the schema path the issue was found on
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

/// Collecting sink for diagnostics produced during one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, mirroring it to `tracing` at the matching level.
    pub fn push(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                tracing::error!(code = ?diag.code, path = ?diag.path, "{}", diag.message)
            }
            Severity::Warning => {
                tracing::warn!(code = ?diag.code, path = ?diag.path, "{}", diag.message)
            }
            Severity::Info => {
                tracing::info!(code = ?diag.code, path = ?diag.path, "{}", diag.message)
            }
        }
        self.items.push(diag);
    }

    pub fn warn(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message));
    }

    pub fn warn_at(&mut self, code: DiagnosticCode, path: &str, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message).at(path));
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    /// End-of-run summary: one line per diagnostic code that occurred.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        let codes = [
            DiagnosticCode::MalformedRange,
            DiagnosticCode::MalformedPattern,
            DiagnosticCode::MalformedFractionDigits,
            DiagnosticCode::ClampedBound,
            DiagnosticCode::UnresolvedNodeRef,
            DiagnosticCode::UnresolvedTypedefRef,
            DiagnosticCode::UnresolvedTypeRef,
            DiagnosticCode::UnresolvedIdentityRef,
            DiagnosticCode::UnresolvedAugment,
            DiagnosticCode::UnsupportedConstruct,
            DiagnosticCode::CapacityExceeded,
        ];
        for code in codes {
            let n = self.count_of(code);
            if n > 0 {
                lines.push(format!("{:?}: {}", code, n));
            }
        }
        lines.join("\n")
    }
}
