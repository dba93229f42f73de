//! Accumulator for the non-fatal findings of one elaboration.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::Mutex;

/// Collects warnings and notes emitted while a circuit is elaborated.
///
/// Fatal problems are returned as errors instead of being emitted here, so a
/// sink normally holds warnings only. Emission order is preserved. The sink
/// is `Sync` so a completed elaboration can hand it to another thread.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        log::debug!("{}[{}]: {}", diag.severity, diag.code, diag.message);
        self.lock().push(diag);
    }

    /// Number of diagnostics of `severity` currently held.
    pub fn count(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|d| d.severity == severity).count()
    }

    /// Number of warnings currently held.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// A snapshot of the accumulated diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics.lock().unwrap_or_else(|e| e.into_inner())
    }
}
