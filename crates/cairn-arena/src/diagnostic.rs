//! Misuse reporting.
//!
//! Faults never abort: the heap returns an error value and also hands a
//! [`Diagnostic`] to its [`DiagnosticSink`]. The diagnostic carries the
//! source location of the `allocate`/`release` call that triggered it,
//! captured with `#[track_caller]` so callers never pass it explicitly.

use std::fmt;
use std::panic::Location;

use crate::error::HeapError;

/// One reported fault and where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub error: HeapError,
    /// The call site of the heap operation.
    pub location: &'static Location<'static>,
}

impl Diagnostic {
    /// Line of the offending call.
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// Source file of the offending call.
    pub fn file(&self) -> &'static str {
        self.location.file()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ERROR: {}\n ORIGIN: at line {} in file {}",
            self.error,
            self.line(),
            self.file()
        )
    }
}

/// Destination for heap diagnostics.
///
/// Injected when the heap is built. Tests usually collect into a
/// `Vec<Diagnostic>`; programs use [`LogSink`].
pub trait DiagnosticSink {
    /// Receive one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade at `warn` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!(target: "cairn::diagnostic", "{diagnostic}");
    }
}

/// Discards every diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(
    /// The wrapped closure.
    pub F,
);

impl<F: FnMut(&Diagnostic)> DiagnosticSink for FnSink<F> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (self.0)(&diagnostic)
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}
