//! Shared infrastructure for the tsmeta pipeline.
//!
//! The binder and resolver never use exception-style control flow for
//! expected error conditions; they emit structured [`Diagnostic`] records
//! and keep going, so a single pass surfaces every problem in the input.

pub mod diagnostics;

pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticRelatedInformation,
    diagnostic_messages, format_message,
};
