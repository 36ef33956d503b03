//! Structured diagnostic records and message templates.
//!
//! Diagnostics are plain data: `(file, start, length, code, message)` plus
//! optional related locations. The core never formats or localizes beyond
//! the `{0}`-style template substitution in [`format_message`].

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// A message template with a stable numeric code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Message templates emitted by the binder and resolver.
pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage};

    pub const DUPLICATE_IDENTIFIER: DiagnosticMessage = DiagnosticMessage {
        code: 2300,
        category: DiagnosticCategory::Error,
        message: "Duplicate identifier '{0}'.",
    };

    pub const GETTER_ALREADY_DECLARED: DiagnosticMessage = DiagnosticMessage {
        code: 2301,
        category: DiagnosticCategory::Error,
        message: "Getter '{0}' already declared.",
    };

    pub const SETTER_ALREADY_DECLARED: DiagnosticMessage = DiagnosticMessage {
        code: 2302,
        category: DiagnosticCategory::Error,
        message: "Setter '{0}' already declared.",
    };

    pub const UNRESOLVED_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: 2304,
        category: DiagnosticCategory::Error,
        message: "Cannot find type '{0}'.",
    };

    pub const CONSTRUCTOR_IMPLEMENTATION_EXPECTED: DiagnosticMessage = DiagnosticMessage {
        code: 2390,
        category: DiagnosticCategory::Error,
        message: "Constructor implementation is missing.",
    };

    pub const FUNCTION_IMPLEMENTATION_EXPECTED: DiagnosticMessage = DiagnosticMessage {
        code: 2391,
        category: DiagnosticCategory::Error,
        message: "Function implementation is missing or not immediately following the declaration.",
    };

    pub const MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS: DiagnosticMessage = DiagnosticMessage {
        code: 2392,
        category: DiagnosticCategory::Error,
        message: "Multiple constructor implementations are not allowed.",
    };

    pub const ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS: DiagnosticMessage = DiagnosticMessage {
        code: 1094,
        category: DiagnosticCategory::Error,
        message: "An accessor cannot have type parameters.",
    };

    pub const ALL: &[DiagnosticMessage] = &[
        DUPLICATE_IDENTIFIER,
        GETTER_ALREADY_DECLARED,
        SETTER_ALREADY_DECLARED,
        UNRESOLVED_TYPE,
        CONSTRUCTOR_IMPLEMENTATION_EXPECTED,
        FUNCTION_IMPLEMENTATION_EXPECTED,
        MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS,
        ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
            related_information: Vec::new(),
        }
    }

    /// Build a diagnostic from a message template and its arguments.
    pub fn from_message(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            category: message.category,
            message_text: format_message(message.message, args),
            code: message.code,
            file: file.into(),
            start,
            length,
            related_information: Vec::new(),
        }
    }

    pub fn with_related(
        mut self,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            code: 0,
            file: file.into(),
            start,
            length,
            message_text: message.into(),
        });
        self
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    diagnostic_messages::ALL
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
