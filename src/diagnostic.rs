use std::fmt;

use crate::contract::{FieldViolation, ValidationErrors};

/// Why a generation attempt was rejected; fed back into the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The model's text could not be read as a JSON object.
    NotJson { reason: String },
    /// The text parsed, but the value failed the program contract.
    SchemaMismatch { violations: Vec<FieldViolation> },
}

impl Diagnostic {
    pub fn not_json(reason: impl Into<String>) -> Self {
        Diagnostic::NotJson {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::NotJson { .. } => "NOT_JSON",
            Diagnostic::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
        }
    }
}

impl From<ValidationErrors> for Diagnostic {
    fn from(errors: ValidationErrors) -> Self {
        Diagnostic::SchemaMismatch {
            violations: errors.violations,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NotJson { reason } => write!(f, "{}: {reason}", self.code()),
            Diagnostic::SchemaMismatch { violations } => write!(
                f,
                "{}: {} field violation(s)",
                self.code(),
                violations.len()
            ),
        }
    }
}
