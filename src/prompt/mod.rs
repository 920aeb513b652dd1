//! Builds the system and user instructions sent to the model.
//!
//! Composition is pure: identical requests and diagnostics always yield an
//! identical [`PromptPayload`].

mod defaults;

use serde::Serialize;
use serde_json::Value;

use crate::contract::{ProgramRequest, program_json_schema, program_shape};
use crate::diagnostic::Diagnostic;

pub use defaults::{DomainDefaults, domain_defaults};

/// Upper bound on violations quoted back to the model in one retry.
pub const MAX_QUOTED_VIOLATIONS: usize = 20;

const SYSTEM_PROMPT_HEADER: &str = r#"You are an expert strength and hypertrophy coach who designs structured training programs.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object that is a ProgramSpec.
- No prose, no markdown, no code fences, no comments, no trailing text.
- Do not add keys that are not listed below. No nulls. No trailing commas.
- Every exercise MUST include "notes" (use "" if nothing to add).
- "templates" MUST contain exactly one entry per training day, so its length equals "daysPerWeek".
- "sets", "rir" and "restSec" MUST be integers; "reps" MUST be a string such as "6-10".

PROGRAMMING RULES
- Respect the caller's constraints exactly (e.g. "no barbell back squat" means never program it).
- Only use exercises that the stated equipment allows.
- Stay within the provided defaults for exercise count, reps, RIR, rest and weekly volume.

ProgramSpec SHAPE
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
    /// Declared output schema for the model's structured-output mode.
    pub schema: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload<'a> {
    task: &'static str,
    input: &'a ProgramRequest,
    defaults: DomainDefaults,
    constraints_reminder: String,
}

pub fn system_prompt() -> String {
    format!("{SYSTEM_PROMPT_HEADER}{}\n", program_shape().describe())
}

/// Compose the prompt for one attempt; `prior_failure` carries the defect
/// found in the previous attempt, if any.
pub fn compose_prompt(request: &ProgramRequest, prior_failure: Option<&Diagnostic>) -> PromptPayload {
    let constraints_reminder = if request.constraints.is_empty() {
        "No extra constraints were given.".to_string()
    } else {
        format!("Respect these constraints exactly: {}", request.constraints)
    };

    let payload = UserPayload {
        task: "Generate a ProgramSpec JSON training program",
        input: request,
        defaults: domain_defaults(request),
        constraints_reminder,
    };

    let mut user = serde_json::to_string(&payload).unwrap_or_default();
    if let Some(diagnostic) = prior_failure {
        user.push_str("\n\n");
        user.push_str(&corrective_instruction(diagnostic));
    }

    PromptPayload {
        system: system_prompt(),
        user,
        schema: program_json_schema(),
    }
}

/// Terse correction naming the defect category of the previous attempt.
pub fn corrective_instruction(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::NotJson { reason } => format!(
            "IMPORTANT: your previous response was rejected ({}): it was not valid JSON ({reason}). Return ONLY one JSON object for ProgramSpec, with no markdown or commentary.",
            diagnostic.code()
        ),
        Diagnostic::SchemaMismatch { violations } => {
            let mut lines = violations
                .iter()
                .take(MAX_QUOTED_VIOLATIONS)
                .map(|violation| format!("- {violation}"))
                .collect::<Vec<_>>();
            if violations.len() > MAX_QUOTED_VIOLATIONS {
                lines.push(format!(
                    "- ...and {} more",
                    violations.len() - MAX_QUOTED_VIOLATIONS
                ));
            }
            format!(
                "IMPORTANT: your previous response was rejected ({}): it did not match ProgramSpec. Fix every problem below and return ONLY the corrected JSON object.\n{}",
                diagnostic.code(),
                lines.join("\n")
            )
        }
    }
}
