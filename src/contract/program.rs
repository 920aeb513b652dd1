use serde_json::Value;

use super::schema::{Field, Shape, UnknownKeys};
use super::types::{FieldViolation, ProgramRequest, ProgramSpec, ValidationErrors};

pub const MAX_TEMPLATES: usize = 7;
pub const MAX_BLOCKS_PER_DAY: usize = 6;
pub const MAX_EXERCISES_PER_BLOCK: usize = 10;
pub const MAX_PROGRESSION_RULES: usize = 12;

fn exercise_shape() -> Shape {
    Shape::Object(vec![
        Field::required("name", Shape::text(1, 80)),
        Field::required("sets", Shape::integer(1, 10)),
        Field::required("reps", Shape::text(1, 20)),
        Field::required("rir", Shape::integer(0, 5)),
        Field::required("restSec", Shape::integer(0, 600)),
        Field::required("notes", Shape::text(0, 300)),
    ])
}

fn block_shape() -> Shape {
    Shape::Object(vec![
        Field::required("blockName", Shape::text(1, 60)),
        Field::required(
            "exercises",
            Shape::array(exercise_shape(), 1, MAX_EXERCISES_PER_BLOCK),
        ),
    ])
}

fn template_shape() -> Shape {
    Shape::Object(vec![
        Field::required("dayName", Shape::text(1, 60)),
        Field::required("focus", Shape::text(1, 120)),
        Field::required("blocks", Shape::array(block_shape(), 1, MAX_BLOCKS_PER_DAY)),
    ])
}

/// Canonical ProgramSpec definition.
pub fn program_shape() -> Shape {
    Shape::Object(vec![
        Field::required("planName", Shape::text(1, 120)),
        Field::required("daysPerWeek", Shape::integer(1, MAX_TEMPLATES as i64)),
        Field::required("split", Shape::text(1, 60)),
        Field::required(
            "progression",
            Shape::Object(vec![
                Field::required("overview", Shape::text(1, 600)),
                Field::required(
                    "rules",
                    Shape::array(Shape::text(1, 300), 1, MAX_PROGRESSION_RULES),
                ),
            ]),
        ),
        Field::required("templates", Shape::array(template_shape(), 1, MAX_TEMPLATES)),
    ])
}

/// The schema declared to the model, derived from [`program_shape`].
pub fn program_json_schema() -> Value {
    program_shape().to_json_schema()
}

/// Output contract for model candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramContract {
    unknown_keys: UnknownKeys,
    expected_days: Option<u8>,
}

impl ProgramContract {
    pub fn strict() -> Self {
        Self {
            unknown_keys: UnknownKeys::Reject,
            expected_days: None,
        }
    }

    pub fn loose() -> Self {
        Self {
            unknown_keys: UnknownKeys::Ignore,
            expected_days: None,
        }
    }

    pub fn with_strict(strict: bool) -> Self {
        if strict { Self::strict() } else { Self::loose() }
    }

    /// Bind the contract to the request so `daysPerWeek` must match it.
    pub fn for_request(self, request: &ProgramRequest) -> Self {
        self.expecting_days(request.days_per_week)
    }

    /// Require `daysPerWeek` (and so the template count) to equal `days`.
    pub fn expecting_days(mut self, days: u8) -> Self {
        self.expected_days = Some(days);
        self
    }

    pub fn validate(&self, raw: &Value) -> Result<ProgramSpec, ValidationErrors> {
        let shape = program_shape();
        let mut value = raw.clone();
        shape.normalize(&mut value);

        let mut violations = Vec::new();
        shape.check(&value, "", self.unknown_keys, &mut violations);
        self.check_consistency(&value, &mut violations);

        let errors = ValidationErrors::new(violations);
        if !errors.is_empty() {
            return Err(errors);
        }

        serde_json::from_value(value)
            .map_err(|err| ValidationErrors::single("", format!("malformed program: {err}")))
    }

    // Cross-field rules the declared schema cannot express.
    fn check_consistency(&self, raw: &Value, violations: &mut Vec<FieldViolation>) {
        let days = raw.get("daysPerWeek").and_then(Value::as_i64);

        if let (Some(expected), Some(days)) = (self.expected_days, days) {
            if days != i64::from(expected) {
                violations.push(FieldViolation::new(
                    "daysPerWeek",
                    format!("must equal the requested {expected} days per week, found {days}"),
                ));
            }
        }

        let templates = raw.get("templates").and_then(Value::as_array);
        if let (Some(days), Some(templates)) = (days, templates) {
            if templates.len() as i64 != days {
                violations.push(FieldViolation::new(
                    "templates",
                    format!(
                        "must contain exactly one template per training day ({days}), found {}",
                        templates.len()
                    ),
                ));
            }
        }
    }
}

impl Default for ProgramContract {
    fn default() -> Self {
        Self::strict()
    }
}

