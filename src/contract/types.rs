use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Caller input for a single program-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRequest {
    pub days_per_week: u8,
    pub minutes_per_session: u16,
    pub split_preference: SplitPreference,
    pub goal: Goal,
    pub experience: Experience,
    pub equipment: Equipment,
    #[serde(default)]
    pub constraints: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitPreference {
    FullBody,
    UpperLower,
    PushPullLegs,
    Custom,
}

impl SplitPreference {
    pub const OPTIONS: &'static [&'static str] =
        &["FULL_BODY", "UPPER_LOWER", "PUSH_PULL_LEGS", "CUSTOM"];

    pub fn label(self) -> &'static str {
        match self {
            SplitPreference::FullBody => "full body",
            SplitPreference::UpperLower => "upper/lower",
            SplitPreference::PushPullLegs => "push/pull/legs",
            SplitPreference::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    Hypertrophy,
    Strength,
    Recomposition,
}

impl Goal {
    pub const OPTIONS: &'static [&'static str] = &["HYPERTROPHY", "STRENGTH", "RECOMPOSITION"];

    pub fn label(self) -> &'static str {
        match self {
            Goal::Hypertrophy => "hypertrophy",
            Goal::Strength => "strength",
            Goal::Recomposition => "recomposition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

impl Experience {
    pub const OPTIONS: &'static [&'static str] = &["BEGINNER", "INTERMEDIATE", "ADVANCED"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Equipment {
    Gym,
    Home,
    Limited,
}

impl Equipment {
    pub const OPTIONS: &'static [&'static str] = &["GYM", "HOME", "LIMITED"];
}

/// Canonical training-program document returned on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSpec {
    pub plan_name: String,
    pub days_per_week: u8,
    pub split: String,
    pub progression: Progression,
    pub templates: Vec<DayTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub overview: String,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTemplate {
    pub day_name: String,
    pub focus: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_name: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub sets: u8,
    pub reps: String,
    pub rir: u8,
    pub rest_sec: u16,
    pub notes: String,
}

impl ProgramSpec {
    pub fn exercise_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|template| &template.blocks)
            .map(|block| block.exercises.len())
            .sum()
    }
}

/// A single contract violation, addressed by field path
/// (e.g. `templates[0].blocks[1].exercises[2].sets`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every violation found while checking one value against a contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(path, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[cfg(test)]
    pub fn mentions(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    /// Response layout: value-level problems under `formErrors`, field
    /// problems grouped by path under `fieldErrors`.
    pub fn flatten(&self) -> Value {
        let mut form_errors = Vec::new();
        let mut field_errors: Map<String, Value> = Map::new();

        for violation in &self.violations {
            if violation.path.is_empty() {
                form_errors.push(Value::String(violation.message.clone()));
                continue;
            }
            let entry = field_errors
                .entry(violation.path.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(messages) = entry {
                messages.push(Value::String(violation.message.clone()));
            }
        }

        json!({
            "formErrors": form_errors,
            "fieldErrors": field_errors,
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} violation(s): {}", self.violations.len(), rendered)
    }
}

impl std::error::Error for ValidationErrors {}
