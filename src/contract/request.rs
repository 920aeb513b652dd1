use serde_json::Value;

use super::schema::{Field, Shape, UnknownKeys};
use super::types::{
    Equipment, Experience, Goal, ProgramRequest, SplitPreference, ValidationErrors,
};

pub const MIN_DAYS_PER_WEEK: i64 = 1;
pub const MAX_DAYS_PER_WEEK: i64 = 7;
pub const MIN_MINUTES_PER_SESSION: i64 = 20;
pub const MAX_MINUTES_PER_SESSION: i64 = 180;
pub const MAX_CONSTRAINTS_LEN: usize = 500;

pub fn request_shape() -> Shape {
    Shape::Object(vec![
        Field::required(
            "daysPerWeek",
            Shape::integer(MIN_DAYS_PER_WEEK, MAX_DAYS_PER_WEEK),
        ),
        Field::required(
            "minutesPerSession",
            Shape::integer(MIN_MINUTES_PER_SESSION, MAX_MINUTES_PER_SESSION),
        ),
        Field::required("splitPreference", Shape::Choice(SplitPreference::OPTIONS)),
        Field::required("goal", Shape::Choice(Goal::OPTIONS)),
        Field::required("experience", Shape::Choice(Experience::OPTIONS)),
        Field::required("equipment", Shape::Choice(Equipment::OPTIONS)),
        Field::optional("constraints", Shape::text(0, MAX_CONSTRAINTS_LEN)),
    ])
}

/// Check an untyped request body and convert it into a [`ProgramRequest`].
///
/// Unknown fields are ignored. On failure every violated field is reported.
pub fn validate_request(raw: &Value) -> Result<ProgramRequest, ValidationErrors> {
    let shape = request_shape();
    let mut value = raw.clone();
    shape.normalize(&mut value);

    let mut violations = Vec::new();
    shape.check(&value, "", UnknownKeys::Ignore, &mut violations);
    let errors = ValidationErrors::new(violations);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut request: ProgramRequest = serde_json::from_value(value)
        .map_err(|err| ValidationErrors::single("", format!("malformed request: {err}")))?;
    request.constraints = request.constraints.trim().to_string();
    Ok(request)
}
