//! Declarative shape definitions shared by the request and program contracts.
//!
//! A [`Shape`] tree is the single definition of a contract. It is used twice:
//! - [`Shape::check`] validates an untyped JSON value and collects every violation
//! - [`Shape::to_json_schema`] derives the JSON Schema declared to the model's
//!   structured-output mode, so the two can never disagree

use serde_json::{Map, Number, Value, json};

use super::types::FieldViolation;

/// What to do with object keys the shape does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeys {
    Reject,
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Object(Vec<Field>),
    Array {
        items: Box<Shape>,
        min_items: usize,
        max_items: usize,
    },
    Text {
        min_len: usize,
        max_len: usize,
    },
    Integer {
        min: i64,
        max: i64,
    },
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    pub fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

impl Shape {
    pub fn text(min_len: usize, max_len: usize) -> Self {
        Shape::Text { min_len, max_len }
    }

    pub fn integer(min: i64, max: i64) -> Self {
        Shape::Integer { min, max }
    }

    pub fn array(items: Shape, min_items: usize, max_items: usize) -> Self {
        Shape::Array {
            items: Box::new(items),
            min_items,
            max_items,
        }
    }

    /// Walk `value` and append one violation per defect found beneath `path`.
    pub fn check(
        &self,
        value: &Value,
        path: &str,
        unknown_keys: UnknownKeys,
        violations: &mut Vec<FieldViolation>,
    ) {
        match self {
            Shape::Object(fields) => {
                let Some(object) = value.as_object() else {
                    violations.push(type_mismatch(path, "object", value));
                    return;
                };

                for field in fields {
                    let child_path = join_key(path, field.name);
                    match object.get(field.name) {
                        Some(child) => field.shape.check(child, &child_path, unknown_keys, violations),
                        None if field.required => {
                            violations.push(FieldViolation::new(child_path, "is required"));
                        }
                        None => {}
                    }
                }

                if unknown_keys == UnknownKeys::Reject {
                    for key in object.keys() {
                        if !fields.iter().any(|field| field.name == key) {
                            violations.push(FieldViolation::new(
                                join_key(path, key),
                                "is not an allowed field",
                            ));
                        }
                    }
                }
            }
            Shape::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(elements) = value.as_array() else {
                    violations.push(type_mismatch(path, "array", value));
                    return;
                };

                if elements.len() < *min_items {
                    violations.push(FieldViolation::new(
                        path,
                        format!(
                            "must contain at least {min_items} item(s), found {}",
                            elements.len()
                        ),
                    ));
                } else if elements.len() > *max_items {
                    violations.push(FieldViolation::new(
                        path,
                        format!(
                            "must contain at most {max_items} item(s), found {}",
                            elements.len()
                        ),
                    ));
                }

                for (idx, element) in elements.iter().enumerate() {
                    items.check(element, &format!("{path}[{idx}]"), unknown_keys, violations);
                }
            }
            Shape::Text { min_len, max_len } => {
                let Some(text) = value.as_str() else {
                    violations.push(type_mismatch(path, "string", value));
                    return;
                };

                let length = text.trim().chars().count();
                if *min_len > 0 && length == 0 {
                    violations.push(FieldViolation::new(path, "must not be empty"));
                } else if length < *min_len {
                    violations.push(FieldViolation::new(
                        path,
                        format!("must be at least {min_len} characters, found {length}"),
                    ));
                } else if length > *max_len {
                    violations.push(FieldViolation::new(
                        path,
                        format!("must be at most {max_len} characters, found {length}"),
                    ));
                }
            }
            Shape::Integer { min, max } => {
                let Value::Number(number) = value else {
                    violations.push(type_mismatch(path, "integer", value));
                    return;
                };

                let in_range = match integral(number) {
                    Integral::Exact(found) => (*min..=*max).contains(&found),
                    Integral::OutOfRange => false,
                    Integral::Fractional => {
                        violations.push(type_mismatch(path, "integer", value));
                        return;
                    }
                };
                if !in_range {
                    violations.push(FieldViolation::new(
                        path,
                        format!("must be between {min} and {max}, found {number}"),
                    ));
                }
            }
            Shape::Choice(options) => {
                let Some(text) = value.as_str() else {
                    violations.push(type_mismatch(path, "string", value));
                    return;
                };

                if !options.contains(&text) {
                    violations.push(FieldViolation::new(
                        path,
                        format!("must be one of {}, found {text:?}", options.join(", ")),
                    ));
                }
            }
        }
    }

    /// Rewrite whole-valued numbers under integer shapes (`3.0` becomes `3`)
    /// so the typed models deserialize everything [`Shape::check`] accepts.
    pub fn normalize(&self, value: &mut Value) {
        match self {
            Shape::Object(fields) => {
                if let Some(object) = value.as_object_mut() {
                    for field in fields {
                        if let Some(child) = object.get_mut(field.name) {
                            field.shape.normalize(child);
                        }
                    }
                }
            }
            Shape::Array { items, .. } => {
                if let Some(elements) = value.as_array_mut() {
                    for element in elements {
                        items.normalize(element);
                    }
                }
            }
            Shape::Integer { .. } => {
                let exact = match value {
                    Value::Number(number) => match integral(number) {
                        Integral::Exact(found) => Some(found),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(found) = exact {
                    *value = Value::from(found);
                }
            }
            Shape::Text { .. } | Shape::Choice(_) => {}
        }
    }

    /// JSON Schema for the model's structured-output mode.
    ///
    /// String length limits are left to [`Shape::check`]; structured-output
    /// endpoints reject `minLength`/`maxLength` in strict schemas.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Shape::Object(fields) => {
                let mut properties = Map::new();
                for field in fields {
                    properties.insert(field.name.to_string(), field.shape.to_json_schema());
                }
                let required = fields
                    .iter()
                    .filter(|field| field.required)
                    .map(|field| Value::String(field.name.to_string()))
                    .collect::<Vec<_>>();

                json!({
                    "type": "object",
                    "additionalProperties": false,
                    "properties": properties,
                    "required": required,
                })
            }
            Shape::Array {
                items,
                min_items,
                max_items,
            } => json!({
                "type": "array",
                "items": items.to_json_schema(),
                "minItems": min_items,
                "maxItems": max_items,
            }),
            Shape::Text { .. } => json!({ "type": "string" }),
            Shape::Integer { min, max } => json!({
                "type": "integer",
                "minimum": min,
                "maximum": max,
            }),
            Shape::Choice(options) => json!({
                "type": "string",
                "enum": options,
            }),
        }
    }

    /// One-line sketch of the shape for prompts, e.g. `{"sets": integer 1-10}`.
    pub fn describe(&self) -> String {
        match self {
            Shape::Object(fields) => {
                let parts = fields
                    .iter()
                    .map(|field| format!("\"{}\": {}", field.name, field.shape.describe()))
                    .collect::<Vec<_>>();
                format!("{{{}}}", parts.join(", "))
            }
            Shape::Array {
                items,
                min_items,
                max_items,
            } => format!("[{}] ({min_items}-{max_items} items)", items.describe()),
            Shape::Text { min_len: 0, .. } => "string (may be empty)".to_string(),
            Shape::Text { .. } => "non-empty string".to_string(),
            Shape::Integer { min, max } => format!("integer {min}-{max}"),
            Shape::Choice(options) => format!("one of {}", options.join("|")),
        }
    }
}

enum Integral {
    Exact(i64),
    OutOfRange,
    Fractional,
}

// JSON Schema counts any number with a zero fractional part as an integer.
fn integral(number: &Number) -> Integral {
    if let Some(found) = number.as_i64() {
        return Integral::Exact(found);
    }
    if number.is_u64() {
        return Integral::OutOfRange;
    }
    match number.as_f64() {
        Some(found) if found.is_finite() && found.fract() == 0.0 => {
            if found >= i64::MIN as f64 && found < i64::MAX as f64 {
                Integral::Exact(found as i64)
            } else {
                Integral::OutOfRange
            }
        }
        _ => Integral::Fractional,
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_mismatch(path: &str, expected: &str, found: &Value) -> FieldViolation {
    FieldViolation::new(
        path,
        format!("expected {expected}, found {}", json_kind(found)),
    )
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
