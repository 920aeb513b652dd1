//! Input and output contracts for program generation.
//!
//! Both contracts are plain validation with no I/O. Each is defined once as a
//! [`schema::Shape`] tree; the program shape also yields the JSON Schema sent
//! to the model, while [`ProgramContract`] remains the only authority on
//! whether a candidate is acceptable.

mod program;
mod request;
mod schema;
mod types;

pub use program::{ProgramContract, program_json_schema, program_shape};
pub use request::validate_request;
pub use types::{
    Equipment, Experience, FieldViolation, Goal, ProgramRequest, ProgramSpec, ValidationErrors,
};

#[cfg(test)]
pub use types::SplitPreference;
