use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::contract::ValidationErrors;

/// Read a whole input file, treating `-` as stdin.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut buffer)
            .context("Failed reading stdin")?;
        return Ok(buffer);
    }

    fs::read_to_string(path).with_context(|| format!("Failed reading {}", path.display()))
}

pub(crate) fn render_violations(errors: &ValidationErrors) -> String {
    errors
        .violations
        .iter()
        .map(|violation| {
            if violation.path.is_empty() {
                format!("  - {}", violation.message)
            } else {
                format!("  - {}: {}", violation.path, violation.message)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldViolation;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_named_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"daysPerWeek\": 3}}").unwrap();

        let contents = read_input(file.path()).unwrap();
        assert_eq!(contents, "{\"daysPerWeek\": 3}");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_input(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn violations_render_one_per_line() {
        let errors = ValidationErrors::new(vec![
            FieldViolation::new("", "body is not valid JSON"),
            FieldViolation::new("goal", "must be one of HYPERTROPHY, STRENGTH, RECOMPOSITION"),
        ]);

        let rendered = render_violations(&errors);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "  - body is not valid JSON");
        assert!(lines[1].starts_with("  - goal: must be one of"));
    }
}
