use anyhow::{Result, bail};
use colored::*;

use crate::contract::{ProgramContract, ProgramSpec, ValidationErrors, program_json_schema};
use crate::diagnostic::Diagnostic;
use crate::repair::parse_candidate;

use super::args::CheckArgs;
use super::util::{read_input, render_violations};

pub(crate) fn print_schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&program_json_schema())?);
    Ok(())
}

pub(crate) fn handle_check(args: CheckArgs) -> Result<()> {
    let raw = read_input(&args.input)?;

    let mut contract = ProgramContract::with_strict(!args.loose);
    if let Some(days) = args.days {
        contract = contract.expecting_days(days);
    }

    match check_candidate(&raw, &contract) {
        Ok(program) => {
            println!(
                "{} {} ({} days, {} exercises)",
                "✅ Valid program:".green().bold(),
                program.plan_name,
                program.days_per_week,
                program.exercise_count()
            );
            Ok(())
        }
        Err(Diagnostic::NotJson { reason }) => {
            println!("{} {}", "❌ NOT_JSON:".red().bold(), reason);
            bail!("Candidate is not a JSON object");
        }
        Err(Diagnostic::SchemaMismatch { violations }) => {
            println!(
                "{} {} violation(s)",
                "❌ SCHEMA_MISMATCH:".red().bold(),
                violations.len()
            );
            println!("{}", render_violations(&ValidationErrors::new(violations)));
            bail!("Candidate does not satisfy the program contract");
        }
    }
}

/// Run a raw candidate through the same parse and validate steps the
/// repair loop applies to model output.
pub(crate) fn check_candidate(raw: &str, contract: &ProgramContract) -> Result<ProgramSpec, Diagnostic> {
    let value = parse_candidate(raw).map_err(Diagnostic::not_json)?;
    contract.validate(&value).map_err(Diagnostic::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_program_json;
    use serde_json::json;

    #[test]
    fn accepts_fenced_model_output() {
        let raw = format!("Here you go:\n```json\n{}\n```", sample_program_json(4));
        let program = check_candidate(&raw, &ProgramContract::strict()).unwrap();
        assert_eq!(program.templates.len(), 4);
    }

    #[test]
    fn accepts_program_after_prose_with_braces() {
        let raw = format!("Plan {{v2}} below:\n{}", sample_program_json(3));
        let program = check_candidate(&raw, &ProgramContract::strict()).unwrap();
        assert_eq!(program.days_per_week, 3);
    }

    #[test]
    fn prose_is_not_json() {
        let err = check_candidate("no program today", &ProgramContract::strict()).unwrap_err();
        assert_eq!(err.code(), "NOT_JSON");
    }

    #[test]
    fn day_binding_is_optional() {
        let raw = sample_program_json(3).to_string();
        assert!(check_candidate(&raw, &ProgramContract::strict()).is_ok());

        let err = check_candidate(&raw, &ProgramContract::strict().expecting_days(5)).unwrap_err();
        let Diagnostic::SchemaMismatch { violations } = err else {
            panic!("expected schema mismatch");
        };
        assert!(violations.iter().any(|v| v.path == "daysPerWeek"));
    }

    #[test]
    fn loose_contract_ignores_extra_keys() {
        let mut candidate = sample_program_json(3);
        candidate["templates"][0]["warmup"] = json!("5 min bike");
        let raw = candidate.to_string();

        assert!(check_candidate(&raw, &ProgramContract::strict()).is_err());
        assert!(check_candidate(&raw, &ProgramContract::loose()).is_ok());
    }
}
