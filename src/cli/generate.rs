use anyhow::{Context, Result, bail};
use colored::*;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client::AIClient;
use crate::config::{Config, check_max_attempts};
use crate::contract::{ProgramSpec, validate_request};
use crate::generator::ChatOracle;
use crate::repair::{Generated, RepairError, RepairLoop, RepairPolicy};

use super::args::GenerateArgs;
use super::util::{read_input, render_violations};

pub(crate) async fn handle_generate(args: GenerateArgs, config: Config) -> Result<()> {
    config.validate()?;

    let raw = read_input(&args.input)?;
    let value: Value = serde_json::from_str(&raw).context("Request file is not valid JSON")?;
    let request = match validate_request(&value) {
        Ok(request) => request,
        Err(errors) => {
            eprintln!("{}", "❌ Invalid program request:".red().bold());
            eprintln!("{}", render_violations(&errors));
            bail!("Request failed validation");
        }
    };

    let policy = policy_for(args.max_attempts, &config)?;

    let client = AIClient::new(&config.llm)?;
    let oracle = ChatOracle::from_config(Arc::new(client), &config);
    let repair_loop = RepairLoop::new(Arc::new(oracle), policy);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; abandoning generation");
            on_interrupt.cancel();
        }
    });

    if !args.json {
        eprintln!(
            "🏋️  Generating a {}-day {} {} program with {} ({} attempt(s) max)...",
            request.days_per_week,
            request.split_preference.label(),
            request.goal.label(),
            config.models.generator,
            repair_loop.policy().max_attempts
        );
    }

    let outcome = repair_loop.run_with_cancel(&request, &cancel).await;
    cancel.cancel();

    match outcome {
        Ok(generated) if args.json => {
            println!("{}", serde_json::to_string_pretty(&generated.program)?);
            Ok(())
        }
        Ok(generated) => {
            render_generated(&generated);
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

/// The configured policy, with `--max-attempts` held to the same bounds as
/// the config setting.
fn policy_for(max_attempts: Option<u32>, config: &Config) -> Result<RepairPolicy> {
    let mut policy = RepairPolicy::from_settings(&config.generation);
    if let Some(max_attempts) = max_attempts {
        check_max_attempts(max_attempts).context("Invalid --max-attempts")?;
        policy.max_attempts = max_attempts;
    }
    Ok(policy)
}

fn render_generated(generated: &Generated) {
    let program = &generated.program;
    println!();
    println!("{}", program.plan_name.bold().green());
    println!(
        "{} days/week · {} · {} exercises",
        program.days_per_week,
        program.split,
        program.exercise_count()
    );
    if generated.attempts > 1 {
        let rejected = generated
            .rejected
            .iter()
            .map(|diagnostic| diagnostic.code())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}",
            format!("accepted on attempt {} (rejected: {rejected})", generated.attempts).yellow()
        );
    }

    render_progression(program);

    for template in &program.templates {
        println!();
        println!("{} {}", template.day_name.bold().cyan(), format!("({})", template.focus).dimmed());
        for block in &template.blocks {
            println!("  {}", block.block_name.bold());
            for exercise in &block.exercises {
                println!(
                    "    {:<28} {} x {:<7} RIR {}  rest {}s",
                    exercise.name,
                    exercise.sets,
                    exercise.reps,
                    exercise.rir,
                    exercise.rest_sec
                );
                if !exercise.notes.trim().is_empty() {
                    println!("      {}", exercise.notes.trim().dimmed());
                }
            }
        }
    }
}

fn render_progression(program: &ProgramSpec) {
    println!();
    println!("{}", "Progression".bold());
    println!("  {}", program.progression.overview);
    for rule in &program.progression.rules {
        println!("  • {rule}");
    }
}

fn report_failure(err: &RepairError) {
    eprintln!("{} {}", "❌ Generation failed:".red().bold(), err);
    if let RepairError::Exhausted { raw, .. } = err {
        if !raw.trim().is_empty() {
            eprintln!("{}", "Last model output:".dimmed());
            eprintln!("{raw}");
        }
    }
}
