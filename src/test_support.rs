use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::contract::{Equipment, Experience, Goal, ProgramRequest, SplitPreference};
use crate::generator::{Oracle, OracleError};
use crate::prompt::PromptPayload;

pub fn sample_request() -> ProgramRequest {
    ProgramRequest {
        days_per_week: 3,
        minutes_per_session: 60,
        split_preference: SplitPreference::FullBody,
        goal: Goal::Hypertrophy,
        experience: Experience::Intermediate,
        equipment: Equipment::Gym,
        constraints: "no barbell back squat".to_string(),
    }
}

pub fn sample_request_json() -> Value {
    json!({
        "daysPerWeek": 3,
        "minutesPerSession": 60,
        "splitPreference": "FULL_BODY",
        "goal": "HYPERTROPHY",
        "experience": "INTERMEDIATE",
        "equipment": "GYM",
        "constraints": "no barbell back squat"
    })
}

fn sample_day(name: &str, focus: &str) -> Value {
    json!({
        "dayName": name,
        "focus": focus,
        "blocks": [
            {
                "blockName": "Main",
                "exercises": [
                    {
                        "name": "Leg Press",
                        "sets": 3,
                        "reps": "8-12",
                        "rir": 2,
                        "restSec": 120,
                        "notes": "Full range of motion"
                    },
                    {
                        "name": "Dumbbell Bench Press",
                        "sets": 3,
                        "reps": "6-10",
                        "rir": 1,
                        "restSec": 120,
                        "notes": ""
                    }
                ]
            },
            {
                "blockName": "Accessories",
                "exercises": [
                    {
                        "name": "Cable Row",
                        "sets": 3,
                        "reps": "10-15",
                        "rir": 2,
                        "restSec": 90,
                        "notes": ""
                    }
                ]
            }
        ]
    })
}

/// A fully valid program with `days` templates.
pub fn sample_program_json(days: usize) -> Value {
    let templates = (0..days)
        .map(|idx| sample_day(&format!("Day {}", idx + 1), "Full body"))
        .collect::<Vec<_>>();

    json!({
        "planName": "Three Day Full Body",
        "daysPerWeek": days,
        "split": "Full body",
        "progression": {
            "overview": "Double progression on every lift.",
            "rules": [
                "Add reps until the top of the range is reached on all sets.",
                "Then add the smallest available load and restart at the bottom."
            ]
        },
        "templates": templates
    })
}

pub enum Step {
    Reply(String),
    Fail(OracleError),
    SlowReply(Duration, String),
    Hang,
}

/// Oracle that plays back a fixed script and records every prompt it sees.
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<PromptPayload>>,
}

impl ScriptedOracle {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompt(&self, idx: usize) -> PromptPayload {
        self.prompts.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, prompt: &PromptPayload) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("oracle called more times than scripted");
        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail(err) => Err(err),
            Step::SlowReply(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

pub fn reply(text: impl Into<String>) -> Step {
    Step::Reply(text.into())
}


/// Variables `Config::load` reads; cleared by every [`EnvGuard`].
const MANAGED_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
    "PROGRAM_BUILDER_PROVIDER",
    "PROGRAM_BUILDER_BASE_URL",
    "PROGRAM_BUILDER_TIMEOUT_SECS",
    "PROGRAM_BUILDER_MODEL",
    "PROGRAM_BUILDER_MAX_TOKENS",
    "PROGRAM_BUILDER_MAX_ATTEMPTS",
    "PROGRAM_BUILDER_DEADLINE_SECS",
    "PROGRAM_BUILDER_STRUCTURED_OUTPUT",
    "PROGRAM_BUILDER_STRICT_SCHEMA",
    "PROGRAM_BUILDER_BIND",
    "PROGRAM_BUILDER_PORT",
    "PROGRAM_BUILDER_ACCESS_TOKEN",
];

/// Serializes tests that touch the process environment.
pub fn env_lock<'a>() -> MutexGuard<'a, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Clears every managed variable, then applies `vars`.
    pub fn new(vars: &[(&str, Option<&str>)]) -> Self {
        let mut keys: Vec<&str> = MANAGED_VARS.to_vec();
        keys.push("HOME");
        keys.extend(vars.iter().map(|(key, _)| *key));

        let saved = keys
            .iter()
            .map(|key| (key.to_string(), std::env::var(key).ok()))
            .collect::<Vec<_>>();

        for key in MANAGED_VARS {
            unsafe { std::env::remove_var(key) };
        }
        for (key, value) in vars {
            match value {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.iter().rev() {
            match value {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}
