//! Bounded generate-parse-validate loop.
//!
//! Each request runs the state machine
//! `Compose -> Invoke -> Parse -> Validate -> Success | Retry | Exhausted`.
//! Content failures (unparseable text, contract violations) are fed back to
//! the model as a [`Diagnostic`] and retried until the attempt budget is
//! spent; transport failures end the loop immediately.

mod parsing;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::GenerationSettings;
use crate::contract::{ProgramContract, ProgramRequest, ProgramSpec};
use crate::diagnostic::Diagnostic;
use crate::generator::{DynOracle, OracleError};
use crate::prompt::{PromptPayload, compose_prompt};

pub(crate) use parsing::parse_candidate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairPolicy {
    pub max_attempts: u32,
    /// Time budget for all attempts of one request.
    pub deadline: Option<Duration>,
    pub strict_schema: bool,
}

impl RepairPolicy {
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            deadline: settings.deadline(),
            strict_schema: settings.strict_schema,
        }
    }
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self::from_settings(&GenerationSettings::default())
    }
}

/// A validated program and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub program: ProgramSpec,
    pub attempts: u32,
    /// Diagnostics of the rejected attempts, in order.
    pub rejected: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("model call failed on attempt {attempt}: {source}")]
    Transport { attempt: u32, source: OracleError },
    #[error("no valid program after {attempts} attempt(s); last failure {diagnostic}")]
    Exhausted {
        attempts: u32,
        diagnostic: Diagnostic,
        /// Text of the last rejected candidate.
        raw: String,
    },
    #[error("generation cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

enum State {
    Compose {
        attempt: u32,
        diagnostic: Option<Diagnostic>,
    },
    Invoke {
        attempt: u32,
        prompt: PromptPayload,
    },
    Parse {
        attempt: u32,
        raw: String,
    },
    Validate {
        attempt: u32,
        raw: String,
        value: Value,
    },
    Retry {
        attempt: u32,
        diagnostic: Diagnostic,
        raw: String,
    },
}

pub struct RepairLoop {
    oracle: Arc<DynOracle>,
    policy: RepairPolicy,
}

impl RepairLoop {
    pub fn new(oracle: Arc<DynOracle>, policy: RepairPolicy) -> Self {
        Self { oracle, policy }
    }

    pub fn policy(&self) -> &RepairPolicy {
        &self.policy
    }

    pub async fn run(&self, request: &ProgramRequest) -> Result<Generated, RepairError> {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    /// Drive the loop until a program validates, the budget is spent, or
    /// `cancel` fires. No oracle call starts after cancellation.
    pub async fn run_with_cancel(
        &self,
        request: &ProgramRequest,
        cancel: &CancellationToken,
    ) -> Result<Generated, RepairError> {
        let contract = ProgramContract::with_strict(self.policy.strict_schema).for_request(request);
        let started = Instant::now();
        let mut slowest_attempt = Duration::ZERO;
        let mut rejected: Vec<Diagnostic> = Vec::new();
        let mut last_raw = String::new();

        let mut state = State::Compose {
            attempt: 1,
            diagnostic: None,
        };

        loop {
            state = match state {
                State::Compose {
                    attempt,
                    diagnostic,
                } => {
                    if cancel.is_cancelled() {
                        return Err(RepairError::Cancelled {
                            attempts: attempt - 1,
                        });
                    }
                    let prompt = compose_prompt(request, diagnostic.as_ref());
                    State::Invoke { attempt, prompt }
                }
                State::Invoke { attempt, prompt } => {
                    debug!(attempt, "invoking model");
                    let call_started = Instant::now();
                    let remaining = self
                        .policy
                        .deadline
                        .map(|deadline| deadline.saturating_sub(started.elapsed()));

                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!(attempt, "request cancelled while waiting for the model");
                            return Err(RepairError::Cancelled { attempts: attempt });
                        }
                        outcome = self.invoke(&prompt, remaining) => outcome,
                    };
                    slowest_attempt = slowest_attempt.max(call_started.elapsed());

                    match outcome {
                        Ok(raw) => State::Parse { attempt, raw },
                        Err(InvokeFailure::Oracle(OracleError::EmptyResponse(reason))) => {
                            let error = OracleError::EmptyResponse(reason);
                            State::Retry {
                                attempt,
                                diagnostic: Diagnostic::not_json(error.to_string()),
                                raw: String::new(),
                            }
                        }
                        Err(InvokeFailure::Oracle(source)) => {
                            warn!(attempt, error = %source, "model call failed");
                            return Err(RepairError::Transport { attempt, source });
                        }
                        Err(InvokeFailure::DeadlineElapsed) => match rejected.pop() {
                            Some(diagnostic) => {
                                warn!(attempt, "time budget spent while waiting for a retry");
                                // The payload belongs to the last completed attempt.
                                return Err(RepairError::Exhausted {
                                    attempts: attempt - 1,
                                    diagnostic,
                                    raw: last_raw,
                                });
                            }
                            None => {
                                let source = OracleError::Unavailable(
                                    "request deadline elapsed before the model responded".to_string(),
                                );
                                warn!(attempt, error = %source, "model call failed");
                                return Err(RepairError::Transport { attempt, source });
                            }
                        },
                    }
                }
                State::Parse { attempt, raw } => match parse_candidate(&raw) {
                    Ok(value) => State::Validate { attempt, raw, value },
                    Err(reason) => State::Retry {
                        attempt,
                        diagnostic: Diagnostic::not_json(reason),
                        raw,
                    },
                },
                State::Validate {
                    attempt,
                    raw,
                    value,
                } => match contract.validate(&value) {
                    Ok(program) => {
                        info!(
                            attempt,
                            templates = program.templates.len(),
                            exercises = program.exercise_count(),
                            "program validated"
                        );
                        return Ok(Generated {
                            program,
                            attempts: attempt,
                            rejected,
                        });
                    }
                    Err(errors) => State::Retry {
                        attempt,
                        diagnostic: Diagnostic::from(errors),
                        raw,
                    },
                },
                State::Retry {
                    attempt,
                    diagnostic,
                    raw,
                } => {
                    warn!(attempt, diagnostic = %diagnostic, "candidate rejected");

                    if attempt >= self.policy.max_attempts {
                        return Err(RepairError::Exhausted {
                            attempts: attempt,
                            diagnostic,
                            raw,
                        });
                    }

                    if let Some(deadline) = self.policy.deadline {
                        let remaining = deadline.saturating_sub(started.elapsed());
                        if remaining < slowest_attempt {
                            warn!(
                                attempt,
                                remaining_ms = remaining.as_millis() as u64,
                                "not enough time left for another attempt"
                            );
                            return Err(RepairError::Exhausted {
                                attempts: attempt,
                                diagnostic,
                                raw,
                            });
                        }
                    }

                    rejected.push(diagnostic.clone());
                    last_raw = raw;
                    State::Compose {
                        attempt: attempt + 1,
                        diagnostic: Some(diagnostic),
                    }
                }
            };
        }
    }

    async fn invoke(
        &self,
        prompt: &PromptPayload,
        remaining: Option<Duration>,
    ) -> Result<String, InvokeFailure> {
        match remaining {
            Some(remaining) => tokio::time::timeout(remaining, self.oracle.generate(prompt))
                .await
                .map_err(|_| InvokeFailure::DeadlineElapsed)?
                .map_err(InvokeFailure::Oracle),
            None => self.oracle.generate(prompt).await.map_err(InvokeFailure::Oracle),
        }
    }
}

enum InvokeFailure {
    Oracle(OracleError),
    DeadlineElapsed,
}
