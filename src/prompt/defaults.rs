use serde::Serialize;

use crate::contract::{Equipment, Experience, Goal, ProgramRequest};

/// Programming defaults derived from the request, embedded in the user prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainDefaults {
    pub templates_required: u8,
    pub exercises_per_day: Range,
    pub reps: &'static str,
    pub rir: Range,
    pub rest_sec: Range,
    pub weekly_sets_per_muscle: Range,
    pub equipment_rules: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub min: u16,
    pub max: u16,
}

const fn range(min: u16, max: u16) -> Range {
    Range { min, max }
}

pub fn exercises_per_day(minutes_per_session: u16) -> Range {
    match minutes_per_session {
        0..=45 => range(3, 5),
        46..=75 => range(4, 6),
        76..=120 => range(5, 8),
        _ => range(6, 9),
    }
}

struct GoalDefaults {
    reps: &'static str,
    rir: Range,
    rest_sec: Range,
}

fn goal_defaults(goal: Goal) -> GoalDefaults {
    match goal {
        Goal::Hypertrophy => GoalDefaults {
            reps: "6-12 for compounds, 10-20 for isolation",
            rir: range(1, 3),
            rest_sec: range(60, 150),
        },
        Goal::Strength => GoalDefaults {
            reps: "3-6 for main lifts, 6-10 for accessories",
            rir: range(1, 3),
            rest_sec: range(120, 300),
        },
        Goal::Recomposition => GoalDefaults {
            reps: "8-15",
            rir: range(1, 2),
            rest_sec: range(60, 90),
        },
    }
}

fn weekly_sets(experience: Experience) -> Range {
    match experience {
        Experience::Beginner => range(6, 10),
        Experience::Intermediate => range(10, 16),
        Experience::Advanced => range(14, 22),
    }
}

fn equipment_rules(equipment: Equipment) -> &'static str {
    match equipment {
        Equipment::Gym => {
            "Full commercial gym: barbells, dumbbells, cables and machines are all available."
        }
        Equipment::Home => {
            "Home gym: dumbbells, adjustable bench, resistance bands, pull-up bar and bodyweight only. No machines or cables."
        }
        Equipment::Limited => {
            "Limited equipment: bodyweight, resistance bands and at most one pair of light dumbbells. No barbells, machines or cables."
        }
    }
}

pub fn domain_defaults(request: &ProgramRequest) -> DomainDefaults {
    let goal = goal_defaults(request.goal);
    DomainDefaults {
        templates_required: request.days_per_week,
        exercises_per_day: exercises_per_day(request.minutes_per_session),
        reps: goal.reps,
        rir: goal.rir,
        rest_sec: goal.rest_sec,
        weekly_sets_per_muscle: weekly_sets(request.experience),
        equipment_rules: equipment_rules(request.equipment),
    }
}
