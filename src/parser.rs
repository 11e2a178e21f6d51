//! Parsing of completion-service responses.
//!
//! The completion service is an untrusted producer of loosely-typed text:
//! it is asked for JSON but routinely wraps the payload in a markdown code
//! fence or surrounds it with prose. This module strips the wrapping,
//! validates the shape strictly, and coerces numeric fields into range.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{TaskPriority, TaskType};

/// Minutes fall back to this when the model sends something non-numeric.
const DEFAULT_MINUTES: i64 = 15;

/// A validated mission entry, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMission {
    pub task_text: String,
    pub task_type: TaskType,
    pub enfoque_name: String,
    pub estimated_minutes: i64,
}

/// The full missions payload after validation.
#[derive(Debug, Clone)]
pub struct ParsedMissions {
    pub missions: Vec<ParsedMission>,
    pub motivational_pulse: Option<String>,
}

/// A validated legacy (untyped) task entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTask {
    pub task_text: String,
    pub goal_name: String,
    pub priority: TaskPriority,
    pub estimated_minutes: i64,
}

// Wire shapes as the model emits them. Everything is optional or loosely
// typed here; strictness is applied after deserialization.

#[derive(Deserialize)]
struct RawMissionsPayload {
    missions: Option<Vec<RawMission>>,
    motivational_pulse: Option<String>,
}

#[derive(Deserialize)]
struct RawMission {
    task_text: Option<String>,
    task_type: Option<String>,
    enfoque_name: Option<String>,
    estimated_minutes: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawTask {
    task_text: Option<String>,
    #[serde(alias = "goal_name", alias = "enfoque_name")]
    goal_name: Option<String>,
    priority: Option<String>,
    estimated_minutes: Option<serde_json::Value>,
}

/// Strip a leading/trailing markdown code fence (``` or ```json) and, as a
/// fallback, trim any prose surrounding the outermost JSON value.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(inner) = rest.trim_start_matches(['\r', '\n']).strip_suffix("```") {
            return inner.trim();
        }
    }
    // No well-formed fence; fall back to the outermost brace/bracket pair.
    let open = trimmed.find(['{', '[']);
    let close = trimmed.rfind(['}', ']']);
    match (open, close) {
        (Some(a), Some(b)) if a < b => &trimmed[a..=b],
        _ => trimmed,
    }
}

/// Coerce an `estimated_minutes` value to an integer clamped to [1, 60].
fn clamp_minutes(value: Option<&serde_json::Value>) -> i64 {
    let n = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(v) if v.is_finite() => (v.round() as i64).clamp(1, 60),
        _ => DEFAULT_MINUTES,
    }
}

/// Parse the missions shape: exactly one task of each of the three types.
///
/// Entries with an unknown `task_type` are dropped; if what remains does
/// not contain all three types, the payload is rejected so the caller can
/// re-ask the model once.
pub fn parse_missions(
    raw: &str,
    known_enfoques: &[String],
) -> Result<ParsedMissions, AppError> {
    let cleaned = strip_code_fence(raw);
    let payload: RawMissionsPayload = serde_json::from_str(cleaned)
        .map_err(|e| AppError::GenerationParse(format!("invalid JSON: {}", e)))?;

    let entries = payload
        .missions
        .ok_or_else(|| AppError::GenerationParse("missing 'missions' array".into()))?;

    let default_enfoque = known_enfoques
        .first()
        .cloned()
        .unwrap_or_else(|| "General".to_string());

    // Keep the first well-formed entry of each type.
    let mut by_type: HashMap<TaskType, ParsedMission> = HashMap::new();
    for entry in entries {
        let Some(task_type) = entry
            .task_type
            .as_deref()
            .and_then(|s| TaskType::from_str(s).ok())
        else {
            continue;
        };
        let Some(task_text) = entry.task_text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        by_type.entry(task_type).or_insert(ParsedMission {
            task_text: task_text.trim().to_string(),
            task_type,
            enfoque_name: entry
                .enfoque_name
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| default_enfoque.clone()),
            estimated_minutes: clamp_minutes(entry.estimated_minutes.as_ref()),
        });
    }

    let mut missions = Vec::with_capacity(3);
    for task_type in TaskType::ALL {
        let mission = by_type.remove(&task_type).ok_or_else(|| {
            AppError::GenerationParse(format!("missing '{}' mission", task_type))
        })?;
        missions.push(mission);
    }

    Ok(ParsedMissions {
        missions,
        motivational_pulse: payload
            .motivational_pulse
            .filter(|m| !m.trim().is_empty()),
    })
}

/// Parse the legacy flat-array shape: 3-5 untyped tasks.
///
/// Accepts either a bare array or an object with a `tasks` array. Entries
/// without task text are dropped; an empty result is rejected.
pub fn parse_flat_tasks(raw: &str) -> Result<Vec<ParsedTask>, AppError> {
    let cleaned = strip_code_fence(raw);
    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| AppError::GenerationParse(format!("invalid JSON: {}", e)))?;

    let array = match value {
        serde_json::Value::Array(a) => a,
        serde_json::Value::Object(mut o) => match o.remove("tasks") {
            Some(serde_json::Value::Array(a)) => a,
            _ => {
                return Err(AppError::GenerationParse(
                    "missing 'tasks' array".into(),
                ))
            }
        },
        _ => return Err(AppError::GenerationParse("expected a JSON array".into())),
    };

    let mut tasks = Vec::new();
    for entry in array {
        let Ok(raw_task) = serde_json::from_value::<RawTask>(entry) else {
            continue;
        };
        let Some(task_text) = raw_task.task_text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        tasks.push(ParsedTask {
            task_text: task_text.trim().to_string(),
            goal_name: raw_task
                .goal_name
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| "General".to_string()),
            priority: raw_task
                .priority
                .as_deref()
                .and_then(|p| TaskPriority::from_str(p).ok())
                .unwrap_or(TaskPriority::Medium),
            estimated_minutes: clamp_minutes(raw_task.estimated_minutes.as_ref()),
        });
    }

    if tasks.is_empty() {
        return Err(AppError::GenerationParse("no usable tasks in response".into()));
    }
    tasks.truncate(5);
    Ok(tasks)
}

/// Parse a single replacement task (the swap flow).
pub fn parse_replacement_task(raw: &str) -> Result<(String, i64), AppError> {
    let cleaned = strip_code_fence(raw);
    let raw_task: RawTask = serde_json::from_str(cleaned)
        .map_err(|e| AppError::GenerationParse(format!("invalid JSON: {}", e)))?;
    let task_text = raw_task
        .task_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::GenerationParse("missing 'task_text'".into()))?;
    Ok((
        task_text.trim().to_string(),
        clamp_minutes(raw_task.estimated_minutes.as_ref()),
    ))
}
