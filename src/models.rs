use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The single active overarching goal a user is pursuing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NorthStar {
    pub id: i64,
    pub user_id: i64,
    pub goal_text: String,
    pub source_board_id: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

/// A weekly focus area. At most 3 per (user, week_start).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enfoque {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub north_star_id: Option<i64>,
    pub week_start: NaiveDate,
    pub created_at: String,
}

/// Type of a daily mission. Legacy tasks generated from vision boards
/// carry no type at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    NonNegotiable,
    Secondary,
    Micro,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonNegotiable => "non_negotiable",
            Self::Secondary => "secondary",
            Self::Micro => "micro",
        }
    }

    /// Fixed display order: the non-negotiable always comes first.
    pub fn sort_order(&self) -> i32 {
        match self {
            Self::NonNegotiable => 0,
            Self::Secondary => 1,
            Self::Micro => 2,
        }
    }

    pub const ALL: [TaskType; 3] = [Self::NonNegotiable, Self::Secondary, Self::Micro];
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "non_negotiable" => Ok(Self::NonNegotiable),
            "secondary" => Ok(Self::Secondary),
            "micro" => Ok(Self::Micro),
            _ => Err(format!("Invalid task type: {}", s)),
        }
    }
}

/// Priority of a legacy (untyped) task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A single actionable item for one user on one calendar date.
///
/// Missions carry a `task_type`; legacy tasks generated straight from
/// vision boards leave it `None` and carry a `priority` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: i64,
    pub user_id: i64,
    pub task_text: String,
    pub enfoque_name: String,
    pub task_type: Option<TaskType>,
    pub priority: TaskPriority,
    pub estimated_minutes: i64,
    pub completed: bool,
    pub date: NaiveDate,
    pub lang: String,
    pub sort_order: i32,
    pub created_at: String,
}

/// The user's chosen focus goals and free-text context for a week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub user_id: i64,
    pub week_start: NaiveDate,
    pub focus_goals: Vec<String>,
    pub context: serde_json::Value,
}

/// One interpreted goal from a vision-board analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalWithSteps {
    pub goal: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Externally produced vision-board analysis. Read-only input to the
/// legacy task-generation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionBoard {
    pub id: i64,
    pub user_id: i64,
    pub goals_with_steps: Vec<GoalWithSteps>,
    pub focus_areas: Vec<String>,
    pub created_at: String,
}

/// The authenticated user resolved from a session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Per-user personalization string produced by an external onboarding
    /// pipeline; prepended verbatim to completion prompts when present.
    pub instruction_profile: Option<String>,
}

// API view types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionsResponse {
    pub missions: Vec<DailyTask>,
    pub motivational_pulse: Option<String>,
    pub streak: u32,
    pub generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<DailyTask>,
    pub generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlanResponse {
    pub tasks: Vec<DailyTask>,
    pub core_count: usize,
    pub bonus_count: usize,
    pub generated: bool,
}
