//! Plan/task orchestration.
//!
//! For a given user and "today", guarantees that exactly one coherent task
//! set exists in the store and returns it. Also hosts the single-task swap
//! flow, the legacy vision-board generation path, and the combined
//! completion/streak toggle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use crate::clock::{self, CalendarClock};
use crate::completion::CompletionBackend;
use crate::db::DbHandle;
use crate::errors::AppError;
use crate::models::*;
use crate::parser::{self, ParsedMissions};
use crate::prompts::{self, MissionsPromptInput};
use crate::streak;

const MISSIONS_MAX_TOKENS: u32 = 1200;
const BOARD_TASKS_MAX_TOKENS: u32 = 900;
const SWAP_MAX_TOKENS: u32 = 300;

/// How far back task history is gathered for prompt context.
const HISTORY_DAYS: u64 = 7;
/// How many recent vision boards feed the legacy path.
const BOARD_LIMIT: usize = 5;

pub struct Orchestrator {
    db: DbHandle,
    completion: Arc<dyn CompletionBackend>,
    clock: Arc<dyn CalendarClock>,
}

impl Orchestrator {
    pub fn new(
        db: DbHandle,
        completion: Arc<dyn CompletionBackend>,
        clock: Arc<dyn CalendarClock>,
    ) -> Self {
        Self {
            db,
            completion,
            clock,
        }
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Ensure exactly one coherent mission set exists for (user, today).
    ///
    /// Idempotent unless `force` is set or the stored language differs from
    /// the requested one. A parse failure after the deletion in the
    /// regenerate path leaves the user with zero tasks for the day; that is
    /// accepted rather than retried beyond the single re-ask.
    pub async fn ensure_today_tasks(
        &self,
        user: &User,
        lang: &str,
        force: bool,
    ) -> Result<MissionsResponse, AppError> {
        let today = self.clock.today();
        let user_id = user.id;

        if !force {
            let existing = self
                .db
                .call(move |db| db.tasks_for_date(user_id, today))
                .await
                .map_err(AppError::Database)?;
            if !existing.is_empty() && existing.iter().all(|t| t.lang == lang) {
                let streak = self.current_streak(user_id).await?;
                return Ok(MissionsResponse {
                    missions: existing,
                    motivational_pulse: None,
                    streak,
                    generated: false,
                });
            }
        }

        // From here on a failure can leave the day empty; the delete comes
        // first so a failed regeneration never leaves a mixed old/new set.
        self.db
            .call(move |db| db.delete_tasks_for_date(user_id, today))
            .await
            .map_err(AppError::Database)?;

        let north_star = self
            .db
            .call(move |db| db.active_north_star(user_id))
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NoNorthStar)?;

        let week = clock::week_start(today);
        let (enfoques, plan) = self
            .db
            .call(move |db| {
                Ok((
                    db.enfoques_for_week(user_id, week)?,
                    db.weekly_plan_for(user_id, week)?,
                ))
            })
            .await
            .map_err(AppError::Database)?;
        if enfoques.is_empty() {
            return Err(AppError::NoEnfoques);
        }
        let enfoque_names: Vec<String> = enfoques.iter().map(|e| e.name.clone()).collect();
        let plan_notes = plan.map(|p| plan_notes(&p.context)).unwrap_or_default();

        let since = today - Days::new(HISTORY_DAYS);
        let history = self
            .db
            .call(move |db| db.recent_tasks(user_id, since, today))
            .await
            .map_err(AppError::Database)?;
        let (completed, skipped) = split_history(&history);
        let often_skipped = repeatedly_skipped(&skipped);

        let streak = self.current_streak(user_id).await?;

        let prompt = prompts::missions_prompt(&MissionsPromptInput {
            north_star: &north_star.goal_text,
            enfoques: &enfoque_names,
            plan_notes: &plan_notes,
            day_label: clock::day_label(today),
            is_weekend: clock::is_weekend(today),
            completed_recently: &completed,
            skipped_recently: &skipped,
            often_skipped: &often_skipped,
            streak,
            lang,
            instruction_profile: user.instruction_profile.as_deref(),
        });

        let parsed = self.generate_missions(&prompt, &enfoque_names).await?;

        let lang_owned = lang.to_string();
        let missions_to_insert = parsed.missions.clone();
        let missions = self
            .db
            .call(move |db| {
                let mut inserted = Vec::with_capacity(3);
                for mission in &missions_to_insert {
                    inserted.push(db.insert_task(
                        user_id,
                        &mission.task_text,
                        &mission.enfoque_name,
                        Some(mission.task_type),
                        TaskPriority::Medium,
                        mission.estimated_minutes,
                        today,
                        &lang_owned,
                        mission.task_type.sort_order(),
                    )?);
                }
                // A fresh day starts not-yet-done.
                db.upsert_streak_day(user_id, today, false)?;
                Ok(inserted)
            })
            .await
            .map_err(AppError::Database)?;

        info!(user = user_id, %today, "generated daily missions");

        Ok(MissionsResponse {
            missions,
            motivational_pulse: parsed.motivational_pulse,
            streak,
            generated: true,
        })
    }

    /// One completion call plus a single re-ask when the payload fails
    /// strict validation.
    async fn generate_missions(
        &self,
        prompt: &str,
        enfoque_names: &[String],
    ) -> Result<ParsedMissions, AppError> {
        let raw = self
            .completion
            .complete(prompts::MISSIONS_SYSTEM_PROMPT, prompt, MISSIONS_MAX_TOKENS)
            .await
            .map_err(AppError::Upstream)?;

        match parser::parse_missions(&raw, enfoque_names) {
            Ok(parsed) => Ok(parsed),
            Err(AppError::GenerationParse(reason)) => {
                warn!(%reason, raw = %raw, "missions payload failed validation, re-asking once");
                let raw = self
                    .completion
                    .complete(prompts::MISSIONS_SYSTEM_PROMPT, prompt, MISSIONS_MAX_TOKENS)
                    .await
                    .map_err(AppError::Upstream)?;
                parser::parse_missions(&raw, enfoque_names).inspect_err(|e| {
                    warn!(error = %e, raw = %raw, "missions payload failed validation twice");
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Regenerate a single non-"non_negotiable" task in place.
    pub async fn swap_task(
        &self,
        user: &User,
        task_id: i64,
        lang: &str,
    ) -> Result<DailyTask, AppError> {
        let user_id = user.id;
        let task = self
            .db
            .call(move |db| db.get_task(task_id))
            .await
            .map_err(AppError::Database)?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Task {}", task_id)))?;

        if task.task_type == Some(TaskType::NonNegotiable) {
            return Err(AppError::ImmutableTask);
        }

        let date = task.date;
        let exclude: Vec<String> = self
            .db
            .call(move |db| db.tasks_for_date(user_id, date))
            .await
            .map_err(AppError::Database)?
            .into_iter()
            .filter(|t| t.id != task_id)
            .map(|t| t.task_text)
            .collect();

        let prompt = prompts::swap_prompt(&task, &exclude, lang);
        let raw = self
            .completion
            .complete(prompts::SWAP_SYSTEM_PROMPT, &prompt, SWAP_MAX_TOKENS)
            .await
            .map_err(AppError::Upstream)?;
        let (text, minutes) = parser::parse_replacement_task(&raw)?;

        self.db
            .call(move |db| db.replace_task_text(task_id, &text, minutes))
            .await
            .map_err(AppError::Database)
    }

    /// Legacy path: build today's tasks straight from recent vision-board
    /// goals, ignoring north star and enfoques entirely.
    pub async fn tasks_from_boards(
        &self,
        user: &User,
        lang: &str,
    ) -> Result<TasksResponse, AppError> {
        let today = self.clock.today();
        let user_id = user.id;

        let boards = self
            .db
            .call(move |db| db.recent_vision_boards(user_id, BOARD_LIMIT))
            .await
            .map_err(AppError::Database)?;

        let goals: Vec<GoalWithSteps> = boards
            .iter()
            .flat_map(|b| b.goals_with_steps.iter().cloned())
            .collect();
        let mut focus_areas: Vec<String> = Vec::new();
        for board in &boards {
            for area in &board.focus_areas {
                if !focus_areas.contains(area) {
                    focus_areas.push(area.clone());
                }
            }
        }
        if goals.is_empty() && focus_areas.is_empty() {
            return Err(AppError::validation(
                "No vision board goals to generate tasks from",
            ));
        }

        let prompt = prompts::board_tasks_prompt(
            &goals,
            &focus_areas,
            clock::day_label(today),
            clock::is_weekend(today),
            lang,
        );

        let raw = self
            .completion
            .complete(prompts::BOARD_TASKS_SYSTEM_PROMPT, &prompt, BOARD_TASKS_MAX_TOKENS)
            .await
            .map_err(AppError::Upstream)?;
        let parsed = match parser::parse_flat_tasks(&raw) {
            Ok(tasks) => tasks,
            Err(AppError::GenerationParse(reason)) => {
                warn!(%reason, raw = %raw, "task payload failed validation, re-asking once");
                let raw = self
                    .completion
                    .complete(prompts::BOARD_TASKS_SYSTEM_PROMPT, &prompt, BOARD_TASKS_MAX_TOKENS)
                    .await
                    .map_err(AppError::Upstream)?;
                parser::parse_flat_tasks(&raw)?
            }
            Err(other) => return Err(other),
        };

        let lang_owned = lang.to_string();
        let tasks = self
            .db
            .call(move |db| {
                db.delete_tasks_for_date(user_id, today)?;
                let mut inserted = Vec::with_capacity(parsed.len());
                for (i, task) in parsed.iter().enumerate() {
                    inserted.push(db.insert_task(
                        user_id,
                        &task.task_text,
                        &task.goal_name,
                        None,
                        task.priority,
                        task.estimated_minutes,
                        today,
                        &lang_owned,
                        i as i32,
                    )?);
                }
                Ok(inserted)
            })
            .await
            .map_err(AppError::Database)?;

        info!(user = user_id, %today, count = tasks.len(), "generated board tasks");

        Ok(TasksResponse {
            tasks,
            generated: true,
        })
    }

    /// Toggle a task's completion. When the task is the day's
    /// non-negotiable, the streak row for that date is updated in the same
    /// operation so the two never drift apart.
    pub async fn toggle_completion(
        &self,
        user: &User,
        task_id: i64,
    ) -> Result<(DailyTask, u32), AppError> {
        let user_id = user.id;
        let task = self
            .db
            .call(move |db| db.get_task(task_id))
            .await
            .map_err(AppError::Database)?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Task {}", task_id)))?;

        let completed = !task.completed;
        let is_non_negotiable = task.task_type == Some(TaskType::NonNegotiable);
        let date = task.date;
        let task = self
            .db
            .call(move |db| {
                let task = db.set_task_completed(task_id, completed)?;
                if is_non_negotiable {
                    db.upsert_streak_day(user_id, date, completed)?;
                }
                Ok(task)
            })
            .await
            .map_err(AppError::Database)?;

        let streak = self.current_streak(user_id).await?;
        Ok((task, streak))
    }

    pub async fn current_streak(&self, user_id: i64) -> Result<u32, AppError> {
        let today = self.clock.today();
        let dates = self
            .db
            .call(move |db| db.completed_streak_days(user_id))
            .await
            .map_err(AppError::Database)?;
        Ok(streak::current_streak(&dates, today))
    }
}

/// Flatten the weekly plan's context object into (focus area, note) pairs,
/// keeping only non-empty string values.
fn plan_notes(context: &serde_json::Value) -> Vec<(String, String)> {
    let Some(map) = context.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(name, value)| {
            value
                .as_str()
                .filter(|note| !note.trim().is_empty())
                .map(|note| (name.clone(), note.to_string()))
        })
        .collect()
}

/// Split recent task history into completed and skipped texts.
fn split_history(history: &[DailyTask]) -> (Vec<String>, Vec<String>) {
    let mut completed = Vec::new();
    let mut skipped = Vec::new();
    for task in history {
        if task.completed {
            completed.push(task.task_text.clone());
        } else {
            skipped.push(task.task_text.clone());
        }
    }
    (completed, skipped)
}

/// Texts skipped two or more times over the history window.
fn repeatedly_skipped(skipped: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for text in skipped {
        *counts.entry(text.as_str()).or_default() += 1;
    }
    let mut result: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n >= 2)
        .map(|(text, _)| text.to_string())
        .collect();
    result.sort();
    result
}
