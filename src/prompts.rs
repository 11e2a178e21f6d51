//! Prompt templates for the completion service.
//!
//! Pure string builders: no I/O, no execution. Determinism of the output
//! string is guaranteed; determinism of what the model does with it is not.

use crate::models::{DailyTask, GoalWithSteps};

/// How many history lines we embed per bucket before truncating.
const HISTORY_LIMIT: usize = 10;

/// System prompt for the daily missions shape.
pub const MISSIONS_SYSTEM_PROMPT: &str = r#"You are a daily planning coach. Produce today's three missions for the user.

You MUST respond with valid JSON only (no markdown, no explanation) matching this schema:
{
  "missions": [
    {
      "task_text": "One concrete action the user can finish today",
      "task_type": "non_negotiable" | "secondary" | "micro",
      "enfoque_name": "One of the user's focus areas",
      "estimated_minutes": 25
    }
  ],
  "motivational_pulse": "One short encouraging sentence"
}

Rules:
- Exactly three missions: one non_negotiable, one secondary, one micro.
- The non_negotiable is the single most important action toward the North Star.
- The micro mission takes five minutes or less.
- estimated_minutes is an integer between 1 and 60.
- Every mission names one of the user's focus areas as enfoque_name.
- Write task_text and motivational_pulse in the requested language.
"#;

/// System prompt for the legacy flat-task shape.
pub const BOARD_TASKS_SYSTEM_PROMPT: &str = r#"You are a daily planning coach. Turn the user's vision-board goals into today's task list.

You MUST respond with valid JSON only (no markdown, no explanation): an array of 3 to 5 tasks:
[
  {
    "task_text": "One concrete action",
    "goal_name": "The goal or focus area it serves",
    "priority": "high" | "medium" | "low",
    "estimated_minutes": 25
  }
]

Rules:
- 3 to 5 tasks, each finishable today.
- estimated_minutes is an integer between 1 and 60.
- Write task_text in the requested language.
"#;

/// System prompt for the single-task swap shape.
pub const SWAP_SYSTEM_PROMPT: &str = r#"You are a daily planning coach. Produce one replacement task.

You MUST respond with valid JSON only (no markdown, no explanation):
{"task_text": "One concrete action", "estimated_minutes": 25}

Rules:
- The task must be different from every excluded task.
- estimated_minutes is an integer between 1 and 60.
- Write task_text in the requested language.
"#;

/// Everything the missions prompt interpolates.
pub struct MissionsPromptInput<'a> {
    pub north_star: &'a str,
    pub enfoques: &'a [String],
    /// Per-focus-area free text from the week's plan, as (name, note) pairs.
    pub plan_notes: &'a [(String, String)],
    pub day_label: &'a str,
    pub is_weekend: bool,
    /// Task texts completed over the last 7 days.
    pub completed_recently: &'a [String],
    /// Task texts skipped over the last 7 days.
    pub skipped_recently: &'a [String],
    /// Task texts skipped two or more times; the model is told to shrink these.
    pub often_skipped: &'a [String],
    pub streak: u32,
    pub lang: &'a str,
    pub instruction_profile: Option<&'a str>,
}

/// Build the user prompt for daily missions generation.
pub fn missions_prompt(input: &MissionsPromptInput) -> String {
    let mut prompt = String::new();

    if let Some(profile) = input.instruction_profile {
        prompt.push_str(profile);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Plan today's three missions.\n\n");

    prompt.push_str(&format!("## North Star\n{}\n\n", input.north_star));

    prompt.push_str("## This Week's Focus Areas\n");
    for enfoque in input.enfoques {
        prompt.push_str(&format!("- {}\n", enfoque));
    }
    prompt.push('\n');

    if !input.plan_notes.is_empty() {
        prompt.push_str("## Focus Area Notes\n");
        for (name, note) in input.plan_notes {
            prompt.push_str(&format!("- {}: {}\n", name, note));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("## Today\n{}", input.day_label));
    if input.is_weekend {
        prompt.push_str(" (weekend: keep the missions lighter and shorter than on a weekday)");
    }
    prompt.push_str("\n\n");

    if !input.completed_recently.is_empty() || !input.skipped_recently.is_empty() {
        prompt.push_str("## Last 7 Days\n");
        push_history(&mut prompt, "Completed", input.completed_recently);
        push_history(&mut prompt, "Skipped", input.skipped_recently);
        prompt.push('\n');
    }

    if !input.often_skipped.is_empty() {
        prompt.push_str(
            "## Repeatedly Skipped\nThese keep getting skipped; make any similar mission \
             smaller and easier to start:\n",
        );
        for text in input.often_skipped.iter().take(HISTORY_LIMIT) {
            prompt.push_str(&format!("- {}\n", text));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("## Current Streak\n{} days\n\n", input.streak));
    prompt.push_str(&format!("## Output Language\n{}\n", input.lang));

    prompt
}

fn push_history(prompt: &mut String, label: &str, texts: &[String]) {
    if texts.is_empty() {
        return;
    }
    prompt.push_str(&format!("{}:\n", label));
    for text in texts.iter().take(HISTORY_LIMIT) {
        prompt.push_str(&format!("- {}\n", text));
    }
    if texts.len() > HISTORY_LIMIT {
        prompt.push_str(&format!("- (and {} more)\n", texts.len() - HISTORY_LIMIT));
    }
}

/// Build the user prompt for swapping out a single task.
pub fn swap_prompt(task: &DailyTask, exclude: &[String], lang: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Replace this task with a different one serving the same focus area \
         (\"{}\"):\n{}\n\n",
        task.enfoque_name, task.task_text
    ));

    prompt.push_str("## Excluded (today's other tasks, do not repeat any of these)\n");
    for text in exclude {
        prompt.push_str(&format!("- {}\n", text));
    }
    prompt.push('\n');

    prompt.push_str(&format!("## Output Language\n{}\n", lang));
    prompt
}

/// Build the user prompt for the legacy vision-board task path.
pub fn board_tasks_prompt(
    goals: &[GoalWithSteps],
    focus_areas: &[String],
    day_label: &str,
    is_weekend: bool,
    lang: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("Create today's task list from the user's vision-board goals.\n\n");

    prompt.push_str("## Goals\n");
    for goal in goals {
        if goal.area.is_empty() {
            prompt.push_str(&format!("- {}\n", goal.goal));
        } else {
            prompt.push_str(&format!("- {} ({})\n", goal.goal, goal.area));
        }
        for step in goal.steps.iter().take(5) {
            prompt.push_str(&format!("  - {}\n", step));
        }
    }
    prompt.push('\n');

    if !focus_areas.is_empty() {
        prompt.push_str("## Focus Areas\n");
        for area in focus_areas {
            prompt.push_str(&format!("- {}\n", area));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("## Today\n{}", day_label));
    if is_weekend {
        prompt.push_str(" (weekend: suggest fewer, lighter tasks)");
    }
    prompt.push_str("\n\n");

    prompt.push_str(&format!("## Output Language\n{}\n", lang));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskType};

    fn base_input<'a>(enfoques: &'a [String]) -> MissionsPromptInput<'a> {
        MissionsPromptInput {
            north_star: "Launch my bakery",
            enfoques,
            plan_notes: &[],
            day_label: "Tuesday",
            is_weekend: false,
            completed_recently: &[],
            skipped_recently: &[],
            often_skipped: &[],
            streak: 4,
            lang: "en",
            instruction_profile: None,
        }
    }

    #[test]
    fn test_missions_prompt_contains_state() {
        let enfoques = vec!["Recipes".to_string(), "Marketing".to_string()];
        let prompt = missions_prompt(&base_input(&enfoques));
        assert!(prompt.contains("Launch my bakery"));
        assert!(prompt.contains("- Recipes"));
        assert!(prompt.contains("- Marketing"));
        assert!(prompt.contains("Tuesday"));
        assert!(prompt.contains("4 days"));
        assert!(!prompt.contains("weekend"));
    }

    #[test]
    fn test_weekend_flag_changes_instruction() {
        let enfoques = vec!["Recipes".to_string()];
        let mut input = base_input(&enfoques);
        input.day_label = "Saturday";
        input.is_weekend = true;
        let prompt = missions_prompt(&input);
        assert!(prompt.contains("weekend"));
    }

    #[test]
    fn test_plan_notes_section() {
        let enfoques = vec!["Recipes".to_string(), "Marketing".to_string()];
        let notes = vec![(
            "Marketing".to_string(),
            "Focus on the farmers market stall".to_string(),
        )];
        let mut input = base_input(&enfoques);
        input.plan_notes = &notes;
        let prompt = missions_prompt(&input);
        assert!(prompt.contains("Focus Area Notes"));
        assert!(prompt.contains("- Marketing: Focus on the farmers market stall"));
    }

    #[test]
    fn test_instruction_profile_is_prepended_verbatim() {
        let enfoques = vec!["Recipes".to_string()];
        let mut input = base_input(&enfoques);
        input.instruction_profile = Some("Address the user as Captain.");
        let prompt = missions_prompt(&input);
        assert!(prompt.starts_with("Address the user as Captain.\n\n"));
    }

    #[test]
    fn test_history_is_truncated() {
        let enfoques = vec!["Recipes".to_string()];
        let completed: Vec<String> = (0..15).map(|i| format!("task {}", i)).collect();
        let mut input = base_input(&enfoques);
        input.completed_recently = &completed;
        let prompt = missions_prompt(&input);
        assert!(prompt.contains("task 9"));
        assert!(!prompt.contains("task 10"));
        assert!(prompt.contains("(and 5 more)"));
    }

    #[test]
    fn test_often_skipped_section() {
        let enfoques = vec!["Recipes".to_string()];
        let skipped = vec!["Cold-call ten suppliers".to_string()];
        let mut input = base_input(&enfoques);
        input.often_skipped = &skipped;
        let prompt = missions_prompt(&input);
        assert!(prompt.contains("Repeatedly Skipped"));
        assert!(prompt.contains("Cold-call ten suppliers"));
    }

    #[test]
    fn test_swap_prompt_lists_exclusions() {
        let task = DailyTask {
            id: 1,
            user_id: 1,
            task_text: "Draft an Instagram post".into(),
            enfoque_name: "Marketing".into(),
            task_type: Some(TaskType::Secondary),
            priority: TaskPriority::Medium,
            estimated_minutes: 20,
            completed: false,
            date: "2026-08-29".parse().unwrap(),
            lang: "en".into(),
            sort_order: 1,
            created_at: String::new(),
        };
        let exclude = vec!["Test three recipes".to_string()];
        let prompt = swap_prompt(&task, &exclude, "en");
        assert!(prompt.contains("Draft an Instagram post"));
        assert!(prompt.contains("- Test three recipes"));
        assert!(prompt.contains("Marketing"));
    }

    #[test]
    fn test_board_tasks_prompt_embeds_goals_and_steps() {
        let goals = vec![GoalWithSteps {
            goal: "Run a marathon".into(),
            area: "Health".into(),
            steps: vec!["Run 5k three times a week".into()],
        }];
        let areas = vec!["Discipline".to_string()];
        let prompt = board_tasks_prompt(&goals, &areas, "Sunday", true, "es");
        assert!(prompt.contains("Run a marathon (Health)"));
        assert!(prompt.contains("Run 5k three times a week"));
        assert!(prompt.contains("- Discipline"));
        assert!(prompt.contains("weekend"));
        assert!(prompt.contains("es"));
    }

    #[test]
    fn test_system_prompts_demand_json_only() {
        for p in [
            MISSIONS_SYSTEM_PROMPT,
            BOARD_TASKS_SYSTEM_PROMPT,
            SWAP_SYSTEM_PROMPT,
        ] {
            assert!(p.contains("valid JSON only"));
        }
    }
}
