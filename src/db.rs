use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::*;

/// Async-safe handle to the Mentiva database.
///
/// Wraps `MentivaDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<MentivaDb>>,
}

impl DbHandle {
    pub fn new(db: MentivaDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&MentivaDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

}

pub struct MentivaDb {
    conn: Connection,
}

/// Raw daily_tasks row before enum/date decoding.
struct TaskRow {
    id: i64,
    user_id: i64,
    task_text: String,
    enfoque_name: String,
    task_type: Option<String>,
    priority: String,
    estimated_minutes: i64,
    completed: bool,
    date: String,
    lang: String,
    sort_order: i32,
    created_at: String,
}

impl TaskRow {
    fn into_task(self) -> Result<DailyTask> {
        let task_type = match self.task_type {
            Some(s) => Some(
                TaskType::from_str(&s)
                    .map_err(|e| anyhow::anyhow!("Corrupt task_type in row {}: {}", self.id, e))?,
            ),
            None => None,
        };
        Ok(DailyTask {
            id: self.id,
            user_id: self.user_id,
            task_text: self.task_text,
            enfoque_name: self.enfoque_name,
            task_type,
            priority: TaskPriority::from_str(&self.priority)
                .map_err(|e| anyhow::anyhow!("Corrupt priority in row {}: {}", self.id, e))?,
            estimated_minutes: self.estimated_minutes,
            completed: self.completed,
            date: parse_date(&self.date)?,
            lang: self.lang,
            sort_order: self.sort_order,
            created_at: self.created_at,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.parse()
        .map_err(|e| anyhow::anyhow!("Corrupt date '{}': {}", s, e))
}

const TASK_COLUMNS: &str = "id, user_id, task_text, enfoque_name, task_type, priority, \
                            estimated_minutes, completed, date, lang, sort_order, created_at";

fn map_task_row(row: &rusqlite::Row) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        task_text: row.get(2)?,
        enfoque_name: row.get(3)?,
        task_type: row.get(4)?,
        priority: row.get(5)?,
        estimated_minutes: row.get(6)?,
        completed: row.get(7)?,
        date: row.get(8)?,
        lang: row.get(9)?,
        sort_order: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl MentivaDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL UNIQUE,
                    instruction_profile TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS allowlist (
                    email TEXT PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    token TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS north_stars (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    goal_text TEXT NOT NULL,
                    source_board_id INTEGER,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS enfoques (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    north_star_id INTEGER,
                    week_start TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS daily_tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    task_text TEXT NOT NULL,
                    enfoque_name TEXT NOT NULL DEFAULT 'General',
                    task_type TEXT,
                    priority TEXT NOT NULL DEFAULT 'medium',
                    estimated_minutes INTEGER NOT NULL DEFAULT 15,
                    completed INTEGER NOT NULL DEFAULT 0,
                    date TEXT NOT NULL,
                    lang TEXT NOT NULL DEFAULT 'en',
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS streaks (
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    non_negotiable_completed INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (user_id, date)
                );

                CREATE TABLE IF NOT EXISTS weekly_plans (
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    week_start TEXT NOT NULL,
                    focus_goals TEXT NOT NULL DEFAULT '[]',
                    context TEXT NOT NULL DEFAULT '{}',
                    PRIMARY KEY (user_id, week_start)
                );

                CREATE TABLE IF NOT EXISTS vision_boards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    goals_with_steps TEXT NOT NULL DEFAULT '[]',
                    focus_areas TEXT NOT NULL DEFAULT '[]',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_north_stars_active
                    ON north_stars(user_id, is_active);
                CREATE INDEX IF NOT EXISTS idx_enfoques_week
                    ON enfoques(user_id, week_start);
                CREATE INDEX IF NOT EXISTS idx_daily_tasks_date
                    ON daily_tasks(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_streaks_completed
                    ON streaks(user_id, non_negotiable_completed, date);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Users, sessions, allow-list ───────────────────────────────────

    pub fn create_user(&self, email: &str, instruction_profile: Option<&str>) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (email, instruction_profile) VALUES (?1, ?2)",
                params![email, instruction_profile],
            )
            .context("Failed to insert user")?;
        let id = self.conn.last_insert_rowid();
        self.get_user(id)?.context("User not found after insert")
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, email, instruction_profile FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        instruction_profile: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user")
    }

    pub fn allow_email(&self, email: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO allowlist (email) VALUES (?1)",
                params![email],
            )
            .context("Failed to insert allowlist entry")?;
        Ok(())
    }

    pub fn is_allowed(&self, email: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM allowlist WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .context("Failed to query allowlist")?;
        Ok(count > 0)
    }

    /// Create a session for a user and return its opaque token.
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token: String = {
            let mut rng = rand::thread_rng();
            (0..32)
                .map(|_| format!("{:x}", rng.gen_range(0..16u8)))
                .collect()
        };
        self.conn
            .execute(
                "INSERT INTO sessions (token, user_id) VALUES (?1, ?2)",
                params![token, user_id],
            )
            .context("Failed to insert session")?;
        Ok(token)
    }

    pub fn resolve_session(&self, token: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT u.id, u.email, u.instruction_profile
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        instruction_profile: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("Failed to resolve session")
    }

    // ── North star ────────────────────────────────────────────────────

    /// Replace the user's active north star: deactivate the prior one and
    /// insert the new one in a single transaction.
    pub fn set_north_star(
        &self,
        user_id: i64,
        goal_text: &str,
        source_board_id: Option<i64>,
    ) -> Result<NorthStar> {
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        tx.execute(
            "UPDATE north_stars SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            params![user_id],
        )
        .context("Failed to deactivate prior north star")?;
        tx.execute(
            "INSERT INTO north_stars (user_id, goal_text, source_board_id, is_active)
             VALUES (?1, ?2, ?3, 1)",
            params![user_id, goal_text, source_board_id],
        )
        .context("Failed to insert north star")?;
        let id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit north star replace")?;
        self.get_north_star(id)?
            .context("North star not found after insert")
    }

    fn get_north_star(&self, id: i64) -> Result<Option<NorthStar>> {
        self.conn
            .query_row(
                "SELECT id, user_id, goal_text, source_board_id, is_active, created_at
                 FROM north_stars WHERE id = ?1",
                params![id],
                map_north_star,
            )
            .optional()
            .context("Failed to query north star")
    }

    pub fn active_north_star(&self, user_id: i64) -> Result<Option<NorthStar>> {
        self.conn
            .query_row(
                "SELECT id, user_id, goal_text, source_board_id, is_active, created_at
                 FROM north_stars WHERE user_id = ?1 AND is_active = 1
                 ORDER BY id DESC LIMIT 1",
                params![user_id],
                map_north_star,
            )
            .optional()
            .context("Failed to query active north star")
    }

    pub fn north_star_history(&self, user_id: i64) -> Result<Vec<NorthStar>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, goal_text, source_board_id, is_active, created_at
                 FROM north_stars WHERE user_id = ?1 ORDER BY id DESC",
            )
            .context("Failed to prepare north_star_history")?;
        let rows = stmt
            .query_map(params![user_id], map_north_star)
            .context("Failed to query north star history")?;
        let mut stars = Vec::new();
        for row in rows {
            stars.push(row.context("Failed to read north star row")?);
        }
        Ok(stars)
    }

    // ── Enfoques ──────────────────────────────────────────────────────

    /// Replace the week's enfoque set wholesale, in a single transaction.
    /// The ≤3 cap is enforced at the API layer.
    pub fn replace_enfoques(
        &self,
        user_id: i64,
        week_start: NaiveDate,
        names: &[String],
        north_star_id: Option<i64>,
    ) -> Result<Vec<Enfoque>> {
        let week = week_start.to_string();
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        tx.execute(
            "DELETE FROM enfoques WHERE user_id = ?1 AND week_start = ?2",
            params![user_id, week],
        )
        .context("Failed to delete prior enfoques")?;
        for name in names {
            tx.execute(
                "INSERT INTO enfoques (user_id, name, north_star_id, week_start)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, name, north_star_id, week],
            )
            .context("Failed to insert enfoque")?;
        }
        tx.commit().context("Failed to commit enfoque replace")?;
        self.enfoques_for_week(user_id, week_start)
    }

    pub fn enfoques_for_week(&self, user_id: i64, week_start: NaiveDate) -> Result<Vec<Enfoque>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, name, north_star_id, week_start, created_at
                 FROM enfoques WHERE user_id = ?1 AND week_start = ?2 ORDER BY id",
            )
            .context("Failed to prepare enfoques_for_week")?;
        let rows = stmt
            .query_map(params![user_id, week_start.to_string()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .context("Failed to query enfoques")?;
        let mut enfoques = Vec::new();
        for row in rows {
            let (id, user_id, name, north_star_id, week, created_at) =
                row.context("Failed to read enfoque row")?;
            enfoques.push(Enfoque {
                id,
                user_id,
                name,
                north_star_id,
                week_start: parse_date(&week)?,
                created_at,
            });
        }
        Ok(enfoques)
    }

    // ── Daily tasks ───────────────────────────────────────────────────

    pub fn tasks_for_date(&self, user_id: i64, date: NaiveDate) -> Result<Vec<DailyTask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM daily_tasks WHERE user_id = ?1 AND date = ?2 ORDER BY sort_order, id",
                TASK_COLUMNS
            ))
            .context("Failed to prepare tasks_for_date")?;
        let rows = stmt
            .query_map(params![user_id, date.to_string()], map_task_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.context("Failed to read task row")?.into_task()?);
        }
        Ok(tasks)
    }

    /// Tasks in `[since, until)`, newest first.
    pub fn recent_tasks(
        &self,
        user_id: i64,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyTask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM daily_tasks
                 WHERE user_id = ?1 AND date >= ?2 AND date < ?3
                 ORDER BY date DESC, sort_order",
                TASK_COLUMNS
            ))
            .context("Failed to prepare recent_tasks")?;
        let rows = stmt
            .query_map(
                params![user_id, since.to_string(), until.to_string()],
                map_task_row,
            )
            .context("Failed to query recent tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.context("Failed to read task row")?.into_task()?);
        }
        Ok(tasks)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<DailyTask>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM daily_tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                map_task_row,
            )
            .optional()
            .context("Failed to query task")?;
        match row {
            Some(r) => Ok(Some(r.into_task()?)),
            None => Ok(None),
        }
    }

    pub fn delete_tasks_for_date(&self, user_id: i64, date: NaiveDate) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM daily_tasks WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.to_string()],
            )
            .context("Failed to delete tasks for date")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_task(
        &self,
        user_id: i64,
        task_text: &str,
        enfoque_name: &str,
        task_type: Option<TaskType>,
        priority: TaskPriority,
        estimated_minutes: i64,
        date: NaiveDate,
        lang: &str,
        sort_order: i32,
    ) -> Result<DailyTask> {
        self.conn
            .execute(
                "INSERT INTO daily_tasks
                 (user_id, task_text, enfoque_name, task_type, priority,
                  estimated_minutes, date, lang, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user_id,
                    task_text,
                    enfoque_name,
                    task_type.map(|t| t.as_str()),
                    priority.as_str(),
                    estimated_minutes,
                    date.to_string(),
                    lang,
                    sort_order
                ],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    /// Swap a task's text and duration in place, resetting completion.
    pub fn replace_task_text(
        &self,
        id: i64,
        task_text: &str,
        estimated_minutes: i64,
    ) -> Result<DailyTask> {
        self.conn
            .execute(
                "UPDATE daily_tasks
                 SET task_text = ?1, estimated_minutes = ?2, completed = 0
                 WHERE id = ?3",
                params![task_text, estimated_minutes, id],
            )
            .context("Failed to replace task text")?;
        self.get_task(id)?.context("Task not found after update")
    }

    pub fn set_task_completed(&self, id: i64, completed: bool) -> Result<DailyTask> {
        self.conn
            .execute(
                "UPDATE daily_tasks SET completed = ?1 WHERE id = ?2",
                params![completed, id],
            )
            .context("Failed to set task completed")?;
        self.get_task(id)?.context("Task not found after update")
    }

    // ── Streaks ───────────────────────────────────────────────────────

    pub fn upsert_streak_day(
        &self,
        user_id: i64,
        date: NaiveDate,
        completed: bool,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO streaks (user_id, date, non_negotiable_completed)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, date)
                 DO UPDATE SET non_negotiable_completed = excluded.non_negotiable_completed",
                params![user_id, date.to_string(), completed],
            )
            .context("Failed to upsert streak day")?;
        Ok(())
    }

    /// Dates whose non-negotiable was completed, newest first, capped at 60.
    pub fn completed_streak_days(&self, user_id: i64) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT date FROM streaks
                 WHERE user_id = ?1 AND non_negotiable_completed = 1
                 ORDER BY date DESC LIMIT 60",
            )
            .context("Failed to prepare completed_streak_days")?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .context("Failed to query streak days")?;
        let mut dates = Vec::new();
        for row in rows {
            dates.push(parse_date(&row.context("Failed to read streak row")?)?);
        }
        Ok(dates)
    }

    // ── Weekly plans ──────────────────────────────────────────────────

    pub fn upsert_weekly_plan(
        &self,
        user_id: i64,
        week_start: NaiveDate,
        focus_goals: &[String],
        context: &serde_json::Value,
    ) -> Result<WeeklyPlan> {
        let goals_json =
            serde_json::to_string(focus_goals).context("Failed to serialize focus goals")?;
        let context_json =
            serde_json::to_string(context).context("Failed to serialize plan context")?;
        self.conn
            .execute(
                "INSERT INTO weekly_plans (user_id, week_start, focus_goals, context)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, week_start)
                 DO UPDATE SET focus_goals = excluded.focus_goals, context = excluded.context",
                params![user_id, week_start.to_string(), goals_json, context_json],
            )
            .context("Failed to upsert weekly plan")?;
        self.weekly_plan_for(user_id, week_start)?
            .context("Weekly plan not found after upsert")
    }

    pub fn weekly_plan_for(
        &self,
        user_id: i64,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyPlan>> {
        let row = self
            .conn
            .query_row(
                "SELECT focus_goals, context FROM weekly_plans
                 WHERE user_id = ?1 AND week_start = ?2",
                params![user_id, week_start.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .context("Failed to query weekly plan")?;
        match row {
            Some((goals_json, context_json)) => Ok(Some(WeeklyPlan {
                user_id,
                week_start,
                focus_goals: serde_json::from_str(&goals_json)
                    .context("Corrupt focus_goals JSON")?,
                context: serde_json::from_str(&context_json)
                    .context("Corrupt plan context JSON")?,
            })),
            None => Ok(None),
        }
    }

    // ── Vision boards ─────────────────────────────────────────────────

    pub fn insert_vision_board(
        &self,
        user_id: i64,
        goals: &[GoalWithSteps],
        focus_areas: &[String],
    ) -> Result<i64> {
        let goals_json = serde_json::to_string(goals).context("Failed to serialize goals")?;
        let areas_json =
            serde_json::to_string(focus_areas).context("Failed to serialize focus areas")?;
        self.conn
            .execute(
                "INSERT INTO vision_boards (user_id, goals_with_steps, focus_areas)
                 VALUES (?1, ?2, ?3)",
                params![user_id, goals_json, areas_json],
            )
            .context("Failed to insert vision board")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The user's most recent boards, newest first.
    pub fn recent_vision_boards(&self, user_id: i64, limit: usize) -> Result<Vec<VisionBoard>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, goals_with_steps, focus_areas, created_at
                 FROM vision_boards WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .context("Failed to prepare recent_vision_boards")?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("Failed to query vision boards")?;
        let mut boards = Vec::new();
        for row in rows {
            let (id, user_id, goals_json, areas_json, created_at) =
                row.context("Failed to read vision board row")?;
            boards.push(VisionBoard {
                id,
                user_id,
                goals_with_steps: serde_json::from_str(&goals_json)
                    .context("Corrupt goals_with_steps JSON")?,
                focus_areas: serde_json::from_str(&areas_json)
                    .context("Corrupt focus_areas JSON")?,
                created_at,
            });
        }
        Ok(boards)
    }
}

fn map_north_star(row: &rusqlite::Row) -> rusqlite::Result<NorthStar> {
    Ok(NorthStar {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_text: row.get(2)?,
        source_board_id: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}
