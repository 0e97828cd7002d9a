use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the service indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub department: String,
    pub admission_year: i64,
    /// `"student"` or `"counselor"`.
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ScheduleRow {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub title: String,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: i64,
    /// `"HH:MM"`, 24-hour clock.
    pub starts_at: String,
    pub ends_at: String,
    pub location: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct GradeRow {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub course_title: String,
    /// `"YYYY-N"` where N is 1 or 2.
    pub semester: String,
    pub credits: i64,
    /// Letter on the 4.5 scale (`A+` … `F`) or `P` for pass/fail courses.
    pub grade: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ActivityRow {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    /// `"YYYY-MM-DD"`.
    pub occurred_on: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct QuestionRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

/// Question with its answer count, for list views (answered = count > 0).
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct QuestionListRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
    pub answer_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct AnswerRow {
    pub id: String,
    pub question_id: String,
    pub counselor_id: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("campusd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            use sqlx::ConnectOptions as _;
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    /// Insert a new user. `email` is stored lowercased; the UNIQUE constraint
    /// on it surfaces as an error the caller maps to a conflict response.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        department: &str,
        admission_year: i64,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, department, admission_year, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 'student', ?)",
        )
        .bind(&id)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(name)
        .bind(department)
        .bind(admission_year)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Change a user's role by email. Returns `false` when no such user exists.
    pub async fn set_user_role(&self, email: &str, role: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE email = ?")
            .bind(role)
            .bind(email.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_users(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    // ─── Schedules ──────────────────────────────────────────────────────────

    pub async fn create_schedule(
        &self,
        user_id: &str,
        title: &str,
        day_of_week: i64,
        starts_at: &str,
        ends_at: &str,
        location: Option<&str>,
    ) -> Result<ScheduleRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO schedules (id, user_id, title, day_of_week, starts_at, ends_at, location, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(day_of_week)
        .bind(starts_at)
        .bind(ends_at)
        .bind(location)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_schedule(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("schedule not found after insert"))
    }

    pub async fn get_schedule(&self, id: &str) -> Result<Option<ScheduleRow>> {
        Ok(sqlx::query_as("SELECT * FROM schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_schedules(&self, user_id: &str) -> Result<Vec<ScheduleRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM schedules WHERE user_id = ? ORDER BY day_of_week ASC, starts_at ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn list_schedules_for_day(
        &self,
        user_id: &str,
        day_of_week: i64,
    ) -> Result<Vec<ScheduleRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM schedules WHERE user_id = ? AND day_of_week = ? ORDER BY starts_at ASC",
        )
        .bind(user_id)
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Delete a schedule entry owned by `user_id`. The owner check lives in
    /// the WHERE clause so one user can never delete another user's rows.
    /// Returns `false` when nothing matched.
    pub async fn delete_schedule(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Grades ─────────────────────────────────────────────────────────────

    pub async fn create_grade(
        &self,
        user_id: &str,
        course_title: &str,
        semester: &str,
        credits: i64,
        grade: &str,
    ) -> Result<GradeRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO grades (id, user_id, course_title, semester, credits, grade, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(course_title)
        .bind(semester)
        .bind(credits)
        .bind(grade)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_grade(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("grade not found after insert"))
    }

    pub async fn get_grade(&self, id: &str) -> Result<Option<GradeRow>> {
        Ok(sqlx::query_as("SELECT * FROM grades WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// List grades newest semester first; `semester = Some(..)` filters to one term.
    pub async fn list_grades(
        &self,
        user_id: &str,
        semester: Option<&str>,
    ) -> Result<Vec<GradeRow>> {
        with_timeout(async {
            let rows = if let Some(sem) = semester {
                sqlx::query_as(
                    "SELECT * FROM grades WHERE user_id = ? AND semester = ?
                     ORDER BY course_title ASC",
                )
                .bind(user_id)
                .bind(sem)
                .fetch_all(&self.pool)
                .await?
            } else {
                sqlx::query_as(
                    "SELECT * FROM grades WHERE user_id = ?
                     ORDER BY semester DESC, course_title ASC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            };
            Ok(rows)
        })
        .await
    }

    pub async fn delete_grade(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM grades WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Activities ─────────────────────────────────────────────────────────

    pub async fn create_activity(
        &self,
        user_id: &str,
        title: &str,
        category: &str,
        description: Option<&str>,
        occurred_on: &str,
    ) -> Result<ActivityRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO activities (id, user_id, title, category, description, occurred_on, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(category)
        .bind(description)
        .bind(occurred_on)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_activity(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("activity not found after insert"))
    }

    pub async fn get_activity(&self, id: &str) -> Result<Option<ActivityRow>> {
        Ok(sqlx::query_as("SELECT * FROM activities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_activities(&self, user_id: &str) -> Result<Vec<ActivityRow>> {
        Ok(sqlx::query_as(
            "SELECT * FROM activities WHERE user_id = ? ORDER BY occurred_on DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn delete_activity(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM activities WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Counseling ─────────────────────────────────────────────────────────

    pub async fn create_question(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<QuestionRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO questions (id, user_id, title, body, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_question(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("question not found after insert"))
    }

    pub async fn get_question(&self, id: &str) -> Result<Option<QuestionRow>> {
        Ok(sqlx::query_as("SELECT * FROM questions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Questions authored by `user_id`, newest first, with answer counts.
    pub async fn list_questions(&self, user_id: &str) -> Result<Vec<QuestionListRow>> {
        Ok(sqlx::query_as(
            "SELECT q.id, q.user_id, q.title, q.created_at,
                    (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answer_count
             FROM questions q WHERE q.user_id = ? ORDER BY q.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// All questions across users (counselor inbox), unanswered first.
    pub async fn list_all_questions(&self, limit: i64) -> Result<Vec<QuestionListRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT q.id, q.user_id, q.title, q.created_at,
                        (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answer_count
                 FROM questions q ORDER BY answer_count ASC, q.created_at DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    pub async fn create_answer(
        &self,
        question_id: &str,
        counselor_id: &str,
        body: &str,
    ) -> Result<AnswerRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO answers (id, question_id, counselor_id, body, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(question_id)
        .bind(counselor_id)
        .bind(body)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(AnswerRow {
            id,
            question_id: question_id.to_string(),
            counselor_id: counselor_id.to_string(),
            body: body.to_string(),
            created_at: now,
        })
    }

    pub async fn list_answers(&self, question_id: &str) -> Result<Vec<AnswerRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM answers WHERE question_id = ? ORDER BY created_at ASC")
                .bind(question_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Number of this user's questions that have no answer yet (dashboard badge).
    pub async fn count_unanswered(&self, user_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM questions q
             WHERE q.user_id = ?
               AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    // ─── Maintenance ────────────────────────────────────────────────────────

    /// Delete answered questions older than `days` days and return the count.
    /// Pass `0` to skip pruning. Answers go with them via ON DELETE CASCADE.
    pub async fn prune_answered_questions(&self, days: u32) -> Result<u64> {
        if days == 0 {
            return Ok(0);
        }
        with_timeout(async {
            let cutoff = (Utc::now() - chrono::Duration::days(days as i64)).to_rfc3339();
            let n = sqlx::query(
                "DELETE FROM questions WHERE created_at < ?
                 AND EXISTS (SELECT 1 FROM answers a WHERE a.question_id = questions.id)",
            )
            .bind(&cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();
            Ok(n)
        })
        .await
    }

    /// Run SQLite VACUUM to reclaim disk space after pruning.
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    // ─── Settings ───────────────────────────────────────────────────────────

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v))
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
