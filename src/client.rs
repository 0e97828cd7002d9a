//! Lightweight HTTP client for the REST API.
//!
//! One method per endpoint, JSON in and out. `login` and `register` stash
//! the returned token so later calls authenticate automatically. Exercised
//! end to end against a live server in `tests/client_test.rs`; app
//! frontends speak the same API directly.

use anyhow::{anyhow, Context as _, Result};
use serde_json::{json, Value};
use std::time::Duration;

pub struct PlannerClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl PlannerClient {
    /// Create a client targeting `base_url` (e.g. `http://127.0.0.1:4500`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            token: None,
        })
    }

    /// Use a previously issued token instead of logging in.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Unwrap the API envelope: 2xx returns the JSON body, anything else
    /// becomes an error carrying the server's `error.code` and message.
    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("non-JSON response (status {status})"))?;
        if status.is_success() {
            return Ok(body);
        }
        let code = body["error"]["code"].as_str().unwrap_or("UNKNOWN");
        let message = body["error"]["message"].as_str().unwrap_or("");
        Err(anyhow!("{code}: {message} (status {status})"))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let mut req = self.http.get(self.url(path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Self::decode(req.send().await?).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let mut req = self.http.post(self.url(path)).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Self::decode(req.send().await?).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let mut req = self.http.delete(self.url(path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Self::decode(req.send().await?).await
    }

    fn store_token(&mut self, body: &Value) {
        if let Some(token) = body["token"].as_str() {
            self.token = Some(token.to_string());
        }
    }

    // ─── Health ─────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<Value> {
        self.get("/health").await
    }

    // ─── Auth ───────────────────────────────────────────────────────────────

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        department: &str,
        admission_year: i64,
    ) -> Result<Value> {
        let body = self
            .post(
                "/auth/register",
                json!({
                    "email": email,
                    "password": password,
                    "name": name,
                    "department": department,
                    "admission_year": admission_year,
                }),
            )
            .await?;
        self.store_token(&body);
        Ok(body)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Value> {
        let body = self
            .post(
                "/auth/login",
                json!({ "email": email, "password": password }),
            )
            .await?;
        self.store_token(&body);
        Ok(body)
    }

    pub async fn me(&self) -> Result<Value> {
        self.get("/auth/me").await
    }

    // ─── Schedules ──────────────────────────────────────────────────────────

    pub async fn schedules(&self) -> Result<Value> {
        self.get("/schedules").await
    }

    pub async fn schedules_today(&self) -> Result<Value> {
        self.get("/schedules/today").await
    }

    pub async fn create_schedule(
        &self,
        title: &str,
        day_of_week: i64,
        starts_at: &str,
        ends_at: &str,
        location: Option<&str>,
    ) -> Result<Value> {
        self.post(
            "/schedules",
            json!({
                "title": title,
                "day_of_week": day_of_week,
                "starts_at": starts_at,
                "ends_at": ends_at,
                "location": location,
            }),
        )
        .await
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/schedules/{id}")).await
    }

    // ─── Grades ─────────────────────────────────────────────────────────────

    pub async fn grades(&self, semester: Option<&str>) -> Result<Value> {
        match semester {
            Some(sem) => self.get(&format!("/grades?semester={sem}")).await,
            None => self.get("/grades").await,
        }
    }

    pub async fn create_grade(
        &self,
        course_title: &str,
        semester: &str,
        credits: i64,
        grade: &str,
    ) -> Result<Value> {
        self.post(
            "/grades",
            json!({
                "course_title": course_title,
                "semester": semester,
                "credits": credits,
                "grade": grade,
            }),
        )
        .await
    }

    pub async fn delete_grade(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/grades/{id}")).await
    }

    pub async fn grade_summary(&self) -> Result<Value> {
        self.get("/grades/summary").await
    }

    // ─── Activities ─────────────────────────────────────────────────────────

    pub async fn activities(&self) -> Result<Value> {
        self.get("/activities").await
    }

    pub async fn create_activity(
        &self,
        title: &str,
        category: &str,
        description: Option<&str>,
        occurred_on: &str,
    ) -> Result<Value> {
        self.post(
            "/activities",
            json!({
                "title": title,
                "category": category,
                "description": description,
                "occurred_on": occurred_on,
            }),
        )
        .await
    }

    pub async fn delete_activity(&self, id: &str) -> Result<Value> {
        self.delete(&format!("/activities/{id}")).await
    }

    // ─── Questions ──────────────────────────────────────────────────────────

    pub async fn questions(&self) -> Result<Value> {
        self.get("/questions").await
    }

    /// Counselor-only shared inbox, unanswered first.
    pub async fn all_questions(&self, limit: Option<i64>) -> Result<Value> {
        match limit {
            Some(n) => self.get(&format!("/questions/all?limit={n}")).await,
            None => self.get("/questions/all").await,
        }
    }

    pub async fn create_question(&self, title: &str, body: &str) -> Result<Value> {
        self.post("/questions", json!({ "title": title, "body": body }))
            .await
    }

    pub async fn question(&self, id: &str) -> Result<Value> {
        self.get(&format!("/questions/{id}")).await
    }

    pub async fn answer_question(&self, id: &str, body: &str) -> Result<Value> {
        self.post(&format!("/questions/{id}/answers"), json!({ "body": body }))
            .await
    }

    // ─── Universities ───────────────────────────────────────────────────────

    pub async fn search_universities(&self, query: &str, region: Option<&str>) -> Result<Value> {
        let mut path = format!("/universities?q={}", urlencode(query));
        if let Some(region) = region {
            path.push_str(&format!("&region={}", urlencode(region)));
        }
        self.get(&path).await
    }

    pub async fn university_cutoffs(&self, name: &str, department: &str) -> Result<Value> {
        self.get(&format!(
            "/universities/{}/cutoffs?department={}",
            urlencode(name),
            urlencode(department)
        ))
        .await
    }

    pub async fn recommend_universities(&self, score: f64, margin: Option<f64>) -> Result<Value> {
        let mut path = format!("/universities/recommend?score={score}");
        if let Some(margin) = margin {
            path.push_str(&format!("&margin={margin}"));
        }
        self.get(&path).await
    }

    // ─── Dashboard ──────────────────────────────────────────────────────────

    pub async fn dashboard(&self) -> Result<Value> {
        self.get("/dashboard").await
    }
}

/// Percent-encode a query value. Korean university names need this; the
/// rest of the API uses ASCII ids.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
