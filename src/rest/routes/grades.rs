// rest/routes/grades.rs — course grades and GPA summary.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::rest::auth::AuthUser;
use crate::rest::error::ApiError;
use crate::rest::validate;
use crate::storage::GradeRow;
use crate::AppContext;

#[derive(Deserialize)]
pub struct ListGradesQuery {
    pub semester: Option<String>,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Query(params): Query<ListGradesQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(sem) = &params.semester {
        validate::semester(sem)?;
    }
    let rows = ctx
        .storage
        .list_grades(&caller.user_id, params.semester.as_deref())
        .await?;
    Ok(Json(json!({ "grades": rows })))
}

#[derive(Deserialize)]
pub struct CreateGradeRequest {
    pub course_title: String,
    pub semester: String,
    pub credits: i64,
    pub grade: String,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<CreateGradeRequest>,
) -> Result<Json<Value>, ApiError> {
    validate::non_empty(&body.course_title, "course_title")?;
    validate::semester(&body.semester)?;
    validate::credits(body.credits)?;
    validate::grade_letter(&body.grade)?;

    let row = ctx
        .storage
        .create_grade(
            &caller.user_id,
            body.course_title.trim(),
            &body.semester,
            body.credits,
            &body.grade,
        )
        .await?;
    Ok(Json(json!({ "grade": row })))
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !ctx.storage.delete_grade(&caller.user_id, &id).await? {
        return Err(ApiError::NotFound("grade"));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ─── GPA summary ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
pub struct SemesterSummary {
    pub semester: String,
    pub gpa: Option<f64>,
    pub credits: i64,
}

#[derive(Debug, Serialize)]
pub struct GradeSummary {
    pub cumulative_gpa: Option<f64>,
    pub total_credits: i64,
    pub semesters: Vec<SemesterSummary>,
}

/// Compute per-semester and cumulative GPA on the 4.5 scale.
///
/// `P` rows earn credits but stay out of the GPA divisor; `F` earns no
/// credits but drags the GPA down. A term of only `P` courses has no GPA.
pub fn compute_summary(rows: &[GradeRow]) -> GradeSummary {
    // (quality points, graded credits, earned credits) per semester
    let mut terms: BTreeMap<String, (f64, i64, i64)> = BTreeMap::new();
    for row in rows {
        let entry = terms.entry(row.semester.clone()).or_insert((0.0, 0, 0));
        match validate::grade_points(&row.grade) {
            Some(points) => {
                entry.0 += points * row.credits as f64;
                entry.1 += row.credits;
                if points > 0.0 {
                    entry.2 += row.credits;
                }
            }
            // Pass/fail: credits earned, GPA untouched.
            None => entry.2 += row.credits,
        }
    }

    let mut quality = 0.0;
    let mut graded = 0i64;
    let mut total_credits = 0i64;
    let mut semesters = Vec::new();
    for (semester, (q, g, earned)) in &terms {
        quality += q;
        graded += g;
        total_credits += earned;
        semesters.push(SemesterSummary {
            semester: semester.clone(),
            gpa: (*g > 0).then(|| round2(q / *g as f64)),
            credits: *earned,
        });
    }
    // Newest term first, matching the grades screen.
    semesters.reverse();

    GradeSummary {
        cumulative_gpa: (graded > 0).then(|| round2(quality / graded as f64)),
        total_credits,
        semesters,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub async fn summary(
    State(ctx): State<Arc<AppContext>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let rows = ctx.storage.list_grades(&caller.user_id, None).await?;
    Ok(Json(json!({ "summary": compute_summary(&rows) })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(semester: &str, credits: i64, letter: &str) -> GradeRow {
        GradeRow {
            id: String::new(),
            user_id: String::new(),
            course_title: String::new(),
            semester: semester.to_string(),
            credits,
            grade: letter.to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn empty_rows_have_no_gpa() {
        let s = compute_summary(&[]);
        assert_eq!(s.cumulative_gpa, None);
        assert_eq!(s.total_credits, 0);
        assert!(s.semesters.is_empty());
    }

    #[test]
    fn single_semester_gpa() {
        // 3cr A+ (4.5) + 3cr B0 (3.0) = 22.5 / 6 = 3.75
        let s = compute_summary(&[grade("2025-1", 3, "A+"), grade("2025-1", 3, "B0")]);
        assert_eq!(s.cumulative_gpa, Some(3.75));
        assert_eq!(s.total_credits, 6);
        assert_eq!(s.semesters[0].gpa, Some(3.75));
    }

    #[test]
    fn pass_fail_excluded_from_gpa_but_earns_credits() {
        let s = compute_summary(&[grade("2025-1", 3, "A0"), grade("2025-1", 2, "P")]);
        assert_eq!(s.cumulative_gpa, Some(4.0));
        assert_eq!(s.total_credits, 5);
    }

    #[test]
    fn f_counts_in_divisor_but_earns_nothing() {
        // 3cr A0 + 3cr F = 12.0 / 6 = 2.0, only 3 credits earned
        let s = compute_summary(&[grade("2025-1", 3, "A0"), grade("2025-1", 3, "F")]);
        assert_eq!(s.cumulative_gpa, Some(2.0));
        assert_eq!(s.total_credits, 3);
    }

    #[test]
    fn all_pass_semester_has_no_gpa() {
        let s = compute_summary(&[grade("2025-1", 2, "P")]);
        assert_eq!(s.cumulative_gpa, None);
        assert_eq!(s.semesters[0].gpa, None);
        assert_eq!(s.total_credits, 2);
    }

    #[test]
    fn semesters_newest_first_cumulative_across_terms() {
        let s = compute_summary(&[
            grade("2024-2", 3, "B0"), // 9.0 / 3
            grade("2025-1", 3, "A+"), // 13.5 / 3
        ]);
        assert_eq!(s.semesters[0].semester, "2025-1");
        assert_eq!(s.semesters[1].semester, "2024-2");
        assert_eq!(s.cumulative_gpa, Some(3.75));
    }
}
