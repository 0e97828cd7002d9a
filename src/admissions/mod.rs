//! In-memory admissions cutoff table.
//!
//! Loaded once at startup from a CSV of converted-score cutoffs and queried
//! with linear scans — the dataset is a few thousand rows, so no index is
//! worth its complexity. The table is immutable after load and shared as
//! `Arc<CutoffTable>`.
//!
//! Department matching is deliberately fuzzy: the reference data and user
//! input disagree on suffixes ("컴퓨터학과" vs "컴퓨터학부"), spacing, and
//! abbreviations ("고려대" vs "고려대학교"), so both sides are normalized
//! before a bidirectional substring / token-overlap comparison.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// One admissions cutoff record.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CutoffRow {
    pub university: String,
    pub department: String,
    pub region: String,
    pub year: u16,
    /// Converted admission score on the 0–1000 scale.
    pub cutoff: f64,
}

/// Result of loading the CSV: rows kept and rows dropped.
#[derive(Debug)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct CutoffTable {
    rows: Vec<CutoffRow>,
}

impl CutoffTable {
    /// An empty table — used when no CSV is configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Load the table from a CSV file with a
    /// `university,department,region,year,cutoff` header.
    ///
    /// Malformed rows (bad year, unparsable cutoff, wrong column count) are
    /// skipped with a warn log rather than failing the whole load — one typo
    /// in reference data must not take the service down.
    pub fn load_csv(path: &Path) -> Result<(Self, LoadStats)> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open cutoff CSV at {}", path.display()))?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (i, record) in reader.deserialize::<CutoffRow>().enumerate() {
            match record {
                Ok(row) if !row.university.is_empty() && !row.department.is_empty() => {
                    rows.push(row)
                }
                Ok(_) => {
                    skipped += 1;
                    warn!(line = i + 2, "cutoff row with empty university/department skipped");
                }
                Err(e) => {
                    skipped += 1;
                    warn!(line = i + 2, err = %e, "malformed cutoff row skipped");
                }
            }
        }

        let stats = LoadStats {
            loaded: rows.len(),
            skipped,
        };
        info!(
            loaded = stats.loaded,
            skipped = stats.skipped,
            path = %path.display(),
            "cutoff table loaded"
        );
        Ok((Self { rows }, stats))
    }

    /// Build a table directly from rows (tests, benches).
    pub fn from_rows(rows: Vec<CutoffRow>) -> Self {
        Self { rows }
    }

    /// Number of distinct universities in the table.
    pub fn university_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.university.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct university names whose normalized form contains the query,
    /// optionally filtered by region. Results are sorted for stable output.
    pub fn search(&self, query: &str, region: Option<&str>, limit: usize) -> Vec<String> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Vec::new();
        }
        let region_needle = region.map(normalize);
        let mut names = BTreeSet::new();
        for row in &self.rows {
            if let Some(r) = &region_needle {
                if normalize(&row.region) != *r {
                    continue;
                }
            }
            if normalize(&row.university).contains(&needle) {
                names.insert(row.university.clone());
            }
        }
        names.into_iter().take(limit).collect()
    }

    /// Cutoff rows for a university, ranked by how well each row's department
    /// matches `department`. Only rows with a nonzero match score are
    /// returned, best match first, ties broken by year descending.
    pub fn department_cutoffs(&self, university: &str, department: &str) -> Vec<CutoffRow> {
        let uni = normalize(university);
        if uni.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(f64, &CutoffRow)> = self
            .rows
            .iter()
            .filter(|row| {
                let n = normalize(&row.university);
                n.contains(&uni) || uni.contains(&n)
            })
            .filter_map(|row| {
                let score = match_score(&row.department, department);
                (score > 0.0).then_some((score, row))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.year.cmp(&a.1.year))
        });
        scored.into_iter().map(|(_, row)| row.clone()).collect()
    }

    /// Rows whose cutoff lies within `margin` of `score`, closest first.
    pub fn recommend(&self, score: f64, margin: f64, limit: usize) -> Vec<CutoffRow> {
        let mut hits: Vec<&CutoffRow> = self
            .rows
            .iter()
            .filter(|row| (row.cutoff - score).abs() <= margin)
            .collect();
        hits.sort_by(|a, b| {
            let da = (a.cutoff - score).abs();
            let db = (b.cutoff - score).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.into_iter().take(limit).cloned().collect()
    }
}

// ─── Matching ────────────────────────────────────────────────────────────────

/// Suffixes that carry no identity: institutional type markers that the
/// reference data and user input use inconsistently.
const NOISE_SUFFIXES: &[&str] = &[
    "대학교",
    "학과",
    "학부",
    "학전공",
    "전공",
    "university",
    "univ",
    "department",
    "dept",
];

/// Lowercase and strip whitespace/punctuation. University and region
/// comparisons stop here — "고려대" must still be a substring of
/// "고려대학교", which suffix stripping would break.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// `normalize` plus noise-suffix stripping, for department scoring where
/// "컴퓨터학과" and "컴퓨터학부" name the same thing.
fn strip_noise(s: &str) -> String {
    let mut out = normalize(s);
    for suffix in NOISE_SUFFIXES {
        if let Some(stripped) = out.strip_suffix(suffix) {
            if !stripped.is_empty() {
                out = stripped.to_string();
            }
        }
    }
    out
}

/// Score how well a candidate department name matches the query.
///
/// 1.0  — noise-stripped forms are equal
/// 0.8  — one noise-stripped form contains the other
/// else — fraction of query tokens (whitespace-split, stripped) found as
///        substrings of the candidate, scaled to stay below the
///        containment tier; 0.0 when nothing overlaps.
pub fn match_score(candidate: &str, query: &str) -> f64 {
    let c = strip_noise(candidate);
    let q = strip_noise(query);
    if c.is_empty() || q.is_empty() {
        return 0.0;
    }
    if c == q {
        return 1.0;
    }
    if c.contains(&q) || q.contains(&c) {
        return 0.8;
    }
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(strip_noise)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let hit = tokens.iter().filter(|t| c.contains(t.as_str())).count();
    0.6 * hit as f64 / tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CutoffTable {
        CutoffTable::from_rows(vec![
            CutoffRow {
                university: "고려대학교".into(),
                department: "컴퓨터학과".into(),
                region: "서울".into(),
                year: 2025,
                cutoff: 680.0,
            },
            CutoffRow {
                university: "고려대학교".into(),
                department: "경영학과".into(),
                region: "서울".into(),
                year: 2025,
                cutoff: 672.5,
            },
            CutoffRow {
                university: "고려대학교".into(),
                department: "컴퓨터학과".into(),
                region: "서울".into(),
                year: 2024,
                cutoff: 676.0,
            },
            CutoffRow {
                university: "부산대학교".into(),
                department: "기계공학부".into(),
                region: "부산".into(),
                year: 2025,
                cutoff: 590.0,
            },
        ])
    }

    #[test]
    fn search_matches_abbreviated_name() {
        let t = table();
        // "고려대" is how students actually type it.
        assert_eq!(t.search("고려대", None, 10), vec!["고려대학교"]);
    }

    #[test]
    fn search_respects_region_filter() {
        let t = table();
        assert!(t.search("대학", Some("부산"), 10).contains(&"부산대학교".to_string()));
        assert!(!t.search("대학", Some("부산"), 10).contains(&"고려대학교".to_string()));
    }

    #[test]
    fn search_empty_query_returns_nothing() {
        assert!(table().search("   ", None, 10).is_empty());
    }

    #[test]
    fn department_match_ignores_suffix_mismatch() {
        let t = table();
        // Query says 학부, data says 학과 — still a match.
        let rows = t.department_cutoffs("고려대", "컴퓨터학부");
        assert_eq!(rows.len(), 2);
        // Best score first, then newest year.
        assert_eq!(rows[0].year, 2025);
        assert_eq!(rows[0].cutoff, 680.0);
    }

    #[test]
    fn department_match_excludes_unrelated() {
        let t = table();
        let rows = t.department_cutoffs("고려대", "의예과");
        assert!(rows.is_empty());
    }

    #[test]
    fn exact_match_outranks_containment() {
        assert!(match_score("컴퓨터학과", "컴퓨터학과") > match_score("컴퓨터공학과", "컴퓨터학과"));
    }

    #[test]
    fn recommend_sorts_by_distance() {
        let t = table();
        let rows = t.recommend(675.0, 10.0, 10);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cutoff, 676.0); // |676-675| = 1, closest
    }

    #[test]
    fn recommend_respects_margin() {
        let t = table();
        assert!(t.recommend(500.0, 10.0, 10).is_empty());
    }

    #[test]
    fn load_csv_skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutoffs.csv");
        std::fs::write(
            &path,
            "university,department,region,year,cutoff\n\
             고려대학교,컴퓨터학과,서울,2025,680.0\n\
             고려대학교,경영학과,서울,not-a-year,672.5\n\
             ,,서울,2025,600.0\n",
        )
        .unwrap();
        let (t, stats) = CutoffTable::load_csv(&path).unwrap();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(t.len(), 1);
    }
}
