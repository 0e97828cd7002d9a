//! Criterion benchmarks for the admissions cutoff table.
//!
//! Run with:
//!   cargo bench
//!
//! Covers:
//!   - university name search (normalize + substring scan)
//!   - department matching (suffix stripping + tiered scoring)
//!   - score recommendations (filter + sort by distance)

use campusd::admissions::{match_score, CutoffRow, CutoffTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A table about the size of the real reference data: ~60 universities,
/// 20 departments each, 3 years of history.
fn synthetic_table() -> CutoffTable {
    let universities = [
        "고려대학교",
        "서울대학교",
        "연세대학교",
        "부산대학교",
        "경북대학교",
        "전남대학교",
    ];
    let departments = [
        "컴퓨터학과",
        "기계공학부",
        "전기전자공학부",
        "경영학과",
        "의예과",
        "국어국문학과",
    ];
    let mut rows = Vec::new();
    for i in 0..10 {
        for (u, university) in universities.iter().enumerate() {
            for (d, department) in departments.iter().enumerate() {
                for year in [2022u16, 2023, 2024] {
                    rows.push(CutoffRow {
                        university: format!("{university}{i}"),
                        department: (*department).to_string(),
                        region: if u % 2 == 0 { "서울" } else { "부산" }.to_string(),
                        year,
                        cutoff: 60.0 + (u * 6 + d) as f64 * 0.9 + (year - 2022) as f64 * 0.3,
                    });
                }
            }
        }
    }
    CutoffTable::from_rows(rows)
}

fn bench_search(c: &mut Criterion) {
    let table = synthetic_table();
    c.bench_function("cutoff_search_university", |b| {
        b.iter(|| {
            let names = table.search(black_box("고려대"), None, 20);
            black_box(names);
        });
    });
    c.bench_function("cutoff_search_with_region", |b| {
        b.iter(|| {
            let names = table.search(black_box("대학"), Some("부산"), 20);
            black_box(names);
        });
    });
}

fn bench_department_match(c: &mut Criterion) {
    let table = synthetic_table();
    c.bench_function("cutoff_department_history", |b| {
        b.iter(|| {
            let rows = table.department_cutoffs(black_box("고려대학교1"), black_box("컴퓨터학부"));
            black_box(rows);
        });
    });
    c.bench_function("match_score_fuzzy", |b| {
        b.iter(|| {
            let s = match_score(black_box("전기전자공학부"), black_box("전기전자 전공"));
            black_box(s);
        });
    });
}

fn bench_recommend(c: &mut Criterion) {
    let table = synthetic_table();
    c.bench_function("cutoff_recommend", |b| {
        b.iter(|| {
            let rows = table.recommend(black_box(82.0), 5.0, 20);
            black_box(rows);
        });
    });
}

criterion_group!(
    benches,
    bench_search,
    bench_department_match,
    bench_recommend
);
criterion_main!(benches);
