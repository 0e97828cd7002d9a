//! doctor.rs — pre-flight diagnostic checks for `campusd doctor`.
//!
//! This module is self-contained and does NOT require AppContext.
//! It runs before the server starts, so it can catch configuration
//! problems before they cause confusing startup failures.

use anyhow::Result;
use std::path::Path;

use crate::config::ServerConfig;

/// The result of a single diagnostic check.
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Run all diagnostic checks and return a list of results.
pub async fn run_doctor(config: &ServerConfig) -> Vec<CheckResult> {
    vec![
        check_port_available(&config.bind_address, config.port),
        check_data_dir_writable(&config.data_dir),
        check_database_opens(&config.data_dir).await,
        check_cutoff_csv(config.cutoff_csv.as_deref()),
        check_disk_space(&config.data_dir),
    ]
}

// ─── Individual checks ────────────────────────────────────────────────────────

/// Check 1: the configured port is available.
fn check_port_available(bind_address: &str, port: u16) -> CheckResult {
    let passed = std::net::TcpListener::bind((bind_address, port)).is_ok();
    CheckResult {
        name: "Port available",
        passed,
        detail: if passed {
            format!("{bind_address}:{port} is free")
        } else {
            format!("{bind_address}:{port} is in use by another process")
        },
    }
}

/// Check 2: the data directory exists (or can be created) and is writable.
fn check_data_dir_writable(data_dir: &Path) -> CheckResult {
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        return CheckResult {
            name: "Data directory writable",
            passed: false,
            detail: format!("cannot create {}: {e}", data_dir.display()),
        };
    }
    let test_path = data_dir.join(".doctor_write_test");
    match std::fs::write(&test_path, b"ok") {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_path);
            CheckResult {
                name: "Data directory writable",
                passed: true,
                detail: format!("{} is writable", data_dir.display()),
            }
        }
        Err(e) => CheckResult {
            name: "Data directory writable",
            passed: false,
            detail: format!("cannot write to {}: {e}", data_dir.display()),
        },
    }
}

/// Check 3: the database actually opens and answers a query. A missing file
/// passes (it is created on first start); a corrupt or unreadable one fails.
async fn check_database_opens(data_dir: &Path) -> CheckResult {
    let db_path = data_dir.join("campusd.db");
    if !db_path.exists() {
        return CheckResult {
            name: "SQLite DB opens",
            passed: true,
            detail: format!(
                "{} not found (will be created on first start)",
                db_path.display()
            ),
        };
    }
    match open_read_only(&db_path).await {
        Ok(tables) => CheckResult {
            name: "SQLite DB opens",
            passed: true,
            detail: format!("{} opens ({tables} tables)", db_path.display()),
        },
        Err(e) => CheckResult {
            name: "SQLite DB opens",
            passed: false,
            detail: format!("cannot open {}: {e}", db_path.display()),
        },
    }
}

/// Open the database read-only and count its tables. Read-only so doctor
/// never creates or migrates anything.
async fn open_read_only(db_path: &Path) -> Result<i64> {
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr as _;

    let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .read_only(true);
    let pool = sqlx::SqlitePool::connect_with(opts).await?;
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&pool)
            .await?;
    pool.close().await;
    Ok(row.0)
}

/// Check 4: the cutoff CSV parses, with row counts.
fn check_cutoff_csv(path: Option<&Path>) -> CheckResult {
    let Some(path) = path else {
        return CheckResult {
            name: "Cutoff CSV",
            passed: true,
            detail: "not configured (university routes return empty results)".to_string(),
        };
    };
    match crate::admissions::CutoffTable::load_csv(path) {
        Ok((table, stats)) => CheckResult {
            name: "Cutoff CSV",
            passed: !table.is_empty(),
            detail: format!(
                "{}: {} rows loaded, {} skipped",
                path.display(),
                stats.loaded,
                stats.skipped
            ),
        },
        Err(e) => CheckResult {
            name: "Cutoff CSV",
            passed: false,
            detail: format!("cannot read {}: {e}", path.display()),
        },
    }
}

/// Check 5: sufficient disk space is available (> 100 MB).
fn check_disk_space(data_dir: &Path) -> CheckResult {
    match available_disk_bytes(data_dir) {
        Some(bytes) => {
            const WARN_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB
            let passed = bytes > WARN_THRESHOLD;
            let detail = if bytes >= 1024 * 1024 * 1024 {
                format!("{:.1} GB free", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
            } else {
                format!("{:.0} MB free", bytes as f64 / (1024.0 * 1024.0))
            };
            CheckResult {
                name: "Disk space",
                passed,
                detail: if passed {
                    detail
                } else {
                    format!("low disk space: only {detail}")
                },
            }
        }
        None => CheckResult {
            name: "Disk space",
            passed: true, // assume ok if we cannot check
            detail: "could not determine disk space".to_string(),
        },
    }
}

/// Return available bytes on the filesystem containing `path`.
fn available_disk_bytes(path: &Path) -> Option<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        let path_cstr = CString::new(path.to_str().unwrap_or("/").as_bytes()).ok()?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(path_cstr.as_ptr(), &mut stat) };
        if ret == 0 {
            Some(stat.f_bavail as u64 * stat.f_frsize as u64)
        } else {
            None
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Print a formatted table of check results to stdout.
pub fn print_doctor_results(results: &[CheckResult]) {
    println!();
    println!("{BOLD}campusd doctor — pre-flight checks{RESET}");
    println!("{}", "─".repeat(60));

    for r in results {
        let (symbol, color) = if r.passed { ("✓", GREEN) } else { ("✗", RED) };
        println!("  {color}{symbol}{RESET}  {:<28}  {}", r.name, r.detail);
    }

    println!("{}", "─".repeat(60));

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed == 0 {
        println!("{GREEN}All checks passed.{RESET}");
    } else {
        println!("{RED}{failed} check(s) failed. See above for details.{RESET}");
    }
    println!();
}
