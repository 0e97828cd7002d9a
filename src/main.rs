use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use campusd::{
    admissions::CutoffTable, auth::TokenSigner, config::ServerConfig, doctor, jobs,
    rest::start_rest_server, storage::Storage, AppContext,
};

#[derive(Parser)]
#[command(
    name = "campusd",
    about = "campusd — academic-planning REST service",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API port
    #[arg(long, env = "CAMPUSD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "CAMPUSD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CAMPUSD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "CAMPUSD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "CAMPUSD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Admission cutoff CSV to load at boot
    #[arg(long, env = "CAMPUSD_CUTOFF_CSV")]
    cutoff_csv: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server (default when no subcommand given).
    Serve,
    /// Run pre-flight diagnostic checks and exit.
    Doctor,
    /// Manage user accounts directly against the database.
    Account {
        #[command(subcommand)]
        cmd: AccountCmd,
    },
    /// Inspect admission cutoff data files.
    Cutoffs {
        #[command(subcommand)]
        cmd: CutoffsCmd,
    },
}

#[derive(Subcommand)]
enum AccountCmd {
    /// Grant the counselor role to an existing account.
    ///
    /// Examples:
    ///   campusd account promote counselor@school.kr
    Promote { email: String },
}

#[derive(Subcommand)]
enum CutoffsCmd {
    /// Parse a cutoff CSV and report row counts without starting the server.
    ///
    /// Examples:
    ///   campusd cutoffs check --csv data/cutoffs-2026.csv
    ///   campusd cutoffs check          (uses the configured cutoff_csv)
    Check {
        /// CSV to check; defaults to the configured `cutoff_csv`.
        #[arg(long)]
        csv: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format =
        std::env::var("CAMPUSD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    match args.command {
        Some(Command::Doctor) => {
            let config = ServerConfig::new(
                args.port,
                args.data_dir,
                Some("error".to_string()),
                args.bind_address,
                args.cutoff_csv,
            );
            let results = doctor::run_doctor(&config).await;
            doctor::print_doctor_results(&results);
            let failed = results.iter().filter(|r| !r.passed).count();
            std::process::exit(if failed == 0 { 0 } else { 1 });
        }
        Some(Command::Account { cmd }) => {
            let config = ServerConfig::new(
                None,
                args.data_dir,
                Some("error".to_string()),
                None,
                None,
            );
            run_account(&config, cmd).await?;
        }
        Some(Command::Cutoffs { cmd }) => match cmd {
            CutoffsCmd::Check { csv } => {
                let config = ServerConfig::new(
                    None,
                    args.data_dir,
                    Some("error".to_string()),
                    None,
                    args.cutoff_csv,
                );
                let Some(path) = csv.or(config.cutoff_csv) else {
                    eprintln!(
                        "no cutoff CSV given — pass --csv or set cutoff_csv in config.toml"
                    );
                    std::process::exit(1);
                };
                run_cutoffs_check(&path)?;
            }
        },
        None | Some(Command::Serve) => {
            run_server(
                args.port,
                args.data_dir,
                args.log,
                args.bind_address,
                args.cutoff_csv,
            )
            .await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
    log: Option<String>,
    bind_address: Option<String>,
    cutoff_csv: Option<std::path::PathBuf>,
) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "campusd starting");

    let config = Arc::new(ServerConfig::new(
        port,
        data_dir,
        log,
        bind_address,
        cutoff_csv,
    ));
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        bind = %config.bind_address,
        "config loaded"
    );

    let storage = Arc::new(
        Storage::new_with_slow_query(
            &config.data_dir,
            config.observability.slow_query_threshold_ms,
        )
        .await?,
    );

    let signer = Arc::new(TokenSigner::get_or_create(&storage, config.auth.token_ttl_hours).await?);

    let cutoffs = match &config.cutoff_csv {
        Some(path) => match CutoffTable::load_csv(path) {
            Ok((table, stats)) => {
                info!(
                    path = %path.display(),
                    loaded = stats.loaded,
                    skipped = stats.skipped,
                    "cutoff table loaded"
                );
                table
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    err = %e,
                    "could not load cutoff CSV — university routes will return empty results"
                );
                CutoffTable::empty()
            }
        },
        None => {
            info!("no cutoff CSV configured — university routes will return empty results");
            CutoffTable::empty()
        }
    };

    jobs::spawn_question_pruner(storage.clone(), config.question_prune_days);

    let ctx = Arc::new(AppContext {
        config: config.clone(),
        storage,
        cutoffs: Arc::new(cutoffs),
        signer,
        started_at: std::time::Instant::now(),
    });

    start_rest_server(ctx).await
}

async fn run_account(config: &ServerConfig, cmd: AccountCmd) -> Result<()> {
    let storage = Storage::new(&config.data_dir).await?;
    match cmd {
        AccountCmd::Promote { email } => {
            if storage.set_user_role(&email, "counselor").await? {
                println!("{email} is now a counselor");
            } else {
                eprintln!("no account found for {email}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn run_cutoffs_check(csv: &std::path::Path) -> Result<()> {
    let (table, stats) = CutoffTable::load_csv(csv)?;
    println!(
        "{}: {} rows loaded, {} skipped, {} universities",
        csv.display(),
        stats.loaded,
        stats.skipped,
        table.university_count()
    );
    if table.is_empty() {
        eprintln!("no usable rows — check the header: university,department,region,year,cutoff");
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("campusd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
