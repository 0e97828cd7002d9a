//! Background maintenance jobs, started from main once storage is up.

use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::Storage;

/// Daily question pruning + vacuum. First run after 1 hour so it does not
/// compete with boot; `prune_days == 0` disables pruning but keeps the
/// vacuum.
pub fn spawn_question_pruner(storage: Arc<Storage>, prune_days: u32) {
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(60 * 60)).await;
        let mut consecutive_failures: u32 = 0;
        loop {
            match storage.prune_answered_questions(prune_days).await {
                Ok(n) if n > 0 => {
                    consecutive_failures = 0;
                    info!(pruned = n, days = prune_days, "pruned answered questions");
                }
                Ok(_) => {
                    consecutive_failures = 0;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= 3 {
                        warn!(
                            err = %e,
                            failures = consecutive_failures,
                            "question pruning failing repeatedly"
                        );
                    } else {
                        warn!(err = %e, "question pruning failed");
                    }
                }
            }
            if let Err(e) = storage.vacuum().await {
                warn!(err = %e, "sqlite vacuum failed");
            }
            tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
        }
    });
}
