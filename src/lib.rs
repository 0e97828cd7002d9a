pub mod admissions;
pub mod auth;
pub mod client;
pub mod config;
pub mod doctor;
pub mod jobs;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use admissions::CutoffTable;
use auth::TokenSigner;
use config::ServerConfig;
use storage::Storage;

/// Shared application state passed to every request handler and
/// background job.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Admission cutoff reference table, loaded once at boot.
    pub cutoffs: Arc<CutoffTable>,
    pub signer: Arc<TokenSigner>,
    pub started_at: std::time::Instant,
}
