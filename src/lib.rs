mod api;
mod cart;
mod checkout;
mod config;
mod models;
mod playback;
mod progress;
mod session;
mod storage;
mod wallet;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

pub use api::{
    ApiClient, ApiError, ApiResult, AuthResponse, CourseProgressResponse, ProgressUpsert,
    PurchaseRecord, PurchaseResponse,
};
pub use cart::CartStore;
pub use checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutReport, CheckoutResolution, PurchaseOutcome,
    PurchaseStatus,
};
pub use config::ClientConfig;
pub use models::{
    CartLineItem, Course, Lecture, LectureState, ProgressRecord, ProgressSummary,
    TransactionStatus, UserProfile, WalletTransaction, COMPLETION_THRESHOLD,
};
pub use playback::{PlaybackSource, PlaybackStatus, PlaybackSyncDriver};
pub use progress::{CourseProgress, ProgressError};
pub use session::Session;
pub use storage::Storage;
pub use wallet::{WalletError, WalletService};

/// Initializes logging (reads RUST_LOG env var). Safe to call more than
/// once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// The process-wide services, wired once at startup and threaded explicitly
/// into every consumer instead of living as ambient globals.
pub struct AppContext {
    pub api: Arc<ApiClient>,
    pub storage: Storage,
    pub cart: Arc<CartStore>,
    pub session: Session,
    pub wallet: WalletService,
}

impl AppContext {
    /// Opens the local store, restores the persisted session, and rehydrates
    /// the cart.
    pub async fn bootstrap(config: ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.data_dir.display()
            )
        })?;

        let storage = Storage::open(config.data_dir.join("eduhive.sqlite3"))?;
        let api = Arc::new(ApiClient::new(&config)?);
        let session = Session::restore(api.clone(), storage.clone()).await;
        let cart = Arc::new(CartStore::load(storage.clone()).await);
        let wallet = WalletService::new(api.clone());

        info!("EduHive client core ready (gateway: {})", config.base_url);

        Ok(Self {
            api,
            storage,
            cart,
            session,
            wallet,
        })
    }

    /// Opens the progress tracker for one course view.
    pub async fn open_course(&self, course_id: &str) -> ApiResult<CourseProgress> {
        CourseProgress::open(self.api.clone(), course_id).await
    }

    pub fn checkout(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(self.api.clone(), self.cart.clone())
    }

    /// Persisted theme preference; applying it is the shell's business.
    pub async fn theme(&self) -> Option<String> {
        match self.storage.get(storage::keys::THEME_MODE).await {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Failed to load theme preference: {err}");
                None
            }
        }
    }

    pub async fn set_theme(&self, mode: &str) {
        if let Err(err) = self
            .storage
            .put(storage::keys::THEME_MODE, mode.to_string())
            .await
        {
            log::error!("Failed to persist theme preference: {err}");
        }
    }

    /// Flushes state that is normally written fire-and-forget.
    pub async fn shutdown(&self) -> Result<()> {
        self.cart.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn bootstrap_wires_an_unauthenticated_context() {
        let dir = TempDir::new().unwrap();
        let config =
            ClientConfig::new(dir.path().to_path_buf()).with_base_url("http://127.0.0.1:1");

        let ctx = AppContext::bootstrap(config).await.unwrap();
        assert!(!ctx.session.is_authenticated());
        assert!(ctx.cart.is_empty());

        ctx.set_theme("dark").await;
        assert_eq!(ctx.theme().await.as_deref(), Some("dark"));
    }
}
