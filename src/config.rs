use std::{env, path::PathBuf, time::Duration};

/// Production gateway URL, used unless `EDUHIVE_API_URL` overrides it.
const PRODUCTION_URL: &str = "https://eduhive-server.onrender.com";

/// Explicit deadline for every gateway call; a timed-out call classifies as
/// a network failure instead of hanging on client defaults.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Where the local sqlite store lives.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        // Prefer an explicit env var for device/emulator setups.
        let base_url =
            env::var("EDUHIVE_API_URL").unwrap_or_else(|_| PRODUCTION_URL.to_string());
        Self {
            base_url,
            timeout: REQUEST_TIMEOUT,
            data_dir,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            data_dir: std::env::temp_dir(),
        }
    }
}
