use std::sync::{Arc, RwLock};

use log::{error, warn};

use crate::api::{ApiClient, ApiResult};
use crate::models::UserProfile;
use crate::storage::{keys, Storage};

/// Bearer credential lifecycle and the cached profile. Replaces the ambient
/// auth global with an explicit handle threaded from bootstrap.
pub struct Session {
    api: Arc<ApiClient>,
    storage: Storage,
    profile: RwLock<Option<UserProfile>>,
}

impl Session {
    /// Rehydrates the persisted credential, if any, and installs it on the
    /// API client before anything else talks to the gateway.
    pub async fn restore(api: Arc<ApiClient>, storage: Storage) -> Self {
        let session = Self {
            api,
            storage,
            profile: RwLock::new(None),
        };

        match session.storage.get(keys::AUTH_TOKEN).await {
            Ok(Some(token)) => {
                session.api.set_token(Some(token));
                session.refresh_profile().await;
            }
            Ok(None) => {}
            Err(err) => warn!("Failed to load stored credential: {err}"),
        }

        session
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.has_token()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.read().unwrap().clone()
    }

    /// Best-effort profile fetch; a failure leaves the cached profile alone.
    pub async fn refresh_profile(&self) {
        match self.api.me().await {
            Ok(profile) => *self.profile.write().unwrap() = Some(profile),
            Err(err) => warn!("Failed to fetch profile: {err}"),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let response = self.api.login(email, password).await?;
        self.install_token(response.token).await;
        if let Some(user) = response.user {
            *self.profile.write().unwrap() = Some(user);
        }
        Ok(())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        let response = self.api.register(name, email, password).await?;
        self.install_token(response.token).await;
        if let Some(user) = response.user {
            *self.profile.write().unwrap() = Some(user);
        }
        Ok(())
    }

    /// Drops the credential everywhere. The cart intentionally survives; the
    /// per-course progress caches die with their handles.
    pub async fn logout(&self) {
        self.api.set_token(None);
        *self.profile.write().unwrap() = None;
        if let Err(err) = self.storage.delete(keys::AUTH_TOKEN).await {
            error!("Failed to clear stored credential: {err}");
        }
    }

    async fn install_token(&self, token: String) {
        self.api.set_token(Some(token.clone()));
        if let Err(err) = self.storage.put(keys::AUTH_TOKEN, token).await {
            error!("Failed to persist credential: {err}");
        }
        self.refresh_profile().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use mockito::Server;
    use tempfile::TempDir;

    #[tokio::test]
    async fn login_persists_token_and_restore_reinstalls_it() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"token":"tok-1","user":{"_id":"u1","name":"Asha","email":"a@b.c"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/me")
            .with_status(200)
            .with_body(r#"{"_id":"u1","name":"Asha","email":"a@b.c"}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("s.sqlite3")).unwrap();
        let api = Arc::new(ApiClient::new(&ClientConfig::for_tests(&server.url())).unwrap());

        let session = Session::restore(api.clone(), storage.clone()).await;
        assert!(!session.is_authenticated());

        session.login("a@b.c", "secret").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.profile().unwrap().name, "Asha");

        // A fresh process picks the credential back up from storage.
        let api2 = Arc::new(ApiClient::new(&ClientConfig::for_tests(&server.url())).unwrap());
        let restored = Session::restore(api2, storage).await;
        assert!(restored.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_credential_and_profile() {
        let server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("s.sqlite3")).unwrap();
        storage
            .put(keys::AUTH_TOKEN, "stale-token".into())
            .await
            .unwrap();

        let api = Arc::new(ApiClient::new(&ClientConfig::for_tests(&server.url())).unwrap());
        let session = Session::restore(api.clone(), storage.clone()).await;
        assert!(session.is_authenticated());

        session.logout().await;
        assert!(!session.is_authenticated());
        assert!(session.profile().is_none());
        assert_eq!(storage.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }
}
