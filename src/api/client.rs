use std::sync::RwLock;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::config::ClientConfig;
use crate::models::{Course, Lecture, UserProfile, WalletTransaction};

/// Typed access to the gateway's REST surface. One shared instance per
/// process; the bearer credential is installed after login and attached to
/// every authenticated call.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap() = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().unwrap().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Every authenticated endpoint fails `Unauthorized` before touching the
    /// wire when no credential is installed.
    fn authed(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        let guard = self.token.read().unwrap();
        match guard.as_deref() {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Err(ApiError::Unauthorized),
        }
    }

    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Server error ({})", status.as_u16()),
        };
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.authed(self.http.get(self.url(path)))?;
        let response = builder.send().await?;
        Self::decode(Self::check(response).await?).await
    }

    async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let builder = self.authed(self.http.post(self.url(path)))?;
        let response = builder.json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    // --- Auth (no credential attached) ---

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&RegisterRequest {
                name,
                email,
                password,
            })
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    // --- Profile ---

    pub async fn me(&self) -> ApiResult<UserProfile> {
        self.get_json("/api/me").await
    }

    pub async fn update_me(
        &self,
        name: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<UserProfile> {
        let builder = self.authed(self.http.put(self.url("/api/me")))?;
        let response = builder.json(&ProfileUpdate { name, email }).send().await?;
        Self::decode(Self::check(response).await?).await
    }

    // --- Courses ---

    pub async fn courses(&self) -> ApiResult<Vec<Course>> {
        self.get_json("/api/courses").await
    }

    pub async fn course(&self, course_id: &str) -> ApiResult<Course> {
        self.get_json(&format!("/api/courses/{course_id}")).await
    }

    pub async fn course_lectures(&self, course_id: &str) -> ApiResult<Vec<Lecture>> {
        self.get_json(&format!("/api/courses/{course_id}/lectures"))
            .await
    }

    pub async fn course_purchased(&self, course_id: &str) -> ApiResult<bool> {
        let response: PurchasedResponse = self
            .get_json(&format!("/api/courses/{course_id}/purchased"))
            .await?;
        Ok(response.purchased)
    }

    pub async fn purchase_course(&self, course_id: &str) -> ApiResult<PurchaseResponse> {
        let path = format!("/api/courses/{course_id}/purchase");
        let builder = self.authed(self.http.post(self.url(&path)))?;
        let response = Self::check(builder.send().await?).await?;
        // Older gateway versions acknowledge with an empty body.
        let text = response.text().await.map_err(ApiError::from)?;
        Ok(serde_json::from_str(&text).unwrap_or(PurchaseResponse { new_balance: None }))
    }

    pub async fn purchases(&self) -> ApiResult<Vec<PurchaseRecord>> {
        self.get_json("/api/purchases").await
    }

    // --- Progress ---

    pub async fn course_progress(&self, course_id: &str) -> ApiResult<CourseProgressResponse> {
        self.get_json(&format!("/api/progress/course/{course_id}"))
            .await
    }

    pub async fn upsert_progress(&self, body: &ProgressUpsert<'_>) -> ApiResult<()> {
        self.post_ack("/api/progress/upsert", body).await
    }

    pub async fn next_lecture(&self, course_id: &str) -> ApiResult<Option<String>> {
        let response: NextLectureResponse = self
            .get_json(&format!("/api/progress/next/{course_id}"))
            .await?;
        Ok(response.lecture_id)
    }

    // --- Wallet ---

    pub async fn wallet_balance(&self) -> ApiResult<f64> {
        let response: BalanceResponse = self.get_json("/api/wallet/balance").await?;
        Ok(response.balance)
    }

    pub async fn wallet_transactions(&self) -> ApiResult<Vec<WalletTransaction>> {
        self.get_json("/api/wallet/transactions").await
    }

    pub async fn submit_top_up(
        &self,
        amount: f64,
        utr_number: &str,
        description: &str,
    ) -> ApiResult<()> {
        self.post_ack(
            "/api/wallet/topup",
            &TopUpRequest {
                amount,
                utr_number,
                description,
            },
        )
        .await
    }
}
