//! Wire shapes for the gateway's REST surface. Field names follow the
//! server's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::models::{ProgressRecord, ProgressSummary, UserProfile};

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressResponse {
    #[serde(default)]
    pub summary: Option<ProgressSummary>,
    #[serde(default)]
    pub items: Vec<ProgressRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NextLectureResponse {
    #[serde(default)]
    pub lecture_id: Option<String>,
}

/// Body of `POST /api/progress/upsert`. Upsert semantics on the server make
/// retries safe; whatever arrives last wins.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpsert<'a> {
    pub course_id: &'a str,
    pub lecture_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<&'a str>,
    pub position: f64,
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Some gateway versions return the post-purchase balance inline.
    #[serde(default)]
    pub new_balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurchasedResponse {
    #[serde(default)]
    pub purchased: bool,
}

/// One entry of `GET /api/purchases`: a course the user already owns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub course_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopUpRequest<'a> {
    pub amount: f64,
    pub utr_number: &'a str,
    pub description: &'a str,
}
