use serde::{Deserialize, Serialize};

/// Catalog/detail record for a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price: f64,
}

impl Course {
    /// Free courses enroll directly, without touching the wallet or cart.
    pub fn requires_payment(&self) -> bool {
        self.is_paid && self.price > 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}
