use serde::{Deserialize, Serialize};

/// One prospective purchase. At most one entry per `course_id` lives in the
/// cart at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub price: f64,
}
