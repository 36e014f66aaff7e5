use serde::{Deserialize, Serialize};

/// One playable video unit within a course. Immutable once fetched for a
/// session; `order_index` defines what "next" means.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Running time in seconds. Zero until the gateway has learned it.
    #[serde(default)]
    pub duration: f64,
    pub order_index: u32,
}

impl Lecture {
    /// The reference the player opens: a direct URL when present, the raw
    /// provider video id otherwise.
    pub fn video_ref(&self) -> Option<&str> {
        self.video_url.as_deref().or(self.video_id.as_deref())
    }

    pub fn has_video(&self) -> bool {
        self.video_ref().is_some()
    }
}
