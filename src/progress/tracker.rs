use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;
use tokio::sync::Mutex;

use crate::api::{ApiClient, ApiResult, ProgressUpsert};
use crate::models::{Lecture, ProgressRecord, ProgressSummary, COMPLETION_THRESHOLD};

use super::{gating, ProgressError, LOCKED_REASON};

/// Progress state for one open course: the ordered lecture list, a
/// read-through cache of per-lecture records, and the server-derived summary.
/// Dropped when the course view closes; nothing is cached across sessions.
pub struct CourseProgress {
    api: Arc<ApiClient>,
    course_id: String,
    lectures: Vec<Lecture>,
    summary: RwLock<Option<ProgressSummary>>,
    records: RwLock<HashMap<String, ProgressRecord>>,
    /// Serializes upserts so last-write-wins holds by call order even with
    /// parallel callers.
    send_lock: Mutex<()>,
}

impl CourseProgress {
    /// Opens the tracker for one course. The lecture list is required (a 403
    /// here means the course must be purchased first); the progress snapshot
    /// is best-effort and the view degrades to empty state without it.
    pub async fn open(api: Arc<ApiClient>, course_id: impl Into<String>) -> ApiResult<Self> {
        let course_id = course_id.into();
        let mut lectures = api.course_lectures(&course_id).await?;
        lectures.sort_by_key(|lecture| lecture.order_index);

        let tracker = Self {
            api,
            course_id,
            lectures,
            summary: RwLock::new(None),
            records: RwLock::new(HashMap::new()),
            send_lock: Mutex::new(()),
        };

        if let Err(err) = tracker.refresh().await {
            warn!(
                "Failed to load progress for course {}: {err}",
                tracker.course_id
            );
        }

        Ok(tracker)
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn lectures(&self) -> &[Lecture] {
        &self.lectures
    }

    pub fn lecture(&self, lecture_id: &str) -> Option<&Lecture> {
        self.lectures.iter().find(|l| l.id == lecture_id)
    }

    pub fn summary(&self) -> Option<ProgressSummary> {
        self.summary.read().unwrap().clone()
    }

    pub fn record_for(&self, lecture_id: &str) -> Option<ProgressRecord> {
        self.records.read().unwrap().get(lecture_id).cloned()
    }

    /// Re-fetches `{summary, items}` and replaces the cache wholesale. This
    /// is the only path that can un-stick a completed flag.
    pub async fn refresh(&self) -> ApiResult<()> {
        let response = self.api.course_progress(&self.course_id).await?;
        *self.summary.write().unwrap() = response.summary;
        let map = response
            .items
            .into_iter()
            .map(|record| (record.lecture_id.clone(), record))
            .collect();
        *self.records.write().unwrap() = map;
        Ok(())
    }

    /// Pushes one position sample to the gateway and folds it into the
    /// cache. Safe to retry (server-side upsert); position and duration are
    /// last-write-wins, completion is sticky for the session.
    pub async fn record(&self, lecture_id: &str, position: f64, duration: f64) -> ApiResult<()> {
        let _guard = self.send_lock.lock().await;

        let video_id = self.lecture(lecture_id).and_then(|l| l.video_ref());
        let body = ProgressUpsert {
            course_id: &self.course_id,
            lecture_id,
            video_id,
            position,
            duration,
        };
        self.api.upsert_progress(&body).await?;

        let mut records = self.records.write().unwrap();
        let entry = records
            .entry(lecture_id.to_string())
            .or_insert_with(|| ProgressRecord {
                lecture_id: lecture_id.to_string(),
                course_id: self.course_id.clone(),
                position: 0.0,
                duration,
                completed: false,
            });
        entry.position = position;
        entry.duration = duration;
        entry.completed =
            entry.completed || (duration > 0.0 && position / duration >= COMPLETION_THRESHOLD);
        Ok(())
    }

    /// Asks the gateway for the suggested next lecture; falls back to the
    /// first untouched lecture, then the first in order.
    pub async fn resolve_next(&self) -> Option<Lecture> {
        match self.api.next_lecture(&self.course_id).await {
            Ok(Some(id)) => {
                if let Some(lecture) = self.lecture(&id) {
                    return Some(lecture.clone());
                }
                // Unknown id; resolve locally instead.
            }
            Ok(None) => {}
            Err(err) => warn!(
                "Failed to resolve next lecture for {}: {err}",
                self.course_id
            ),
        }

        let records = self.records.read().unwrap();
        gating::fallback_next(&self.lectures, &records).cloned()
    }

    /// Gating check. Opening a locked lecture is rejected loudly, never a
    /// silent no-op.
    pub fn ensure_openable(&self, lecture_id: &str) -> Result<(), ProgressError> {
        let target = self
            .lecture(lecture_id)
            .ok_or_else(|| ProgressError::UnknownLecture(lecture_id.to_string()))?;
        let records = self.records.read().unwrap();
        if gating::can_open(target, &self.lectures, &records) {
            Ok(())
        } else {
            Err(ProgressError::Locked(LOCKED_REASON.to_string()))
        }
    }
}
