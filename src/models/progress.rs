use serde::{Deserialize, Serialize};

/// Fraction of a lecture that must be watched before it counts as completed.
pub const COMPLETION_THRESHOLD: f64 = 0.90;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LectureState {
    NotStarted,
    InProgress,
    Completed,
}

impl Default for LectureState {
    fn default() -> Self {
        LectureState::NotStarted
    }
}

/// Last known playback position for one user+lecture pair. The gateway owns
/// the record; the client keeps a read-through cache for the open course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub lecture_id: String,
    #[serde(default)]
    pub course_id: String,
    pub position: f64,
    pub duration: f64,
    #[serde(default)]
    pub completed: bool,
}

impl ProgressRecord {
    /// True once at least 90% of the lecture has been watched. A lecture
    /// whose duration is unknown can never be completed by position alone.
    pub fn is_completed(&self) -> bool {
        self.duration > 0.0 && self.position / self.duration >= COMPLETION_THRESHOLD
    }

    pub fn state(&self) -> LectureState {
        if self.completed || self.is_completed() {
            LectureState::Completed
        } else if self.position > 0.0 {
            LectureState::InProgress
        } else {
            LectureState::NotStarted
        }
    }
}

/// Course-level rollup, derived server-side and cached alongside the
/// per-lecture records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub percent: f64,
    pub remaining_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(position: f64, duration: f64) -> ProgressRecord {
        ProgressRecord {
            lecture_id: "lec-1".into(),
            course_id: "course-1".into(),
            position,
            duration,
            completed: false,
        }
    }

    #[test]
    fn completion_threshold_is_ninety_percent() {
        assert!(!record(89.9, 100.0).is_completed());
        assert!(record(90.0, 100.0).is_completed());
        assert!(record(100.0, 100.0).is_completed());
    }

    #[test]
    fn zero_duration_is_never_completed() {
        assert!(!record(0.0, 0.0).is_completed());
        assert!(!record(42.0, 0.0).is_completed());
    }

    #[test]
    fn state_transitions_follow_position() {
        assert_eq!(record(0.0, 100.0).state(), LectureState::NotStarted);
        assert_eq!(record(10.0, 100.0).state(), LectureState::InProgress);
        assert_eq!(record(95.0, 100.0).state(), LectureState::Completed);
    }

    #[test]
    fn sticky_completed_flag_wins_over_position() {
        let mut rec = record(5.0, 100.0);
        rec.completed = true;
        assert_eq!(rec.state(), LectureState::Completed);
    }
}
