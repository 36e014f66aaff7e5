use std::collections::HashMap;

use crate::models::{Lecture, ProgressRecord};

/// A lecture may be opened when every lecture ordered before it has a
/// completed record, or when the course has no progress records at all
/// (first-ever open).
pub fn can_open(
    target: &Lecture,
    lectures: &[Lecture],
    records: &HashMap<String, ProgressRecord>,
) -> bool {
    if records.is_empty() {
        return true;
    }
    lectures
        .iter()
        .filter(|lecture| lecture.order_index < target.order_index)
        .all(|lecture| {
            records
                .get(&lecture.id)
                .map(|record| record.completed)
                .unwrap_or(false)
        })
}

/// Local next-lecture resolution when the gateway cannot answer: the first
/// lecture with no progress record, else the first lecture in order.
pub fn fallback_next<'a>(
    lectures: &'a [Lecture],
    records: &HashMap<String, ProgressRecord>,
) -> Option<&'a Lecture> {
    lectures
        .iter()
        .find(|lecture| !records.contains_key(&lecture.id))
        .or_else(|| lectures.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(id: &str, order_index: u32) -> Lecture {
        Lecture {
            id: id.into(),
            title: format!("Lecture {order_index}"),
            video_url: Some(format!("https://cdn.example/{id}.mp4")),
            video_id: None,
            thumbnail_url: None,
            duration: 600.0,
            order_index,
        }
    }

    fn completed(id: &str) -> ProgressRecord {
        ProgressRecord {
            lecture_id: id.into(),
            course_id: "course-1".into(),
            position: 600.0,
            duration: 600.0,
            completed: true,
        }
    }

    fn in_progress(id: &str, position: f64) -> ProgressRecord {
        ProgressRecord {
            lecture_id: id.into(),
            course_id: "course-1".into(),
            position,
            duration: 600.0,
            completed: false,
        }
    }

    fn course() -> Vec<Lecture> {
        vec![lecture("l1", 1), lecture("l2", 2), lecture("l3", 3)]
    }

    #[test]
    fn everything_opens_when_no_records_exist() {
        let lectures = course();
        let records = HashMap::new();
        for target in &lectures {
            assert!(can_open(target, &lectures, &records));
        }
    }

    #[test]
    fn open_requires_all_predecessors_completed() {
        let lectures = course();
        let mut records = HashMap::new();
        records.insert("l1".to_string(), completed("l1"));
        records.insert("l2".to_string(), in_progress("l2", 120.0));

        assert!(can_open(&lectures[0], &lectures, &records));
        assert!(can_open(&lectures[1], &lectures, &records));
        assert!(!can_open(&lectures[2], &lectures, &records));
    }

    #[test]
    fn a_predecessor_without_a_record_blocks_later_lectures() {
        let lectures = course();
        let mut records = HashMap::new();
        // l1 was never touched but l2 somehow has progress.
        records.insert("l2".to_string(), completed("l2"));

        assert!(!can_open(&lectures[2], &lectures, &records));
    }

    #[test]
    fn fallback_next_prefers_first_untouched_lecture() {
        let lectures = course();
        let mut records = HashMap::new();
        records.insert("l1".to_string(), completed("l1"));

        let next = fallback_next(&lectures, &records).unwrap();
        assert_eq!(next.id, "l2");
    }

    #[test]
    fn fallback_next_defaults_to_first_in_order() {
        let lectures = course();
        let mut records = HashMap::new();
        for l in &lectures {
            records.insert(l.id.clone(), completed(&l.id));
        }

        let next = fallback_next(&lectures, &records).unwrap();
        assert_eq!(next.id, "l1");

        assert!(fallback_next(&[], &records).is_none());
    }
}
