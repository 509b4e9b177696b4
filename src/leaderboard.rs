use std::cmp::Ordering;

use chrono::DateTime;

use crate::scores::ScoreRecord;

/// Row order by first-occurrence time, newest first. Missing times sort last.
pub fn most_recent_order(records: &[ScoreRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    // `sort_by` is stable, ties keep source order.
    order.sort_by(|a, b| {
        compare_time_desc(records[*a].first.actual_time, records[*b].first.actual_time)
    });
    order
}

/// Row order by occurrence count, highest first.
pub fn most_common_order(records: &[ScoreRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|a, b| records[*b].count.cmp(&records[*a].count));
    order
}

pub fn most_recent(records: &[ScoreRecord]) -> Vec<&ScoreRecord> {
    most_recent_order(records)
        .into_iter()
        .map(|idx| &records[idx])
        .collect()
}

pub fn most_common(records: &[ScoreRecord]) -> Vec<&ScoreRecord> {
    most_common_order(records)
        .into_iter()
        .map(|idx| &records[idx])
        .collect()
}

fn compare_time_desc(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn format_time(actual_time: Option<i64>) -> String {
    actual_time
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
