use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::categorize::ExerciseCategorizer;
use crate::models::{DailyActivity, ProcessedRecord, RecordKind, WeeklyStats};
use crate::window::{WeekWindow, WINDOW_DAYS};

/// Summarize one user's processed records for the window. Pure; records
/// dated outside the window are ignored rather than errored, per the fetch
/// contract they should not occur.
pub fn aggregate(
    records: &[ProcessedRecord],
    window: &WeekWindow,
    categorizer: &ExerciseCategorizer,
) -> WeeklyStats {
    let mut daily_breakdown: BTreeMap<NaiveDate, DailyActivity> = window
        .days()
        .map(|day| (day, DailyActivity::default()))
        .collect();

    let mut exercise_category_counts = BTreeMap::new();
    let mut exercise_days: HashSet<NaiveDate> = HashSet::new();
    let mut diet_days: HashSet<NaiveDate> = HashSet::new();
    let mut total_count = 0;

    for record in records {
        let date = record.created_at.date_naive();
        let Some(day) = daily_breakdown.get_mut(&date) else {
            continue;
        };

        match record.kind {
            RecordKind::Exercise => {
                day.exercise_count += 1;
                exercise_days.insert(date);
                *exercise_category_counts
                    .entry(categorizer.categorize(&record.content))
                    .or_insert(0) += 1;
            }
            RecordKind::Diet => {
                day.diet_count += 1;
                diet_days.insert(date);
            }
        }
        total_count += 1;
    }

    let active_days = daily_breakdown
        .values()
        .filter(|day| day.is_active())
        .count();

    WeeklyStats {
        total_count,
        exercise_day_count: exercise_days.len(),
        diet_day_count: diet_days.len(),
        exercise_category_counts,
        consistency_score: consistency_score(active_days),
        daily_breakdown,
    }
}

/// round(active days / 7 * 100).
pub fn consistency_score(active_days: usize) -> u8 {
    ((active_days * 100) as f64 / WINDOW_DAYS as f64).round() as u8
}
