use chrono::{Duration, NaiveDate};

use crate::error::ValidationError;

/// Inclusive number of calendar days every aggregation window must cover.
pub const WINDOW_DAYS: i64 = 7;

/// A validated inclusive 7-day window. Constructing one is the proof that
/// the window contract holds; everything downstream takes it by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvertedWindow { start, end });
        }
        let days = (end - start).num_days() + 1;
        if days != WINDOW_DAYS {
            return Err(ValidationError::WrongSpan { days });
        }
        Ok(Self { start, end })
    }

    /// Window covering `start` and the six days after it.
    pub fn from_start(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(WINDOW_DAYS - 1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The seven calendar dates of the window, in calendar order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..WINDOW_DAYS).map(move |offset| self.start + Duration::days(offset))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Offset of `date` from the window start (0..=6), if inside the window.
    pub fn day_offset(&self, date: NaiveDate) -> Option<u8> {
        if !self.contains(date) {
            return None;
        }
        Some((date - self.start).num_days() as u8)
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_exact_seven_day_window() {
        let window = WeekWindow::new(date(2026, 8, 24), date(2026, 8, 30)).unwrap();
        assert_eq!(window.start(), date(2026, 8, 24));
        assert_eq!(window.end(), date(2026, 8, 30));
    }

    #[test]
    fn rejects_equal_dates() {
        let err = WeekWindow::new(date(2026, 8, 24), date(2026, 8, 24)).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn rejects_reversed_window() {
        let err = WeekWindow::new(date(2026, 8, 30), date(2026, 8, 24)).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn rejects_off_by_one_spans() {
        let err = WeekWindow::new(date(2026, 8, 24), date(2026, 8, 29)).unwrap_err();
        assert!(matches!(err, ValidationError::WrongSpan { days: 6 }));

        let err = WeekWindow::new(date(2026, 8, 24), date(2026, 8, 31)).unwrap_err();
        assert!(matches!(err, ValidationError::WrongSpan { days: 8 }));
    }

    #[test]
    fn days_iterates_seven_calendar_dates_in_order() {
        let window = WeekWindow::from_start(date(2026, 8, 24));
        let days: Vec<NaiveDate> = window.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2026, 8, 24));
        assert_eq!(days[6], date(2026, 8, 30));
        assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn day_offset_covers_window_bounds_only() {
        let window = WeekWindow::from_start(date(2026, 8, 24));
        assert_eq!(window.day_offset(date(2026, 8, 24)), Some(0));
        assert_eq!(window.day_offset(date(2026, 8, 30)), Some(6));
        assert_eq!(window.day_offset(date(2026, 8, 23)), None);
        assert_eq!(window.day_offset(date(2026, 8, 31)), None);
    }

    #[test]
    fn parse_date_maps_bad_input_to_validation_error() {
        assert!(parse_date("2026-08-24").is_ok());
        assert!(matches!(
            parse_date("not-a-date"),
            Err(ValidationError::InvalidDate(_))
        ));
    }
}
