//! Tick label formatting.
//!
//! The layout engine only knows abstract time offsets. Turning an offset
//! into text is delegated to a [`LabelFormatter`].

use chrono::{Days, NaiveDate};

/// Converts a time offset into a human-readable label.
pub trait LabelFormatter {
    fn format(&self, time: f64) -> String;
}

impl<F> LabelFormatter for F
where
    F: Fn(f64) -> String,
{
    fn format(&self, time: f64) -> String {
        self(time)
    }
}

/// Renders the raw offset, rounded to the nearest unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetFormatter;

impl LabelFormatter for OffsetFormatter {
    fn format(&self, time: f64) -> String {
        format!("{}", time.round() as i64)
    }
}

/// Renders offsets as calendar dates, one unit per day after the base date.
#[derive(Debug, Clone, Copy)]
pub struct BaseDateFormatter {
    base_date: NaiveDate,
}

impl BaseDateFormatter {
    pub fn new(base_date: NaiveDate) -> Self {
        Self { base_date }
    }
}

impl LabelFormatter for BaseDateFormatter {
    fn format(&self, time: f64) -> String {
        let offset = time.round() as i64;
        let date = if offset >= 0 {
            self.base_date.checked_add_days(Days::new(offset as u64))
        } else {
            self.base_date
                .checked_sub_days(Days::new(offset.unsigned_abs()))
        };

        match date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            // Out of chrono's range; fall back to the offset
            None => OffsetFormatter.format(time),
        }
    }
}

/// Pick the formatter for an optional base date.
pub fn formatter_for(base_date: Option<NaiveDate>) -> Box<dyn LabelFormatter> {
    match base_date {
        Some(date) => Box::new(BaseDateFormatter::new(date)),
        None => Box::new(OffsetFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_formatter_rounds() {
        assert_eq!(OffsetFormatter.format(10.4), "10");
        assert_eq!(OffsetFormatter.format(-2.6), "-3");
    }

    #[test]
    fn test_base_date_formatter() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        let formatter = BaseDateFormatter::new(base);
        assert_eq!(formatter.format(0.0), "2024-01-30");
        assert_eq!(formatter.format(2.0), "2024-02-01");
        assert_eq!(formatter.format(-30.0), "2023-12-31");
    }

    #[test]
    fn test_base_date_formatter_out_of_range() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let formatter = BaseDateFormatter::new(base);
        assert_eq!(formatter.format(1e15), format!("{}", 1e15 as i64));
    }

    #[test]
    fn test_closure_formatter() {
        let formatter = |t: f64| format!("Year {}", t as i64);
        assert_eq!(LabelFormatter::format(&formatter, 12.0), "Year 12");
    }

    #[test]
    fn test_formatter_for() {
        assert_eq!(formatter_for(None).format(3.0), "3");
        let base = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(formatter_for(Some(base)).format(1.0), "2000-01-01");
    }
}
