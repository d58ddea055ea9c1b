use jiff::{ToSpan, civil::Date};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// `days` consecutive calendar days starting at `today`, formatted `DD-MM-YYYY`.
pub fn date_window(today: Date, days: usize) -> AppResult<Vec<String>> {
    if days == 0 {
        return Err(AppError::Config("date window must cover at least one day".to_string()));
    }

    (0..days as i64)
        .map(|offset| -> AppResult<String> {
            let day = today.checked_add(offset.days())?;
            Ok(day.strftime(DATE_FORMAT).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn crosses_month_and_year_boundaries() {
        let dates = date_window(date(2024, 12, 30), 4).unwrap();
        assert_eq!(dates, vec!["30-12-2024", "31-12-2024", "01-01-2025", "02-01-2025"]);
    }

    #[test]
    fn default_horizon_is_ten_days() {
        let dates = date_window(date(2025, 2, 1), 10).unwrap();
        assert_eq!(dates.len(), 10);
        assert_eq!(dates.first().map(String::as_str), Some("01-02-2025"));
        assert_eq!(dates.last().map(String::as_str), Some("10-02-2025"));
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(date_window(date(2025, 2, 1), 0).is_err());
    }
}
