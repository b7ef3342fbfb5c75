use std::fmt;
use std::ops::Range;
use anyhow::anyhow;
use chrono::{Datelike, Months, NaiveDate};

/// How the chart splits time into windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Calendar months
    Month,
    /// Calendar years
    Year,
    /// From the start of each year up to the same day as today
    YearToDate,
}

impl Mode {
    pub(crate) fn number(self) -> u8 {
        match self {
            Mode::Month => 1,
            Mode::Year => 2,
            Mode::YearToDate => 3,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::Month),
            2 => Ok(Mode::Year),
            3 => Ok(Mode::YearToDate),
            _ => Err(anyhow!("Unknown mode {}, expected 1, 2 or 3", value)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Compute `n` half-open date windows relative to `today`, newest first.
///
/// E.g. with today 2024-03-15 and `n` = 2:
/// - `Month`: 2024-03-01..2024-04-01, 2024-02-01..2024-03-01
/// - `Year`: 2024-01-01..2025-01-01, 2023-01-01..2024-01-01
/// - `YearToDate`: 2024-01-01..2024-03-16, 2023-01-01..2023-03-16
pub(crate) fn windows(mode: Mode, n: u32, today: NaiveDate) -> anyhow::Result<Vec<Range<NaiveDate>>> {
    (0..n).map(|i| match mode {
        Mode::Month => month_window(today, i),
        Mode::Year => year_window(today.year() - i as i32),
        Mode::YearToDate => year_to_date_window(today, i),
    }).collect()
}

fn month_window(today: NaiveDate, months_back: u32) -> anyhow::Result<Range<NaiveDate>> {
    let start = ymd(today.year(), today.month(), 1)?
        .checked_sub_months(Months::new(months_back))
        .ok_or_else(|| anyhow!("Date out of range"))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| anyhow!("Date out of range"))?;
    Ok(start..end)
}

fn year_window(year: i32) -> anyhow::Result<Range<NaiveDate>> {
    Ok(ymd(year, 1, 1)?..ymd(year + 1, 1, 1)?)
}

fn year_to_date_window(today: NaiveDate, years_back: u32) -> anyhow::Result<Range<NaiveDate>> {
    let start = ymd(today.year() - years_back as i32, 1, 1)?;
    let tomorrow = today.succ_opt().ok_or_else(|| anyhow!("Date out of range"))?;
    let year = tomorrow.year() - years_back as i32;
    // 29 February shifted into a non-leap year becomes 1 March
    let end = match NaiveDate::from_ymd_opt(year, tomorrow.month(), tomorrow.day()) {
        Some(end) => end,
        None => ymd(year, 3, 1)?,
    };
    Ok(start..end)
}

fn ymd(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("Invalid date {}-{}-{}", year, month, day))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::window::{windows, Mode};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_windows() {
        let result = windows(Mode::Month, 3, date(2024, 1, 15)).unwrap();
        assert_eq!(result, vec![
            date(2024, 1, 1)..date(2024, 2, 1),
            date(2023, 12, 1)..date(2024, 1, 1),
            date(2023, 11, 1)..date(2023, 12, 1),
        ]);

        let result = windows(Mode::Month, 2, date(2023, 12, 31)).unwrap();
        assert_eq!(result, vec![
            date(2023, 12, 1)..date(2024, 1, 1),
            date(2023, 11, 1)..date(2023, 12, 1),
        ]);

        let result = windows(Mode::Month, 13, date(2024, 3, 31)).unwrap();
        assert_eq!(result.len(), 13);
        assert_eq!(result[12], date(2023, 3, 1)..date(2023, 4, 1));
    }

    #[test]
    fn test_year_windows() {
        let result = windows(Mode::Year, 2, date(2024, 3, 15)).unwrap();
        assert_eq!(result, vec![
            date(2024, 1, 1)..date(2025, 1, 1),
            date(2023, 1, 1)..date(2024, 1, 1),
        ]);
    }

    #[test]
    fn test_year_to_date_windows() {
        let result = windows(Mode::YearToDate, 2, date(2024, 3, 15)).unwrap();
        assert_eq!(result, vec![
            date(2024, 1, 1)..date(2024, 3, 16),
            date(2023, 1, 1)..date(2023, 3, 16),
        ]);

        // Last day of year covers the whole year
        let result = windows(Mode::YearToDate, 2, date(2023, 12, 31)).unwrap();
        assert_eq!(result, vec![
            date(2023, 1, 1)..date(2024, 1, 1),
            date(2022, 1, 1)..date(2023, 1, 1),
        ]);

        // Tomorrow is a leap day
        let result = windows(Mode::YearToDate, 2, date(2024, 2, 28)).unwrap();
        assert_eq!(result, vec![
            date(2024, 1, 1)..date(2024, 2, 29),
            date(2023, 1, 1)..date(2023, 3, 1),
        ]);
    }

    #[test]
    fn test_zero_windows() {
        assert!(windows(Mode::Month, 0, date(2024, 3, 15)).unwrap().is_empty());
    }

    #[test]
    fn test_mode() {
        assert_eq!(Mode::try_from(3u8).unwrap(), Mode::YearToDate);
        assert!(Mode::try_from(4u8).is_err());
        assert_eq!(Mode::Year.to_string(), "2");
    }
}
