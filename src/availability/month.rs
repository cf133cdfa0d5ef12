use std::iter::successors;
use thiserror::Error;
use time::{Date, Month, Weekday};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Largest number of cells a month grid can need: six rows of seven days
pub(crate) const MAX_CELLS: usize = 6 * DAYS_IN_WEEK;

pub(crate) trait WeekdayExt {
    fn index0(&self) -> u16;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u16 {
        self.number_days_from_sunday().into()
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;

/// A displayed (year, month) pair
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    pub(crate) fn new(year: i32, month: Month) -> YearMonth {
        YearMonth { year, month }
    }

    pub(crate) fn of(date: Date) -> YearMonth {
        YearMonth::new(date.year(), date.month())
    }

    /// Normalizes a 0-based month index that may lie outside 0–11, so that
    /// month 12 of 2025 is January 2026 and month -1 of 2026 is December
    /// 2025.
    pub(crate) fn from_index(year: i32, month0: i32) -> YearMonth {
        let year = year.saturating_add(month0.div_euclid(12));
        let offset = u8::try_from(month0.rem_euclid(12)).unwrap_or(0);
        YearMonth::new(year, Month::January.nth_next(offset))
    }

    pub(crate) fn year(self) -> i32 {
        self.year
    }

    pub(crate) fn month(self) -> Month {
        self.month
    }

    /// Returns `None` if the month lies outside the supported calendar
    pub(crate) fn first_day(self) -> Option<Date> {
        Date::from_calendar_date(self.year, self.month, 1).ok()
    }

    /// Returns the date with the given day of this month, clamped to the
    /// month's last day
    pub(crate) fn clamp_day(self, day: u8) -> Option<Date> {
        let first = self.first_day()?;
        Some(
            self.iter_days(first)
                .take_while(|d| d.day() <= day.max(1))
                .last()
                .unwrap_or(first),
        )
    }

    pub(crate) fn next(self) -> Result<YearMonth, OutOfTimeError> {
        let next = if self.month == Month::December {
            YearMonth::new(self.year.checked_add(1).ok_or(OutOfTimeError)?, Month::January)
        } else {
            YearMonth::new(self.year, self.month.next())
        };
        next.checked()
    }

    pub(crate) fn previous(self) -> Result<YearMonth, OutOfTimeError> {
        let prev = if self.month == Month::January {
            YearMonth::new(self.year.checked_sub(1).ok_or(OutOfTimeError)?, Month::December)
        } else {
            YearMonth::new(self.year, self.month.previous())
        };
        prev.checked()
    }

    pub(crate) fn checked(self) -> Result<YearMonth, OutOfTimeError> {
        self.first_day().map(|_| self).ok_or(OutOfTimeError)
    }

    pub(crate) fn contains(self, date: Date) -> bool {
        YearMonth::of(date) == self
    }

    fn view(self) -> MonthView {
        let Some(first) = self.first_day() else {
            return MonthView {
                month: self,
                cells: Vec::new(),
            };
        };
        let leading = usize::from(first.weekday().index0());
        let mut cells = Vec::with_capacity(MAX_CELLS);
        cells.resize(leading, None);
        cells.extend(self.iter_days(first).map(Some));
        MonthView { month: self, cells }
    }

    fn iter_days(self, first: Date) -> impl Iterator<Item = Date> {
        successors(Some(first), |d| d.next_day()).take_while(move |d| d.month() == self.month)
    }
}

/// The calendar grid for one month: a blank cell for each weekday before the
/// 1st, then one cell per day
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthView {
    month: YearMonth,
    cells: Vec<Option<Date>>,
}

impl MonthView {
    pub(crate) fn month(&self) -> YearMonth {
        self.month
    }

    #[cfg(test)]
    pub(crate) fn cells(&self) -> &[Option<Date>] {
        &self.cells
    }

    #[cfg(test)]
    pub(crate) fn leading_blanks(&self) -> usize {
        self.cells.iter().take_while(|c| c.is_none()).count()
    }

    #[cfg(test)]
    pub(crate) fn days(&self) -> impl Iterator<Item = Date> + '_ {
        self.cells.iter().flatten().copied()
    }

    pub(crate) fn weeks(&self) -> impl Iterator<Item = &[Option<Date>]> {
        self.cells.chunks(DAYS_IN_WEEK)
    }
}

/// Builds the grid for a 0-based `month0`, which is normalized into a real
/// month first.  Years the calendar cannot represent yield an empty grid.
pub(crate) fn build_month(year: i32, month0: i32) -> MonthView {
    YearMonth::from_index(year, month0).view()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_month_starting_on_sunday() {
        let view = build_month(2026, 2);
        assert_eq!(view.month(), YearMonth::new(2026, Month::March));
        assert_eq!(view.leading_blanks(), 0);
        assert_eq!(view.cells().len(), 31);
        assert_eq!(view.cells()[0], Some(date!(2026 - 03 - 01)));
        assert_eq!(view.cells()[30], Some(date!(2026 - 03 - 31)));
    }

    #[test]
    fn test_leading_blanks_match_weekday() {
        let view = build_month(2026, 9);
        assert_eq!(view.leading_blanks(), 4);
        assert_eq!(&view.cells()[..4], &[None; 4]);
        assert_eq!(view.cells()[4], Some(date!(2026 - 10 - 01)));
        assert_eq!(view.days().count(), 31);
    }

    #[test]
    fn test_every_month_is_complete_and_ordered() {
        for year in [1999, 2000, 2024, 2025, 2026, 2100] {
            for month0 in 0..12 {
                let view = build_month(year, month0);
                let first = view.month().first_day().unwrap();
                assert_eq!(view.leading_blanks(), usize::from(first.weekday().index0()));
                assert!(view.cells()[..view.leading_blanks()]
                    .iter()
                    .all(Option::is_none));
                let days = view.days().collect::<Vec<_>>();
                assert_eq!(days.len(), expected_length(year, first.month()));
                assert!(days.windows(2).all(|w| w[0].next_day() == Some(w[1])));
                assert!(view.cells().len() <= MAX_CELLS);
            }
        }
    }

    fn expected_length(year: i32, month: Month) -> usize {
        match month {
            Month::February if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
            Month::February => 28,
            Month::April | Month::June | Month::September | Month::November => 30,
            _ => 31,
        }
    }

    #[test]
    fn test_leap_february() {
        assert_eq!(build_month(2024, 1).days().count(), 29);
        assert_eq!(build_month(2026, 1).days().count(), 28);
    }

    #[test]
    fn test_month_index_rolls_over() {
        assert_eq!(
            build_month(2025, 12).month(),
            YearMonth::new(2026, Month::January)
        );
        assert_eq!(
            build_month(2026, -1).month(),
            YearMonth::new(2025, Month::December)
        );
        assert_eq!(
            build_month(2026, 27).month(),
            YearMonth::new(2028, Month::April)
        );
        assert_eq!(build_month(2025, 12).leading_blanks(), 4);
        assert_eq!(build_month(2026, -1).leading_blanks(), 1);
    }

    #[test]
    fn test_six_row_month() {
        let view = build_month(2026, 7);
        assert_eq!(view.leading_blanks(), 6);
        assert_eq!(view.cells().len(), 37);
        assert_eq!(view.weeks().count(), 6);
    }

    #[test]
    fn test_unrepresentable_year_is_empty() {
        let view = build_month(i32::MAX, 0);
        assert!(view.cells().is_empty());
        assert_eq!(view.weeks().count(), 0);
    }

    #[test]
    fn test_next_and_previous() {
        let dec = YearMonth::new(2025, Month::December);
        assert_eq!(dec.next(), Ok(YearMonth::new(2026, Month::January)));
        assert_eq!(
            YearMonth::new(2026, Month::January).previous(),
            Ok(dec)
        );
        assert_eq!(
            YearMonth::new(9999, Month::December).next(),
            Err(OutOfTimeError)
        );
    }

    #[test]
    fn test_clamp_day() {
        let feb = YearMonth::new(2026, Month::February);
        assert_eq!(feb.clamp_day(31), Some(date!(2026 - 02 - 28)));
        assert_eq!(feb.clamp_day(14), Some(date!(2026 - 02 - 14)));
        assert_eq!(feb.clamp_day(0), Some(date!(2026 - 02 - 01)));
    }
}
