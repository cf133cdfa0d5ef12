use std::collections::BTreeSet;
use std::ops::Bound::Excluded;
use std::sync::Arc;
use thiserror::Error;
use time::Date;

/// The dates on which a room is already reserved.  Shared read-only between
/// calendar states, never mutated once built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct BookedDates(Arc<BTreeSet<Date>>);

impl BookedDates {
    pub(crate) fn new() -> BookedDates {
        BookedDates::default()
    }

    pub(crate) fn contains(&self, date: Date) -> bool {
        self.0.contains(&date)
    }

    /// Tests whether any booked date lies strictly between `start` and `end`
    pub(crate) fn any_between(&self, start: Date, end: Date) -> bool {
        // BTreeSet::range() panics on an empty doubly-excluded range
        start < end && self.0.range((Excluded(start), Excluded(end))).next().is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Date> for BookedDates {
    fn from_iter<I: IntoIterator<Item = Date>>(iter: I) -> BookedDates {
        BookedDates(Arc::new(iter.into_iter().collect()))
    }
}

/// An in-progress check-in/check-out selection.  A completed range always
/// has `check_out > check_in`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum Selection {
    #[default]
    Empty,
    CheckIn(Date),
    Range { check_in: Date, check_out: Date },
}

impl Selection {
    pub(crate) fn check_in(self) -> Option<Date> {
        match self {
            Selection::Empty => None,
            Selection::CheckIn(d) | Selection::Range { check_in: d, .. } => Some(d),
        }
    }

    pub(crate) fn check_out(self) -> Option<Date> {
        match self {
            Selection::Range { check_out, .. } => Some(check_out),
            Selection::Empty | Selection::CheckIn(_) => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_complete(self) -> bool {
        matches!(self, Selection::Range { .. })
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("range contains unavailable dates")]
pub(crate) struct RangeConflict;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SelectOutcome {
    pub(crate) selection: Selection,
    pub(crate) error: Option<RangeConflict>,
}

impl SelectOutcome {
    fn accepted(selection: Selection) -> SelectOutcome {
        SelectOutcome {
            selection,
            error: None,
        }
    }
}

/// How a single day should be presented and whether it may be clicked
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct DayStatus {
    pub(crate) selectable: bool,
    pub(crate) is_booked: bool,
    pub(crate) is_past: bool,
    pub(crate) is_range_start: bool,
    pub(crate) is_range_end: bool,
    pub(crate) is_in_range: bool,
}

pub(crate) fn classify(
    date: Date,
    booked: &BookedDates,
    today: Date,
    selection: Selection,
) -> DayStatus {
    let is_past = date < today;
    let is_booked = booked.contains(date);
    let is_in_range = match selection {
        Selection::Range {
            check_in,
            check_out,
        } => (check_in..=check_out).contains(&date),
        Selection::Empty | Selection::CheckIn(_) => false,
    };
    DayStatus {
        selectable: !is_past && !is_booked,
        is_booked,
        is_past,
        is_range_start: selection.check_in() == Some(date),
        is_range_end: selection.check_out() == Some(date),
        is_in_range,
    }
}

/// Applies a click on `date` to `selection`.
///
/// Clicking an end date whose stay would cross a booked night does not
/// discard the click: the clicked date becomes the new check-in and the
/// conflict is reported alongside it.
pub(crate) fn select_date(
    date: Date,
    booked: &BookedDates,
    today: Date,
    selection: Selection,
) -> SelectOutcome {
    if booked.contains(date) || date < today {
        return SelectOutcome::accepted(selection);
    }
    match selection {
        Selection::Empty | Selection::Range { .. } => {
            SelectOutcome::accepted(Selection::CheckIn(date))
        }
        Selection::CheckIn(check_in) if date <= check_in => {
            SelectOutcome::accepted(Selection::CheckIn(date))
        }
        Selection::CheckIn(check_in) if booked.any_between(check_in, date) => SelectOutcome {
            selection: Selection::CheckIn(date),
            error: Some(RangeConflict),
        },
        Selection::CheckIn(check_in) => SelectOutcome::accepted(Selection::Range {
            check_in,
            check_out: date,
        }),
    }
}

/// Number of nights in a completed selection, counted in calendar days
pub(crate) fn nights(selection: Selection) -> u32 {
    match selection {
        Selection::Range {
            check_in,
            check_out,
        } => u32::try_from((check_out - check_in).whole_days()).unwrap_or(0),
        Selection::Empty | Selection::CheckIn(_) => 0,
    }
}

pub(crate) fn total_price(selection: Selection, price_per_night: u64) -> u64 {
    u64::from(nights(selection)).saturating_mul(price_per_night)
}
