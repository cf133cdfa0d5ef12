use super::month::{build_month, MonthView, OutOfTimeError, YearMonth};
use super::selection::{classify, select_date, BookedDates, DayStatus, RangeConflict, Selection};
use std::sync::LazyLock;
use thiserror::Error;
use time::Date;

static NO_BOOKINGS: LazyLock<BookedDates> = LazyLock::new(BookedDates::new);

/// What is known about a room's booked dates
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Availability {
    /// The fetch is still outstanding; no day may be picked yet
    Loading,
    Ready(BookedDates),
    /// The fetch failed.  Every date is treated as open.
    Unknown { reason: String },
}

impl Availability {
    pub(crate) fn booked(&self) -> &BookedDates {
        match self {
            Availability::Ready(booked) => booked,
            Availability::Loading | Availability::Unknown { .. } => &NO_BOOKINGS,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self, Availability::Loading)
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum Alert {
    #[error(transparent)]
    Conflict(#[from] RangeConflict),
    #[error(transparent)]
    OutOfTime(#[from] OutOfTimeError),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Event {
    ShowPreviousMonth,
    ShowNextMonth,
    ShowMonth(YearMonth),
    Pick(Date),
    ClearSelection,
    BookedDatesLoaded(BookedDates),
    BookedDatesFailed(String),
}

/// Calendar state for a single room view.  Every change goes through
/// [`CalendarState::apply`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CalendarState {
    today: Date,
    showing: YearMonth,
    availability: Availability,
    selection: Selection,
    alert: Option<Alert>,
}

impl CalendarState {
    pub(crate) fn new(today: Date) -> CalendarState {
        CalendarState {
            today,
            showing: YearMonth::of(today),
            availability: Availability::Loading,
            selection: Selection::Empty,
            alert: None,
        }
    }

    pub(crate) fn showing_month(mut self, month: YearMonth) -> CalendarState {
        if month.checked().is_ok() {
            self.showing = month;
        }
        self
    }

    pub(crate) fn today(&self) -> Date {
        self.today
    }

    pub(crate) fn showing(&self) -> YearMonth {
        self.showing
    }

    pub(crate) fn month_view(&self) -> MonthView {
        let month0 = i32::from(u8::from(self.showing.month())) - 1;
        build_month(self.showing.year(), month0)
    }

    pub(crate) fn availability(&self) -> &Availability {
        &self.availability
    }

    pub(crate) fn selection(&self) -> Selection {
        self.selection
    }

    pub(crate) fn alert(&self) -> Option<Alert> {
        self.alert
    }

    pub(crate) fn status(&self, date: Date) -> DayStatus {
        classify(
            date,
            self.availability.booked(),
            self.today,
            self.selection,
        )
    }

    /// Whether a [`Event::Pick`] of `date` would be acted upon
    pub(crate) fn can_pick(&self, date: Date) -> bool {
        !self.availability.is_loading() && self.status(date).selectable
    }

    pub(crate) fn apply(mut self, event: Event) -> CalendarState {
        match event {
            Event::ShowPreviousMonth => self.move_to(self.showing.previous()),
            Event::ShowNextMonth => self.move_to(self.showing.next()),
            Event::ShowMonth(month) => self.move_to(month.checked()),
            Event::Pick(date) => {
                if self.can_pick(date) {
                    let outcome =
                        select_date(date, self.availability.booked(), self.today, self.selection);
                    self.selection = outcome.selection;
                    self.alert = outcome.error.map(Alert::from);
                }
            }
            Event::ClearSelection => {
                self.selection = Selection::Empty;
                self.alert = None;
            }
            // Only the first answer after entering `Loading` is taken
            Event::BookedDatesLoaded(booked) if self.availability.is_loading() => {
                self.availability = Availability::Ready(booked);
            }
            Event::BookedDatesFailed(reason) if self.availability.is_loading() => {
                self.availability = Availability::Unknown { reason };
            }
            Event::BookedDatesLoaded(_) | Event::BookedDatesFailed(_) => (),
        }
        self
    }

    fn move_to(&mut self, month: Result<YearMonth, OutOfTimeError>) {
        match month {
            Ok(m) => {
                self.showing = m;
                if matches!(self.alert, Some(Alert::OutOfTime(_))) {
                    self.alert = None;
                }
            }
            Err(e) => self.alert = Some(e.into()),
        }
    }
}
