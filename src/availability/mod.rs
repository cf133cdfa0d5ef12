mod month;
mod selection;
mod state;
pub(crate) use self::month::YearMonth;
pub(crate) use self::selection::{nights, total_price, BookedDates, DayStatus, Selection};
pub(crate) use self::state::{Availability, CalendarState, Event};
