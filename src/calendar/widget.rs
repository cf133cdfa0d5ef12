use crate::availability::{CalendarState, DayStatus};
use crate::theme::{
    days::{BOOKED_STYLE, IN_RANGE_STYLE, OPEN_STYLE, PAST_STYLE, RANGE_END_STYLE, TODAY_STYLE},
    TITLE_STYLE, WEEKDAY_STYLE,
};
use ratatui::{prelude::*, widgets::*};
use std::iter::zip;
use time::Date;

static HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa ";

static LOADING: &str = "Loading availability…";

/// Number of columns per day of week
const DAY_WIDTH: u16 = 4;

/// Width of the calendar in columns
pub(crate) const MAIN_WIDTH: u16 = 7 * DAY_WIDTH;

const TITLE_LINE: u16 = 0;

const HEADER_LINE: u16 = 1;

const RULE_LINE: u16 = 2;

const FIRST_WEEK_LINE: u16 = 3;

/// Lines needed to show any month: the title, the header and its rule, and
/// six weeks
pub(crate) const CALENDAR_HEIGHT: u16 = FIRST_WEEK_LINE + 6;

const ACS_HLINE: char = '─';

/// A one-month grid for the room being viewed, with `cursor` marking the
/// highlighted day
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthCalendar {
    cursor: Date,
}

impl MonthCalendar {
    pub(crate) fn new(cursor: Date) -> MonthCalendar {
        MonthCalendar { cursor }
    }
}

impl StatefulWidget for MonthCalendar {
    type State = CalendarState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let left = area.width.saturating_sub(MAIN_WIDTH) / 2;
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(left),
                Constraint::Length(MAIN_WIDTH.min(area.width)),
                Constraint::Min(0),
            ])
            .split(area);
        let mut canvas = BufferCanvas::new(chunks[1], buf);
        let view = state.month_view();
        let month = view.month();
        canvas.draw_title(&format!("{} {}", month.month(), month.year()));
        canvas.draw_header();
        if state.availability().is_loading() {
            canvas.draw_loading();
            return;
        }
        for (week_no, week) in zip(0u16.., view.weeks()) {
            for (wd, date) in zip(0u16.., week) {
                let Some(date) = *date else {
                    continue;
                };
                let style = day_style(state.status(date), date == state.today());
                canvas.draw_day(week_no, wd, date.day(), date == self.cursor, style);
            }
        }
    }
}

fn day_style(status: DayStatus, is_today: bool) -> Style {
    if status.is_range_start || status.is_range_end {
        RANGE_END_STYLE
    } else if status.is_in_range {
        IN_RANGE_STYLE
    } else if status.is_booked {
        BOOKED_STYLE
    } else if status.is_past {
        PAST_STYLE
    } else if is_today {
        TODAY_STYLE
    } else {
        OPEN_STYLE
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn draw_title(&mut self, title: &str) {
        let width = u16::try_from(title.len()).unwrap_or(u16::MAX);
        let x = MAIN_WIDTH.saturating_sub(width) / 2;
        self.mvprint(TITLE_LINE, x, title, Some(TITLE_STYLE));
    }

    fn draw_header(&mut self) {
        self.mvprint(HEADER_LINE, 0, HEADER, Some(WEEKDAY_STYLE));
        self.hline(RULE_LINE, 0, ACS_HLINE, MAIN_WIDTH);
    }

    fn draw_loading(&mut self) {
        self.mvprint(FIRST_WEEK_LINE, 0, LOADING, None);
    }

    fn draw_day(&mut self, week_no: u16, wd: u16, day: u8, is_cursor: bool, style: Style) {
        let s = if is_cursor {
            format!("[{day:2}]")
        } else {
            format!(" {day:2} ")
        };
        self.mvprint(FIRST_WEEK_LINE + week_no, DAY_WIDTH * wd, s, Some(style));
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // The Rect given to the Paragraph must lie entirely within the
            // buffer or rendering panics
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}
