use crate::availability::{Availability, CalendarState, Selection};
use crate::config::Room;
use crate::isodate::format_date;
use crate::quote::{pesos, BookingQuote};
use crate::theme::summary::{ALERT_STYLE, AMOUNT_STYLE, LABEL_STYLE, NOTICE_STYLE};
use crate::theme::BASE_STYLE;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Paragraph, Widget},
};
use time::Date;

const LABEL_WIDTH: usize = 12;

/// The stay details beneath the calendar: dates, nights, price, and any
/// message for the user
#[derive(Clone, Copy, Debug)]
pub(crate) struct Summary<'a> {
    state: &'a CalendarState,
    room: &'a Room,
    guests: u8,
    downpayment_percent: u8,
}

impl<'a> Summary<'a> {
    pub(crate) fn new(
        state: &'a CalendarState,
        room: &'a Room,
        guests: u8,
        downpayment_percent: u8,
    ) -> Summary<'a> {
        Summary {
            state,
            room,
            guests,
            downpayment_percent,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        match self.state.selection() {
            Selection::Empty => {
                lines.push(Line::styled("Pick a check-in date", LABEL_STYLE));
            }
            Selection::CheckIn(check_in) => {
                lines.push(field("Check-in", show_date(check_in)));
                lines.push(Line::styled("Pick a check-out date", LABEL_STYLE));
            }
            sel @ Selection::Range {
                check_in,
                check_out,
            } => {
                lines.push(field("Check-in", show_date(check_in)));
                lines.push(field("Check-out", show_date(check_out)));
                match BookingQuote::new(self.room, sel, self.guests, self.downpayment_percent) {
                    Ok(quote) => {
                        lines.push(field("Nights", quote.nights().to_string()));
                        lines.push(amount("Total", quote.total()));
                        lines.push(Line::from_iter([
                            label(&format!("{}% down", quote.downpayment_percent())),
                            Span::styled(pesos(quote.downpayment_amount()), AMOUNT_STYLE),
                            Span::styled(
                                format!(
                                    " now, {} on arrival",
                                    pesos(quote.remaining_amount())
                                ),
                                BASE_STYLE,
                            ),
                        ]));
                    }
                    Err(e) => lines.push(Line::styled(e.to_string(), ALERT_STYLE)),
                }
            }
        }
        if let Availability::Unknown { reason } = self.state.availability() {
            lines.push(Line::styled(
                format!("Availability unknown ({reason}); all dates shown as open"),
                NOTICE_STYLE,
            ));
        }
        if let Some(alert) = self.state.alert() {
            lines.push(Line::styled(alert.to_string(), ALERT_STYLE));
        }
        lines
    }
}

impl Widget for Summary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(Text::from(self.lines()))
            .style(BASE_STYLE)
            .render(area, buf);
    }
}

fn show_date(date: Date) -> String {
    format_date(date).unwrap_or_else(|_| date.to_string())
}

fn label(name: &str) -> Span<'static> {
    Span::styled(format!("{name:LABEL_WIDTH$}"), LABEL_STYLE)
}

fn field(name: &str, value: String) -> Line<'static> {
    Line::from_iter([label(name), Span::styled(value, BASE_STYLE)])
}

fn amount(name: &str, value: u64) -> Line<'static> {
    Line::from_iter([label(name), Span::styled(pesos(value), AMOUNT_STYLE)])
}
