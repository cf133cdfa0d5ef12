use crate::availability::{CalendarState, Event, YearMonth};
use crate::calendar::{MonthCalendar, Summary, CALENDAR_HEIGHT};
use crate::config::Room;
use crate::help::Help;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::quote::{pesos, BookingHandoff, BookingQuote, PaymentPlan};
use crate::source::{spawn_fetch, BookedDatesSource, Fetched};
use crate::theme::{BASE_STYLE, TITLE_STYLE};
use crossterm::event::{poll, read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    text::Line,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use time::Date;

/// How long to wait for a key before checking for finished fetches
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const SUMMARY_WIDTH: u16 = 60;

#[derive(Debug)]
pub(crate) struct App {
    rooms: Vec<Room>,
    room_index: usize,
    guests: u8,
    downpayment_percent: u8,
    source: Arc<dyn BookedDatesSource>,
    tx: mpsc::Sender<Fetched>,
    rx: mpsc::Receiver<Fetched>,
    /// Bumped whenever the calendar starts over, so answers to earlier
    /// fetches can be told apart
    generation: u64,
    calendar: CalendarState,
    cursor: Date,
    state: AppState,
    outcome: Option<BookingHandoff>,
}

impl App {
    /// Starts viewing `rooms[room_index]` for this month and kicks off the
    /// fetch of its booked dates.  `rooms` must not be empty.
    pub(crate) fn new(
        rooms: Vec<Room>,
        room_index: usize,
        source: Arc<dyn BookedDatesSource>,
        today: Date,
    ) -> App {
        let (tx, rx) = mpsc::channel();
        let room_index = room_index.min(rooms.len().saturating_sub(1));
        let app = App {
            rooms,
            room_index,
            guests: 1,
            downpayment_percent: 50,
            source,
            tx,
            rx,
            generation: 0,
            calendar: CalendarState::new(today),
            cursor: today,
            state: AppState::Calendar,
            outcome: None,
        };
        app.fetch();
        app
    }

    pub(crate) fn guests(mut self, guests: u8) -> App {
        self.guests = guests;
        self
    }

    pub(crate) fn downpayment_percent(mut self, pct: u8) -> App {
        self.downpayment_percent = pct;
        self
    }

    pub(crate) fn start_month(mut self, month: YearMonth) -> App {
        self.update(Event::ShowMonth(month));
        self.follow_month();
        self
    }

    /// Runs until the user quits or confirms a stay, returning the confirmed
    /// stay if any
    pub(crate) fn run<B: Backend>(
        mut self,
        mut terminal: Terminal<B>,
    ) -> io::Result<Option<BookingHandoff>> {
        while !self.quitting() {
            self.poll_fetches();
            self.draw(&mut terminal)?;
            self.handle_input()?;
        }
        Ok(self.outcome)
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if !poll(POLL_INTERVAL)? {
            return Ok(());
        }
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1),
                KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1),
                KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-7),
                KeyCode::Char('j') | KeyCode::Down => self.move_cursor(7),
                KeyCode::Char('p') | KeyCode::PageUp => self.change_month(Event::ShowPreviousMonth),
                KeyCode::Char('n') | KeyCode::PageDown => self.change_month(Event::ShowNextMonth),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.reset();
                    true
                }
                KeyCode::Enter | KeyCode::Char(' ') => self.pick(),
                KeyCode::Char('c') => {
                    self.update(Event::ClearSelection);
                    true
                }
                KeyCode::Tab => self.switch_room(true),
                KeyCode::BackTab => self.switch_room(false),
                KeyCode::Char('+') => self.change_guests(true),
                KeyCode::Char('-') => self.change_guests(false),
                KeyCode::Char('r') => {
                    self.reload();
                    true
                }
                KeyCode::Char('f') => self.confirm(PaymentPlan::Full),
                KeyCode::Char('d') => self.confirm(PaymentPlan::Downpayment),
                KeyCode::Char('g') => {
                    self.state = AppState::Jumping(JumpToState::new());
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Jumping(state) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    let output = match key {
                        KeyCode::Char(ch @ '0'..='9') => match ch
                            .to_digit(10)
                            .and_then(|d| u8::try_from(d).ok())
                        {
                            Some(d) => state.handle_input(JumpToInput::Digit(d)),
                            None => JumpToOutput::Invalid,
                        },
                        KeyCode::Backspace | KeyCode::Delete => {
                            state.handle_input(JumpToInput::Backspace)
                        }
                        KeyCode::Enter => state.handle_input(JumpToInput::Enter),
                        _ => JumpToOutput::Invalid,
                    };
                    match output {
                        JumpToOutput::Ok => true,
                        JumpToOutput::Invalid => false,
                        JumpToOutput::Jump(month) => {
                            self.state = AppState::Calendar;
                            self.update(Event::ShowMonth(month));
                            self.follow_month();
                            true
                        }
                    }
                }
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn room(&self) -> &Room {
        &self.rooms[self.room_index]
    }

    fn update(&mut self, event: Event) {
        self.calendar = self.calendar.clone().apply(event);
    }

    fn fetch(&self) {
        let room_id = self.room().id.clone();
        spawn_fetch(
            Arc::clone(&self.source),
            room_id,
            self.generation,
            self.tx.clone(),
        );
    }

    fn poll_fetches(&mut self) {
        while let Ok(fetched) = self.rx.try_recv() {
            self.receive(fetched);
        }
    }

    fn receive(&mut self, fetched: Fetched) {
        if fetched.room_id != self.room().id || fetched.generation != self.generation {
            tracing::debug!(
                room_id = %fetched.room_id,
                generation = fetched.generation,
                "discarding stale booked dates"
            );
            return;
        }
        let event = match fetched.result {
            Ok(booked) => {
                tracing::info!(room_id = %fetched.room_id, booked = booked.len(), "booked dates loaded");
                Event::BookedDatesLoaded(booked)
            }
            Err(e) => {
                tracing::warn!(room_id = %fetched.room_id, error = %e, "could not load booked dates");
                Event::BookedDatesFailed(e.to_string())
            }
        };
        self.update(event);
    }

    /// Moves the cursor `days` days and brings its month into view
    fn move_cursor(&mut self, days: i64) -> bool {
        let Some(cursor) = self.cursor.checked_add(time::Duration::days(days)) else {
            return false;
        };
        self.cursor = cursor;
        if !self.calendar.showing().contains(cursor) {
            self.update(Event::ShowMonth(YearMonth::of(cursor)));
        }
        true
    }

    fn change_month(&mut self, event: Event) -> bool {
        let before = self.calendar.showing();
        self.update(event);
        if self.calendar.showing() == before {
            return false;
        }
        self.follow_month();
        true
    }

    /// Keeps the cursor on the same day of the month now being shown,
    /// clamped to the month's length
    fn follow_month(&mut self) {
        let showing = self.calendar.showing();
        if !showing.contains(self.cursor) {
            if let Some(date) = showing.clamp_day(self.cursor.day()) {
                self.cursor = date;
            }
        }
    }

    fn reset(&mut self) {
        let today = self.calendar.today();
        self.cursor = today;
        self.update(Event::ShowMonth(YearMonth::of(today)));
    }

    fn pick(&mut self) -> bool {
        if !self.calendar.can_pick(self.cursor) {
            return false;
        }
        tracing::debug!(date = %self.cursor, "picked");
        self.update(Event::Pick(self.cursor));
        if let Some(alert) = self.calendar.alert() {
            tracing::info!(date = %self.cursor, "rejected check-out: {alert}");
        }
        true
    }

    /// Shows the next (or previous) room, starting its calendar over
    fn switch_room(&mut self, forwards: bool) -> bool {
        let count = self.rooms.len();
        if count < 2 {
            return false;
        }
        self.room_index = if forwards {
            (self.room_index + 1) % count
        } else {
            (self.room_index + count - 1) % count
        };
        self.guests = self.guests.clamp(1, self.room().capacity);
        tracing::info!(room_id = %self.room().id, "switched room");
        self.restart();
        true
    }

    fn change_guests(&mut self, more: bool) -> bool {
        let guests = if more {
            self.guests.saturating_add(1)
        } else {
            self.guests.saturating_sub(1)
        };
        if !(1..=self.room().capacity).contains(&guests) {
            return false;
        }
        self.guests = guests;
        true
    }

    /// Drops any cached booked dates for the current room and fetches them
    /// again
    fn reload(&mut self) {
        self.source.invalidate(&self.room().id);
        self.restart();
    }

    fn restart(&mut self) {
        let showing = self.calendar.showing();
        self.calendar = CalendarState::new(self.calendar.today()).showing_month(showing);
        self.generation += 1;
        self.fetch();
    }

    fn confirm(&mut self, plan: PaymentPlan) -> bool {
        match BookingQuote::new(
            self.room(),
            self.calendar.selection(),
            self.guests,
            self.downpayment_percent,
        ) {
            Ok(quote) => {
                let handoff = quote.handoff(plan);
                tracing::info!(
                    room_id = %handoff.room_id,
                    check_in = %handoff.check_in,
                    check_out = %handoff.check_out,
                    amount_to_pay = handoff.amount_to_pay,
                    "stay confirmed"
                );
                self.outcome = Some(handoff);
                self.state = AppState::Quitting;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "cannot confirm stay");
                false
            }
        }
    }

    fn header(&self) -> Line<'static> {
        let room = self.room();
        Line::styled(
            format!(
                "{} ({}/{})  ·  {} guest{}  ·  {}/night",
                room.name,
                self.room_index + 1,
                self.rooms.len(),
                self.guests,
                if self.guests == 1 { "" } else { "s" },
                pesos(room.price_per_night),
            ),
            TITLE_STYLE,
        )
        .centered()
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [header_area, calendar_area, _, summary_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(CALENDAR_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(area);
        self.header().render(header_area, buf);
        MonthCalendar::new(self.cursor).render(calendar_area, buf, &mut self.calendar);
        let [summary_area] = Layout::horizontal([SUMMARY_WIDTH])
            .flex(Flex::Center)
            .areas(summary_area);
        Summary::new(
            &self.calendar,
            self.room(),
            self.guests,
            self.downpayment_percent,
        )
        .render(summary_area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        } else if let AppState::Jumping(ref mut state) = self.state {
            JumpTo.render(area, buf, state);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Jumping(JumpToState),
    Quitting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{Availability, BookedDates, Selection};
    use crate::config::default_rooms;
    use crate::source::{FetchError, StaticSource};
    use time::{macros::date, Month};

    const TODAY: Date = date!(2026 - 03 - 04);

    fn source() -> Arc<dyn BookedDatesSource> {
        Arc::new(
            StaticSource::new()
                .with_room("1", ["2026-03-05", "2026-03-06"])
                .with_room("2", ["2026-03-10"]),
        )
    }

    fn settled(app: &mut App) {
        while app.calendar.availability().is_loading() {
            let fetched = app.rx.recv_timeout(Duration::from_secs(5)).unwrap();
            app.receive(fetched);
        }
    }

    fn new_app() -> App {
        let mut app = App::new(default_rooms(), 0, source(), TODAY);
        settled(&mut app);
        app
    }

    fn screen(app: &mut App) -> Vec<String> {
        let area = Rect::new(0, 0, 60, 20);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_book_a_stay() {
        let mut app = new_app().guests(2);
        assert!(app.handle_key(KeyCode::Char('l')));
        assert_eq!(app.cursor, date!(2026 - 03 - 05));
        // Booked
        assert!(!app.handle_key(KeyCode::Enter));
        assert!(app.handle_key(KeyCode::Char('j')));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(
            app.calendar.selection(),
            Selection::CheckIn(date!(2026 - 03 - 12))
        );
        assert!(!app.handle_key(KeyCode::Char('f')));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Char(' ')));
        assert!(app.handle_key(KeyCode::Char('d')));
        assert!(app.quitting());
        let handoff = app.outcome.unwrap();
        assert_eq!(handoff.check_in, "2026-03-12");
        assert_eq!(handoff.check_out, "2026-03-14");
        assert_eq!(handoff.nights, 2);
        assert_eq!(handoff.total_price, 6000);
        assert_eq!(handoff.payment_type, PaymentPlan::Downpayment);
        assert_eq!(handoff.amount_to_pay, 3000);
    }

    #[test]
    fn test_no_picks_while_loading() {
        let mut app = App::new(default_rooms(), 0, source(), TODAY);
        app.calendar = CalendarState::new(TODAY);
        assert!(!app.handle_key(KeyCode::Enter));
        assert_eq!(app.calendar.selection(), Selection::Empty);
    }

    #[test]
    fn test_cursor_follows_month() {
        let mut app = new_app();
        for _ in 0..4 {
            assert!(app.handle_key(KeyCode::Down));
        }
        assert_eq!(app.cursor, date!(2026 - 04 - 01));
        assert_eq!(app.calendar.showing(), YearMonth::new(2026, Month::April));
        assert!(app.handle_key(KeyCode::Char('p')));
        assert_eq!(app.calendar.showing(), YearMonth::new(2026, Month::March));
        assert_eq!(app.cursor, date!(2026 - 03 - 01));
        assert!(app.handle_key(KeyCode::Home));
        assert_eq!(app.cursor, TODAY);
    }

    #[test]
    fn test_month_change_clamps_day() {
        let mut app = App::new(default_rooms(), 0, source(), date!(2026 - 01 - 31));
        assert!(app.handle_key(KeyCode::PageDown));
        assert_eq!(app.cursor, date!(2026 - 02 - 28));
    }

    #[test]
    fn test_jump_to_month() {
        let mut app = new_app();
        assert!(app.handle_key(KeyCode::Char('g')));
        for ch in "202611".chars() {
            assert!(app.handle_key(KeyCode::Char(ch)));
        }
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Calendar);
        assert_eq!(app.calendar.showing(), YearMonth::new(2026, Month::November));
        assert_eq!(app.cursor, date!(2026 - 11 - 04));
    }

    #[test]
    fn test_switch_room() {
        let mut app = App::new(default_rooms(), 1, source(), TODAY).guests(4);
        settled(&mut app);
        assert!(app.handle_key(KeyCode::Char('j')));
        assert!(app.handle_key(KeyCode::Enter));
        assert!(app.handle_key(KeyCode::BackTab));
        assert_eq!(app.room().id, "1");
        assert_eq!(app.guests, 2);
        assert_eq!(app.calendar.selection(), Selection::Empty);
        assert!(app.calendar.availability().is_loading());
        // A late answer for the room we left changes nothing
        app.receive(Fetched {
            room_id: "2".into(),
            generation: app.generation,
            result: Ok(BookedDates::new()),
        });
        assert!(app.calendar.availability().is_loading());
        settled(&mut app);
        assert!(app.calendar.availability().booked().contains(date!(2026 - 03 - 05)));
    }

    #[test]
    fn test_single_room_cannot_switch() {
        let mut app = App::new(default_rooms().into_iter().take(1).collect(), 0, source(), TODAY);
        assert!(!app.handle_key(KeyCode::Tab));
    }

    #[test]
    fn test_guest_limits() {
        let mut app = new_app();
        assert!(!app.handle_key(KeyCode::Char('-')));
        assert!(app.handle_key(KeyCode::Char('+')));
        assert!(!app.handle_key(KeyCode::Char('+')));
        assert_eq!(app.guests, 2);
    }

    #[test]
    fn test_failed_fetch_leaves_dates_open() {
        let mut app = new_app();
        app.calendar = CalendarState::new(TODAY);
        app.receive(Fetched {
            room_id: "1".into(),
            generation: app.generation,
            result: Err(FetchError::Read {
                path: "bookings.json".into(),
                source: io::Error::other("offline"),
            }),
        });
        assert!(matches!(
            app.calendar.availability(),
            Availability::Unknown { .. }
        ));
        assert!(app.handle_key(KeyCode::Right));
        assert!(app.handle_key(KeyCode::Enter));
        assert_eq!(
            app.calendar.selection(),
            Selection::CheckIn(date!(2026 - 03 - 05))
        );
    }

    #[test]
    fn test_reload() {
        let mut app = new_app();
        assert!(app.handle_key(KeyCode::Char('r')));
        assert!(app.calendar.availability().is_loading());
        settled(&mut app);
        assert!(!app.calendar.availability().is_loading());
    }

    #[test]
    fn test_stale_fetch_cannot_reopen_range() {
        let mut app = new_app();
        assert!(app.handle_key(KeyCode::Char('r')));
        let stale = app.generation;
        assert!(app.handle_key(KeyCode::Char('r')));
        settled(&mut app);
        assert!(app.handle_key(KeyCode::Char('j')));
        assert!(app.handle_key(KeyCode::Enter));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Enter));
        let range = Selection::Range {
            check_in: date!(2026 - 03 - 11),
            check_out: date!(2026 - 03 - 13),
        };
        assert_eq!(app.calendar.selection(), range);
        let booked = [date!(2026 - 03 - 12), date!(2026 - 03 - 13)]
            .into_iter()
            .collect::<BookedDates>();
        // An answer to a fetch from before the last reload
        app.receive(Fetched {
            room_id: "1".into(),
            generation: stale,
            result: Ok(booked.clone()),
        });
        assert_eq!(app.calendar.selection(), range);
        assert!(!app.calendar.availability().booked().contains(date!(2026 - 03 - 12)));
        // A second answer for the current generation once it has settled
        app.receive(Fetched {
            room_id: "1".into(),
            generation: app.generation,
            result: Ok(booked),
        });
        assert_eq!(app.calendar.selection(), range);
        assert!(!app.calendar.availability().booked().contains(date!(2026 - 03 - 12)));
    }

    #[test]
    fn test_rejected_checkout_is_reported() {
        let mut app = new_app();
        assert!(app.handle_key(KeyCode::Enter));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Char('l')));
        assert!(app.handle_key(KeyCode::Enter));
        assert!(app.calendar.alert().is_some());
        assert_eq!(
            app.calendar.selection(),
            Selection::CheckIn(date!(2026 - 03 - 07))
        );
    }

    #[test]
    fn test_render() {
        let mut app = new_app().guests(2);
        let lines = screen(&mut app);
        assert_eq!(
            lines[0].trim(),
            "Oceanus Room (1/5)  ·  2 guests  ·  ₱3,000/night"
        );
        assert_eq!(lines[1].trim(), "March 2026");
        assert_eq!(lines[4].trim(), "1   2   3 [ 4]  5   6   7");
        assert_eq!(lines[11].trim(), "Pick a check-in date");
    }

    #[test]
    fn test_help_and_quit() {
        let mut app = new_app();
        assert!(app.handle_key(KeyCode::Char('?')));
        assert!(screen(&mut app).iter().any(|l| l.contains(" Commands ")));
        assert!(app.handle_key(KeyCode::Char('x')));
        assert_eq!(app.state, AppState::Calendar);
        assert!(!app.handle_key(KeyCode::Char('x')));
        assert!(app.handle_key(KeyCode::Esc));
        assert!(app.quitting());
        assert_eq!(app.outcome, None);
    }
}
