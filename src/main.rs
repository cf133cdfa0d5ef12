mod app;
mod availability;
mod calendar;
mod config;
mod help;
mod isodate;
mod jumpto;
mod quote;
mod source;
mod theme;
use crate::app::App;
use crate::availability::YearMonth;
use crate::config::Config;
use crate::isodate::{parse_date, parse_year_month};
use crate::source::{BookedDatesSource, CachingSource, JsonFileSource, StaticSource};
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::{Date, OffsetDateTime};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(RunOptions),
    Help,
    Version,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct RunOptions {
    month: Option<YearMonth>,
    room: Option<String>,
    guests: Option<u8>,
    bookings: Option<PathBuf>,
    config: Option<PathBuf>,
    today: Option<Date>,
    log: Option<PathBuf>,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = RunOptions::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('r') | Arg::Long("room") => {
                    opts.room = Some(parser.value()?.string()?);
                }
                Arg::Short('g') | Arg::Long("guests") => {
                    opts.guests = Some(parser.value()?.parse::<u8>()?);
                }
                Arg::Short('b') | Arg::Long("bookings") => {
                    opts.bookings = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('c') | Arg::Long("config") => {
                    opts.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("today") => {
                    opts.today = Some(parser.value()?.parse_with(parse_date)?);
                }
                Arg::Long("log") => {
                    opts.log = Some(PathBuf::from(parser.value()?));
                }
                Arg::Value(value) if opts.month.is_none() => {
                    opts.month = Some(value.parse_with(parse_year_month)?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(opts))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opts) => {
                if let Some(path) = &opts.log {
                    init_logging(path)?;
                }
                let config =
                    Config::load(opts.config.as_deref()).context("failed to load configuration")?;
                let room_index = match &opts.room {
                    Some(id) => config
                        .room_index(id)
                        .with_context(|| format!("no room with id {id:?}"))?,
                    None => 0,
                };
                let capacity = config
                    .rooms
                    .get(room_index)
                    .map(|r| r.capacity)
                    .context("room catalog is empty")?;
                let guests = opts.guests.unwrap_or(1);
                if !(1..=capacity).contains(&guests) {
                    anyhow::bail!("guest count must be between 1 and {capacity} for this room");
                }
                let source = booked_dates_source(&config, opts.bookings);
                let today = match opts.today {
                    Some(d) => d,
                    None => OffsetDateTime::now_local()
                        .context("failed to determine local date")?
                        .date(),
                };
                let downpayment_percent = config.downpayment_percent;
                let mut app = App::new(config.rooms, room_index, source, today)
                    .guests(guests)
                    .downpayment_percent(downpayment_percent);
                if let Some(month) = opts.month {
                    app = app.start_month(month);
                }
                let handoff = with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    app.run(terminal).context("terminal I/O failed")
                })?;
                if let Some(handoff) = handoff {
                    let json = serde_json::to_string_pretty(&handoff)
                        .context("failed to serialize booking")?;
                    println!("{json}");
                }
                Ok(())
            }
            Command::Help => {
                println!("Usage: staycal [options] [YYYY-MM]");
                println!();
                println!("Pick check-in and check-out dates for a room from a terminal calendar");
                println!();
                println!("Options:");
                println!("  -r, --room ID         Start on the room with the given id");
                println!("  -g, --guests N        Number of guests [default: 1]");
                println!("  -b, --bookings FILE   Read booked dates from a JSON bookings export");
                println!("  -c, --config FILE     Read configuration from FILE [default: ./staycal.toml]");
                println!("      --today YYYY-MM-DD");
                println!("                        Treat the given date as today");
                println!("      --log FILE        Write a log to FILE");
                println!("  -h, --help            Display this help message and exit");
                println!("  -V, --version         Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn booked_dates_source(config: &Config, bookings: Option<PathBuf>) -> Arc<dyn BookedDatesSource> {
    match bookings.or_else(|| config.bookings.clone()) {
        Some(path) => {
            let source = JsonFileSource::new(path);
            tracing::info!(path = %source.path().display(), "reading booked dates from file");
            Arc::new(CachingSource::new(source))
        }
        None => {
            tracing::info!("no bookings file, using blocked dates from the room catalog");
            Arc::new(
                config
                    .rooms
                    .iter()
                    .fold(StaticSource::new(), |source, room| {
                        source.with_room(&room.id, room.blocked.iter().cloned())
                    }),
            )
        }
    }
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Month};

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_args(args))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(RunOptions::default()));
    }

    #[test]
    fn test_all_options() {
        let cmd = parse(&[
            "--room",
            "3",
            "-g",
            "4",
            "-b",
            "bookings.json",
            "--config",
            "hotel.toml",
            "--today",
            "2026-03-04",
            "--log",
            "staycal.log",
            "2026-05",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(RunOptions {
                month: Some(YearMonth::new(2026, Month::May)),
                room: Some("3".into()),
                guests: Some(4),
                bookings: Some("bookings.json".into()),
                config: Some("hotel.toml".into()),
                today: Some(date!(2026 - 03 - 04)),
                log: Some("staycal.log".into()),
            })
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["-h"]).unwrap(), Command::Help);
        assert_eq!(parse(&["2026-05", "--version"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_bad_args() {
        assert!(parse(&["2026-5"]).is_err());
        assert!(parse(&["2026-05", "2026-06"]).is_err());
        assert!(parse(&["--today", "tomorrow"]).is_err());
        assert!(parse(&["--guests", "many"]).is_err());
        assert!(parse(&["--room"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }

    #[test]
    fn test_static_source_from_catalog() {
        let mut config = Config::default();
        config.rooms[0].blocked = vec!["2026-03-05".into()];
        let source = booked_dates_source(&config, None);
        assert_eq!(
            source.fetch_booked_dates("1").unwrap(),
            vec![String::from("2026-03-05")]
        );
        assert!(source.fetch_booked_dates("2").unwrap().is_empty());
    }
}
