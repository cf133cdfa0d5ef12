//! Where a room's booked dates come from

use crate::availability::BookedDates;
use crate::isodate::{format_date, parse_date};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::iter::successors;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use thiserror::Error;

/// Longest stay a bookings row may span; longer rows are skipped
pub(crate) const MAX_STAY_NIGHTS: i64 = 366;

/// A provider of the dates on which a room is already reserved, as
/// `YYYY-MM-DD` strings
pub(crate) trait BookedDatesSource: Send + Sync + fmt::Debug {
    fn fetch_booked_dates(&self, room_id: &str) -> Result<Vec<String>, FetchError>;

    /// Forgets anything remembered about `room_id` so that the next fetch
    /// goes to the underlying data
    fn invalidate(&self, _room_id: &str) {}
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("failed to read bookings from {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse bookings from {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid booked date {value:?}")]
    InvalidDate {
        value: String,
        source: time::error::Parse,
    },
    #[error("failed to format booked date")]
    Format(#[from] time::error::Format),
}

/// Bookings export mirroring the backend's `bookings` table
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct BookingsFile {
    bookings: Vec<BookingRow>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
struct BookingRow {
    room_id: String,
    check_in: String,
    check_out: String,
    #[serde(default)]
    status: Option<String>,
}

impl BookingRow {
    fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}

/// Reads booked dates from a JSON bookings export.  Every night from a
/// booking's check-in up to (but excluding) its check-out is booked.  Rows
/// whose check-out is not after their check-in, or which span more than
/// [`MAX_STAY_NIGHTS`], are skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> JsonFileSource {
        JsonFileSource { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BookingsFile, FetchError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| FetchError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl BookedDatesSource for JsonFileSource {
    fn fetch_booked_dates(&self, room_id: &str) -> Result<Vec<String>, FetchError> {
        let mut nights = BTreeSet::new();
        for row in self.read()?.bookings {
            if row.room_id != room_id || row.is_cancelled() {
                continue;
            }
            let check_in = parse(&row.check_in)?;
            let check_out = parse(&row.check_out)?;
            let span = (check_out - check_in).whole_days();
            if !(1..=MAX_STAY_NIGHTS).contains(&span) {
                tracing::warn!(
                    room_id,
                    check_in = %row.check_in,
                    check_out = %row.check_out,
                    "skipping booking with an implausible stay"
                );
                continue;
            }
            nights.extend(
                successors(Some(check_in), |d| d.next_day()).take_while(|&d| d < check_out),
            );
        }
        nights
            .into_iter()
            .map(|d| format_date(d).map_err(FetchError::from))
            .collect()
    }
}

/// Fixed per-room booked dates
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct StaticSource(HashMap<String, Vec<String>>);

impl StaticSource {
    pub(crate) fn new() -> StaticSource {
        StaticSource::default()
    }

    pub(crate) fn with_room<I, S>(mut self, room_id: &str, dates: I) -> StaticSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .insert(room_id.to_owned(), dates.into_iter().map(Into::into).collect());
        self
    }
}

impl BookedDatesSource for StaticSource {
    fn fetch_booked_dates(&self, room_id: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.0.get(room_id).cloned().unwrap_or_default())
    }
}

/// Read-through cache in front of another source, keyed by room.  Failed
/// fetches are not cached.
#[derive(Debug)]
pub(crate) struct CachingSource<S> {
    inner: S,
    cache: Mutex<HashMap<String, Vec<String>>>,
}

impl<S: BookedDatesSource> CachingSource<S> {
    pub(crate) fn new(inner: S) -> CachingSource<S> {
        CachingSource {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: BookedDatesSource> BookedDatesSource for CachingSource<S> {
    fn fetch_booked_dates(&self, room_id: &str) -> Result<Vec<String>, FetchError> {
        if let Some(dates) = self.lock().get(room_id) {
            tracing::debug!(room_id, "booked dates served from cache");
            return Ok(dates.clone());
        }
        let dates = self.inner.fetch_booked_dates(room_id)?;
        self.lock().insert(room_id.to_owned(), dates.clone());
        Ok(dates)
    }

    fn invalidate(&self, room_id: &str) {
        self.lock().remove(room_id);
    }
}

fn parse(value: &str) -> Result<time::Date, FetchError> {
    parse_date(value).map_err(|source| FetchError::InvalidDate {
        value: value.to_owned(),
        source,
    })
}

/// Fetches and parses a room's booked dates.  A single malformed date fails
/// the whole load.
pub(crate) fn load_booked_dates(
    source: &dyn BookedDatesSource,
    room_id: &str,
) -> Result<BookedDates, FetchError> {
    source
        .fetch_booked_dates(room_id)?
        .iter()
        .map(|s| parse(s))
        .collect()
}

/// The result of a background fetch, tagged with the room it was for and
/// the generation of the calendar that asked for it
#[derive(Debug)]
pub(crate) struct Fetched {
    pub(crate) room_id: String,
    pub(crate) generation: u64,
    pub(crate) result: Result<BookedDates, FetchError>,
}

/// Loads `room_id`'s booked dates on a worker thread and sends the outcome
/// down `tx`
pub(crate) fn spawn_fetch(
    source: Arc<dyn BookedDatesSource>,
    room_id: String,
    generation: u64,
    tx: mpsc::Sender<Fetched>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!(%room_id, generation, "fetching booked dates");
        let result = load_booked_dates(source.as_ref(), &room_id);
        // The receiver is gone if the app quit mid-fetch
        let _ = tx.send(Fetched {
            room_id,
            generation,
            result,
        });
    })
}
