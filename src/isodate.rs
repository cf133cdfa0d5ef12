use crate::availability::YearMonth;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date, Month};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

pub(crate) fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, &YMD_FMT)
}

pub(crate) fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(&YMD_FMT)
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid month {0:?}; expected YYYY-MM")]
pub(crate) struct InvalidYearMonth(String);

pub(crate) fn parse_year_month(s: &str) -> Result<YearMonth, InvalidYearMonth> {
    let invalid = || InvalidYearMonth(s.to_owned());
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month
        .parse::<u8>()
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(invalid)?;
    YearMonth::new(year, month).checked().map_err(|_| invalid())
}
