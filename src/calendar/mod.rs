mod summary;
mod widget;
pub(crate) use self::summary::Summary;
pub(crate) use self::widget::{MonthCalendar, CALENDAR_HEIGHT};
