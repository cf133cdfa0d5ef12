use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const TITLE_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) mod days {
    use super::*;

    pub(crate) const RANGE_END_STYLE: Style = Style::new()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    pub(crate) const IN_RANGE_STYLE: Style = Style::new().fg(Color::Black).bg(Color::LightCyan);

    pub(crate) const BOOKED_STYLE: Style = Style::new()
        .fg(Color::LightRed)
        .add_modifier(Modifier::CROSSED_OUT);

    pub(crate) const PAST_STYLE: Style = Style::new().fg(Color::DarkGray);

    pub(crate) const TODAY_STYLE: Style = Style::new().add_modifier(Modifier::UNDERLINED);

    pub(crate) const OPEN_STYLE: Style = Style::new();
}

pub(crate) mod summary {
    use super::*;

    pub(crate) const LABEL_STYLE: Style = BASE_STYLE.fg(Color::Gray);

    pub(crate) const AMOUNT_STYLE: Style = BASE_STYLE.fg(Color::LightCyan).add_modifier(Modifier::BOLD);

    pub(crate) const ALERT_STYLE: Style = BASE_STYLE.fg(Color::LightRed);

    pub(crate) const NOTICE_STYLE: Style = BASE_STYLE.fg(Color::Yellow);
}

pub(crate) mod jumpto {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
