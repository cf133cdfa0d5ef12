use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

const KEY_COLUMN: usize = 16;

static COMMANDS: &[(&str, &str)] = &[
    ("h/l, LEFT/RIGHT", "Previous/next day"),
    ("k/j, UP/DOWN", "Previous/next week"),
    ("p/n, PGUP/PGDN", "Previous/next month"),
    ("0, HOME", "Jump to today"),
    ("g", "Input month to jump to"),
    ("ENTER, SPACE", "Pick check-in/check-out"),
    ("c", "Clear selection"),
    ("TAB, S-TAB", "Next/previous room"),
    ("+/-", "More/fewer guests"),
    ("r", "Reload availability"),
    ("f", "Book, paying in full"),
    ("d", "Book, paying the downpayment"),
    ("?", "Show this help"),
    ("q, ESC", "Quit"),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Help {
    fn text(self) -> Text<'static> {
        let key_style = self.0.add_modifier(Modifier::BOLD);
        let mut lines = COMMANDS
            .iter()
            .map(|&(keys, desc)| {
                Line::from_iter([
                    Span::styled(format!("{keys:KEY_COLUMN$}"), key_style),
                    Span::raw(desc),
                ])
            })
            .collect::<Vec<_>>();
        lines.push(Line::raw(""));
        lines.push(Line::raw("Press the Any Key to dismiss."));
        Text::from(lines)
    }
}

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = self.text();
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let para = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Commands ")
                    .title_alignment(Alignment::Center),
            )
            .style(self.0);
        let [help_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [help_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(help_area);
        Clear.render(help_area, buf);
        para.render(help_area, buf);
    }
}
