use crate::availability::YearMonth;
use crate::isodate::parse_year_month;
use crate::theme::{
    jumpto::{READY_ENTER_STYLE, UNFILLED_CELL_STYLE},
    BASE_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Clear, StatefulWidget, Widget},
};

const OUTER_WIDTH: u16 = 17;
const OUTER_HEIGHT: u16 = 8;
const YEAR_DIGITS: usize = 4;
const ENTER_POS: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct JumpTo;

impl StatefulWidget for JumpTo {
    type State = JumpToState;

    /*
     * .................
     * .┌── Go to… ───┐.
     * .│             │.
     * .│   YYYY-MM   │.
     * .│             │.
     * .│   [ENTER]   │.
     * .└─────────────┘.
     * .................
     */

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [outer_area] = Layout::horizontal([OUTER_WIDTH])
            .flex(Flex::Center)
            .areas(area);
        let [outer_area] = Layout::vertical([OUTER_HEIGHT])
            .flex(Flex::Center)
            .areas(outer_area);
        Clear.render(outer_area, buf);
        Block::new().style(BASE_STYLE).render(outer_area, buf);
        let block_area = outer_area.inner(Margin::new(1, 1));
        Block::bordered()
            .title(" Go to… ")
            .title_alignment(Alignment::Center)
            .render(block_area, buf);
        let text_area = block_area.inner(Margin::new(1, 1));
        state.to_text().render(text_area, buf);
    }
}

/// Digits typed so far for a `YYYY-MM` month to display
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct JumpToState {
    digits: [Option<u8>; ENTER_POS],
    pos: usize,
}

impl JumpToState {
    pub(crate) fn new() -> JumpToState {
        JumpToState::default()
    }

    fn to_text(self) -> Text<'static> {
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            self.to_line(),
            Line::styled("", BASE_STYLE),
            // Only the label is underlined, not its centering padding
            Line::from(Span::styled(
                "[ENTER]",
                if self.pos == ENTER_POS {
                    READY_ENTER_STYLE
                } else {
                    BASE_STYLE
                },
            )),
        ])
        .centered()
    }

    fn to_line(self) -> Line<'static> {
        let mut spans = Vec::with_capacity(ENTER_POS + 1);
        for (i, dg) in self.digits.into_iter().enumerate() {
            if i == YEAR_DIGITS {
                spans.push(Span::styled("-", BASE_STYLE));
            }
            spans.push(match dg {
                Some(d) => Span::styled(d.to_string(), BASE_STYLE),
                None if i < YEAR_DIGITS => Span::styled("Y", UNFILLED_CELL_STYLE),
                None => Span::styled("M", UNFILLED_CELL_STYLE),
            });
        }
        Line::from_iter(spans)
    }

    fn entered(self) -> String {
        let mut s = String::with_capacity(ENTER_POS + 1);
        for (i, d) in self.digits.into_iter().flatten().enumerate() {
            if i == YEAR_DIGITS {
                s.push('-');
            }
            s.push(char::from(b'0' + d));
        }
        s
    }

    pub(crate) fn handle_input(&mut self, input: JumpToInput) -> JumpToOutput {
        match (input, self.pos) {
            (JumpToInput::Digit(d @ 0..=9), 0..ENTER_POS) => {
                self.digits[self.pos] = Some(d);
                self.pos += 1;
                JumpToOutput::Ok
            }
            (JumpToInput::Backspace, 1..) => {
                self.pos -= 1;
                self.digits[self.pos] = None;
                JumpToOutput::Ok
            }
            (JumpToInput::Enter, ENTER_POS) => match parse_year_month(&self.entered()) {
                Ok(month) => JumpToOutput::Jump(month),
                Err(e) => {
                    tracing::debug!(%e, "rejected month to jump to");
                    JumpToOutput::Invalid
                }
            },
            _ => JumpToOutput::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToInput {
    Digit(u8),
    Backspace,
    Enter,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToOutput {
    Ok,
    Invalid,
    Jump(YearMonth),
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn type_digits(state: &mut JumpToState, digits: &str) {
        for ch in digits.chars() {
            let d = ch.to_digit(10).and_then(|d| u8::try_from(d).ok()).unwrap();
            assert_eq!(state.handle_input(JumpToInput::Digit(d)), JumpToOutput::Ok);
        }
    }

    #[test]
    fn test_jump() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "202611");
        assert_eq!(state.entered(), "2026-11");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(YearMonth::new(2026, Month::November))
        );
    }

    #[test]
    fn test_enter_before_complete() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "2026");
        assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
    }

    #[test]
    fn test_extra_digit() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "202611");
        assert_eq!(
            state.handle_input(JumpToInput::Digit(1)),
            JumpToOutput::Invalid
        );
    }

    #[test]
    fn test_backspace() {
        let mut state = JumpToState::new();
        assert_eq!(
            state.handle_input(JumpToInput::Backspace),
            JumpToOutput::Invalid
        );
        type_digits(&mut state, "202613");
        assert_eq!(
            state.handle_input(JumpToInput::Backspace),
            JumpToOutput::Ok
        );
        type_digits(&mut state, "2");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(YearMonth::new(2026, Month::December))
        );
    }

    #[test]
    fn test_invalid_month() {
        for digits in ["202613", "202600"] {
            let mut state = JumpToState::new();
            type_digits(&mut state, digits);
            assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
        }
    }

    #[test]
    fn test_render() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "20");
        let area = Rect::new(0, 0, 17, 8);
        let mut buffer = Buffer::empty(area);
        JumpTo.render(area, &mut buffer, &mut state);
        let row = |y: u16| {
            (0..area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        };
        assert!(row(1).contains(" Go to… "));
        assert_eq!(row(3), " │   20YY-MM   │ ");
        assert_eq!(row(5), " │   [ENTER]   │ ");
    }
}
