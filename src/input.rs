//! Terminal input mapped to viewer operations

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// Keyboard pan direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Pan delta for moving `amount` pixels in this direction
    #[must_use]
    pub fn delta(self, amount: i64) -> (i64, i64) {
        match self {
            Direction::Up => (0, -amount),
            Direction::Down => (0, amount),
            Direction::Left => (-amount, 0),
            Direction::Right => (amount, 0),
        }
    }
}

/// Discrete viewer input, positions in terminal cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerInput {
    /// Left button pressed at a cell
    Press { column: u16, row: u16 },
    /// Pointer dragged by a cell delta since the last drag event
    Drag {
        column: u16,
        row: u16,
        dx: i32,
        dy: i32,
    },
    /// Wheel notches at a cell; positive zooms out
    Wheel { column: u16, row: u16, steps: i32 },
    Key(Direction),
    Center,
    FocusNext,
    ToggleLink,
    Resize { columns: u16, rows: u16 },
    Quit,
}

/// Turns raw terminal events into [`ViewerInput`], tracking the drag anchor
#[derive(Debug, Default)]
pub struct InputMapper {
    drag_from: Option<(u16, u16)>,
}

impl InputMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, event: &Event) -> Option<ViewerInput> {
        match event {
            Event::Key(key) => map_key(key),
            Event::Mouse(mouse) => {
                let (column, row) = (mouse.column, mouse.row);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.drag_from = Some((column, row));
                        Some(ViewerInput::Press { column, row })
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        let (from_col, from_row) = self.drag_from.unwrap_or((column, row));
                        self.drag_from = Some((column, row));
                        let dx = i32::from(column) - i32::from(from_col);
                        let dy = i32::from(row) - i32::from(from_row);
                        if dx == 0 && dy == 0 {
                            return None;
                        }
                        Some(ViewerInput::Drag {
                            column,
                            row,
                            dx,
                            dy,
                        })
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        self.drag_from = None;
                        None
                    }
                    MouseEventKind::ScrollDown => Some(ViewerInput::Wheel {
                        column,
                        row,
                        steps: 1,
                    }),
                    MouseEventKind::ScrollUp => Some(ViewerInput::Wheel {
                        column,
                        row,
                        steps: -1,
                    }),
                    _ => None,
                }
            }
            Event::Resize(columns, rows) => Some(ViewerInput::Resize {
                columns: *columns,
                rows: *rows,
            }),
            _ => None,
        }
    }
}

fn map_key(key: &KeyEvent) -> Option<ViewerInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ViewerInput::Quit);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') => Some(ViewerInput::Key(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') => Some(ViewerInput::Key(Direction::Down)),
        KeyCode::Left | KeyCode::Char('a') => Some(ViewerInput::Key(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d') => Some(ViewerInput::Key(Direction::Right)),
        KeyCode::Char(' ') => Some(ViewerInput::Center),
        KeyCode::Tab => Some(ViewerInput::FocusNext),
        KeyCode::Char('l') => Some(ViewerInput::ToggleLink),
        KeyCode::Char('q') | KeyCode::Esc => Some(ViewerInput::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventState, MouseEvent};

    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    #[test]
    fn arrows_and_wasd_pan() {
        let mut mapper = InputMapper::new();

        assert_eq!(mapper.map(&key(KeyCode::Up)), Some(ViewerInput::Key(Direction::Up)));
        assert_eq!(
            mapper.map(&key(KeyCode::Char('a'))),
            Some(ViewerInput::Key(Direction::Left))
        );
        assert_eq!(mapper.map(&key(KeyCode::Char(' '))), Some(ViewerInput::Center));
        assert_eq!(mapper.map(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn direction_deltas() {
        assert_eq!(Direction::Up.delta(100), (0, -100));
        assert_eq!(Direction::Right.delta(100), (100, 0));
    }

    #[test]
    fn drag_reports_incremental_deltas() {
        let mut mapper = InputMapper::new();

        mapper.map(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 10));
        assert_eq!(
            mapper.map(&mouse(MouseEventKind::Drag(MouseButton::Left), 13, 9)),
            Some(ViewerInput::Drag {
                column: 13,
                row: 9,
                dx: 3,
                dy: -1
            })
        );
        assert_eq!(
            mapper.map(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 9)),
            Some(ViewerInput::Drag {
                column: 12,
                row: 9,
                dx: -1,
                dy: 0
            })
        );
        assert_eq!(
            mapper.map(&mouse(MouseEventKind::Drag(MouseButton::Left), 12, 9)),
            None
        );
    }

    #[test]
    fn wheel_down_zooms_out() {
        let mut mapper = InputMapper::new();

        assert_eq!(
            mapper.map(&mouse(MouseEventKind::ScrollDown, 4, 5)),
            Some(ViewerInput::Wheel {
                column: 4,
                row: 5,
                steps: 1
            })
        );
    }
}
