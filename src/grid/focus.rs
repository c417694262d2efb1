use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusStep {
    Up,
    Down,
    Left,
    Right,
}

/// Keyboard cursor: a row of the current index and a window column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FocusedCell {
    pub row: usize,
    pub column: u32,
}

impl FocusedCell {
    /// Move one cell from `from`, or from the top-left cell when nothing has
    /// focus yet. Clamped to `rows` × `columns`; `None` on an empty grid.
    pub fn step(from: Option<Self>, step: FocusStep, rows: usize, columns: u32) -> Option<Self> {
        let current = from.unwrap_or_default().clamp(rows, columns)?;
        let next = match step {
            FocusStep::Up => Self {
                row: current.row.saturating_sub(1),
                ..current
            },
            FocusStep::Down => Self {
                row: (current.row + 1).min(rows - 1),
                ..current
            },
            FocusStep::Left => Self {
                column: current.column.saturating_sub(1),
                ..current
            },
            FocusStep::Right => Self {
                column: (current.column + 1).min(columns - 1),
                ..current
            },
        };
        Some(next)
    }

    pub fn clamp(self, rows: usize, columns: u32) -> Option<Self> {
        if rows == 0 || columns == 0 {
            return None;
        }
        Some(Self {
            row: self.row.min(rows - 1),
            column: self.column.min(columns - 1),
        })
    }
}
