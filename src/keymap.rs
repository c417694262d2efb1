use serde::{Deserialize, Serialize};

use crate::grid::FocusStep;

/// A key press with its modifiers, as delivered by the host surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    /// Cmd on macOS.
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryCommand {
    Undo,
    Redo,
}

/// Map a chord to undo/redo. Primary+Z undoes; Primary+Shift+Z and Primary+Y redo.
/// Nothing fires while a text field has focus, so native text undo keeps working.
pub fn history_command(chord: &KeyChord, text_entry_focused: bool) -> Option<HistoryCommand> {
    if text_entry_focused || !chord.primary() || chord.alt {
        return None;
    }
    match chord.key.to_ascii_lowercase().as_str() {
        "z" if chord.shift => Some(HistoryCommand::Redo),
        "z" => Some(HistoryCommand::Undo),
        "y" if !chord.shift => Some(HistoryCommand::Redo),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusCommand {
    Step(FocusStep),
    Clear,
}

/// Arrow keys move the grid focus, Escape drops it. Modified arrows belong to
/// the host (word jumps, desktop switching).
pub fn focus_command(chord: &KeyChord, text_entry_focused: bool) -> Option<FocusCommand> {
    if text_entry_focused || chord.primary() || chord.alt {
        return None;
    }
    match chord.key.as_str() {
        "ArrowUp" => Some(FocusCommand::Step(FocusStep::Up)),
        "ArrowDown" => Some(FocusCommand::Step(FocusStep::Down)),
        "ArrowLeft" => Some(FocusCommand::Step(FocusStep::Left)),
        "ArrowRight" => Some(FocusCommand::Step(FocusStep::Right)),
        "Escape" => Some(FocusCommand::Clear),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_and_cmd_bindings() {
        assert_eq!(history_command(&KeyChord::new("z").ctrl(), false), Some(HistoryCommand::Undo));
        assert_eq!(history_command(&KeyChord::new("z").meta(), false), Some(HistoryCommand::Undo));
        assert_eq!(
            history_command(&KeyChord::new("Z").ctrl().shift(), false),
            Some(HistoryCommand::Redo)
        );
        assert_eq!(history_command(&KeyChord::new("y").meta(), false), Some(HistoryCommand::Redo));
    }

    #[test]
    fn suppressed_in_text_entry() {
        assert_eq!(history_command(&KeyChord::new("z").ctrl(), true), None);
        assert_eq!(history_command(&KeyChord::new("y").ctrl(), true), None);
    }

    #[test]
    fn needs_primary_modifier() {
        assert_eq!(history_command(&KeyChord::new("z"), false), None);
        assert_eq!(history_command(&KeyChord::new("z").shift(), false), None);
        assert_eq!(history_command(&KeyChord::new("z").ctrl().alt(), false), None);
        assert_eq!(history_command(&KeyChord::new("x").ctrl(), false), None);
    }

    #[test]
    fn arrows_and_escape_drive_focus() {
        assert_eq!(
            focus_command(&KeyChord::new("ArrowDown"), false),
            Some(FocusCommand::Step(FocusStep::Down))
        );
        assert_eq!(
            focus_command(&KeyChord::new("ArrowLeft").shift(), false),
            Some(FocusCommand::Step(FocusStep::Left))
        );
        assert_eq!(focus_command(&KeyChord::new("Escape"), false), Some(FocusCommand::Clear));
        assert_eq!(focus_command(&KeyChord::new("ArrowUp").ctrl(), false), None);
        assert_eq!(focus_command(&KeyChord::new("ArrowUp").alt(), false), None);
        assert_eq!(focus_command(&KeyChord::new("ArrowUp"), true), None);
        assert_eq!(focus_command(&KeyChord::new("z"), false), None);
    }
}
