/// Keys the editor binds. Everything else passes through to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    F11,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS; treated the same as Ctrl.
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false, alt: false, meta: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { ctrl: true, ..Self::plain(key) }
    }

    pub fn alt(key: Key) -> Self {
        Self { alt: true, ..Self::plain(key) }
    }

    fn ctrl_or_cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Run,
    Submit,
    ToggleFullscreen,
}

/// Ctrl/Cmd+Enter runs, Ctrl/Cmd+S submits, F11 or Alt+Enter toggles fullscreen.
pub fn command_for(chord: KeyChord) -> Option<EditorCommand> {
    match chord.key {
        Key::Enter if chord.ctrl_or_cmd() => Some(EditorCommand::Run),
        Key::Enter if chord.alt => Some(EditorCommand::ToggleFullscreen),
        Key::Char(c) if chord.ctrl_or_cmd() && c.eq_ignore_ascii_case(&'s') => {
            Some(EditorCommand::Submit)
        }
        Key::F11 => Some(EditorCommand::ToggleFullscreen),
        _ => None,
    }
}
