//! Typed user preferences on top of a string [`PreferenceStore`].
//!
//! Reads never fail: absent or invalid stored values fall back to defaults.
//! Every write of the app theme also publishes `themeChanged`, so nobody has
//! to poll the store for external changes.

pub mod store;

use crate::bus::{AppEvent, EventBus};
use crate::editor::Language;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

pub use store::{FileStore, MemoryStore, PreferenceStore};

pub const EDITOR_LANG_KEY: &str = "editor-lang";
pub const EDITOR_FONT_KEY: &str = "editor-font";
pub const EDITOR_THEME_KEY: &str = "editor-theme";
pub const EDITOR_AUTO_SUGGEST_KEY: &str = "editor-auto-suggest";
pub const THEME_KEY: &str = "theme";

pub const MIN_FONT_SIZE: u8 = 10;
pub const MAX_FONT_SIZE: u8 = 30;
pub const DEFAULT_FONT_SIZE: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTheme {
    #[default]
    VsDark,
    Light,
}

impl EditorTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            EditorTheme::VsDark => "vs-dark",
            EditorTheme::Light => "light",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "vs-dark" => Some(EditorTheme::VsDark),
            "light" => Some(EditorTheme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            EditorTheme::VsDark => EditorTheme::Light,
            EditorTheme::Light => EditorTheme::VsDark,
        }
    }
}

/// Site-wide colour scheme, distinct from the editor's own theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppTheme {
    #[default]
    Light,
    Dark,
}

impl AppTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            AppTheme::Light => "light",
            AppTheme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(AppTheme::Light),
            "dark" => Some(AppTheme::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for AppTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of everything the editor panel reads at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPreferences {
    pub language: Language,
    pub font_size: u8,
    pub editor_theme: EditorTheme,
    pub auto_suggest: bool,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            language: Language::default(),
            font_size: DEFAULT_FONT_SIZE,
            editor_theme: EditorTheme::default(),
            auto_suggest: true,
        }
    }
}

pub fn clamp_font_size(requested: i64) -> u8 {
    requested.clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u8
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
    bus: Arc<dyn EventBus>,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { store, bus }
    }

    pub fn editor(&self) -> EditorPreferences {
        EditorPreferences {
            language: self.language(),
            font_size: self.font_size(),
            editor_theme: self.editor_theme(),
            auto_suggest: self.auto_suggest(),
        }
    }

    pub fn language(&self) -> Language {
        self.store
            .get(EDITOR_LANG_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.store.set(EDITOR_LANG_KEY, language.as_str())
    }

    /// Stored size if it parses and lies in range; out-of-range values are
    /// ignored rather than clamped.
    pub fn font_size(&self) -> u8 {
        self.store
            .get(EDITOR_FONT_KEY)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|size| (MIN_FONT_SIZE as i64..=MAX_FONT_SIZE as i64).contains(size))
            .map(|size| size as u8)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Clamp `requested` into range, persist it, and return what was stored.
    pub fn set_font_size(&self, requested: i64) -> Result<u8> {
        let size = clamp_font_size(requested);
        if size as i64 != requested {
            tracing::debug!(requested, size, "font size clamped");
        }
        self.store.set(EDITOR_FONT_KEY, &size.to_string())?;
        Ok(size)
    }

    pub fn editor_theme(&self) -> EditorTheme {
        self.store
            .get(EDITOR_THEME_KEY)
            .and_then(|raw| EditorTheme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_editor_theme(&self, theme: EditorTheme) -> Result<()> {
        self.store.set(EDITOR_THEME_KEY, theme.as_str())
    }

    pub fn auto_suggest(&self) -> bool {
        match self.store.get(EDITOR_AUTO_SUGGEST_KEY).as_deref() {
            Some("false") => false,
            _ => true,
        }
    }

    pub fn set_auto_suggest(&self, enabled: bool) -> Result<()> {
        self.store
            .set(EDITOR_AUTO_SUGGEST_KEY, if enabled { "true" } else { "false" })
    }

    pub fn app_theme(&self) -> AppTheme {
        self.store
            .get(THEME_KEY)
            .and_then(|raw| AppTheme::parse(&raw))
            .unwrap_or_default()
    }

    /// Persist the app theme and announce it.
    pub fn set_app_theme(&self, theme: AppTheme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.bus.publish(AppEvent::ThemeChanged { theme });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BroadcastBus, THEME_CHANGED};

    fn prefs_with(entries: &[(&str, &str)]) -> (Preferences, Arc<MemoryStore>, Arc<BroadcastBus>) {
        let store = Arc::new(MemoryStore::with(entries));
        let bus = Arc::new(BroadcastBus::new());
        (Preferences::new(store.clone(), bus.clone()), store, bus)
    }

    #[test]
    fn test_defaults_when_empty() {
        let (prefs, _, _) = prefs_with(&[]);
        assert_eq!(prefs.editor(), EditorPreferences::default());
        assert_eq!(prefs.language(), Language::Cpp);
        assert_eq!(prefs.font_size(), 14);
        assert_eq!(prefs.editor_theme(), EditorTheme::VsDark);
        assert!(prefs.auto_suggest());
        assert_eq!(prefs.app_theme(), AppTheme::Light);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let (prefs, _, _) = prefs_with(&[
            (EDITOR_LANG_KEY, "cobol"),
            (EDITOR_FONT_KEY, "99"),
            (EDITOR_THEME_KEY, "solarized"),
            (EDITOR_AUTO_SUGGEST_KEY, "maybe"),
            (THEME_KEY, "sepia"),
        ]);
        assert_eq!(prefs.editor(), EditorPreferences::default());
        assert_eq!(prefs.app_theme(), AppTheme::Light);

        let (prefs, _, _) = prefs_with(&[(EDITOR_FONT_KEY, "large")]);
        assert_eq!(prefs.font_size(), DEFAULT_FONT_SIZE);
        let (prefs, _, _) = prefs_with(&[(EDITOR_FONT_KEY, "9")]);
        assert_eq!(prefs.font_size(), DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_stored_values_read_back() {
        let (prefs, _, _) = prefs_with(&[
            (EDITOR_LANG_KEY, "python"),
            (EDITOR_FONT_KEY, "22"),
            (EDITOR_THEME_KEY, "light"),
            (EDITOR_AUTO_SUGGEST_KEY, "false"),
            (THEME_KEY, "dark"),
        ]);
        let editor = prefs.editor();
        assert_eq!(editor.language, Language::Python);
        assert_eq!(editor.font_size, 22);
        assert_eq!(editor.editor_theme, EditorTheme::Light);
        assert!(!editor.auto_suggest);
        assert_eq!(prefs.app_theme(), AppTheme::Dark);
    }

    #[test]
    fn test_font_size_clamped_and_persisted() {
        let (prefs, store, _) = prefs_with(&[]);
        assert_eq!(prefs.set_font_size(35).unwrap(), 30);
        assert_eq!(store.get(EDITOR_FONT_KEY).as_deref(), Some("30"));
        assert_eq!(prefs.set_font_size(3).unwrap(), 10);
        assert_eq!(store.get(EDITOR_FONT_KEY).as_deref(), Some("10"));
        assert_eq!(prefs.set_font_size(17).unwrap(), 17);
        assert_eq!(prefs.font_size(), 17);
    }

    #[test]
    fn test_app_theme_write_publishes() {
        let (prefs, store, bus) = prefs_with(&[]);
        let mut sub = bus.subscribe(&[THEME_CHANGED]);
        prefs.set_app_theme(AppTheme::Dark).unwrap();
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(
            sub.try_recv(),
            Some(AppEvent::ThemeChanged { theme: AppTheme::Dark })
        );
    }

    #[test]
    fn test_failed_theme_write_is_not_announced() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(&dir.path().join("gone").join("p.json")).unwrap());
        let bus = Arc::new(BroadcastBus::new());
        let prefs = Preferences::new(store, bus.clone());
        let mut sub = bus.subscribe(&[THEME_CHANGED]);

        assert!(prefs.set_app_theme(AppTheme::Dark).is_err());
        assert_eq!(prefs.app_theme(), AppTheme::Light);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_editor_theme_toggle() {
        assert_eq!(EditorTheme::VsDark.toggled(), EditorTheme::Light);
        assert_eq!(EditorTheme::Light.toggled(), EditorTheme::VsDark);
    }
}
