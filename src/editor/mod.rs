//! Editor panel session: code buffer, language switching, run/submit
//! payloads, keyboard commands and persisted editor options.

pub mod language;
pub mod shortcuts;

use crate::api::PracticeApi;
use crate::bus::AppEvent;
use crate::fetch::FetchError;
use crate::prefs::{clamp_font_size, EditorTheme, Preferences};
use crate::topics::ProblemData;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use language::Language;
pub use shortcuts::{command_for, EditorCommand, Key, KeyChord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRequest {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub description: Option<String>,
    pub typed_solution: String,
    pub actual_solution: Option<String>,
    pub language: String,
}

/// What a key command asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    Run(RunRequest),
    Submit(SubmitPayload),
    FullscreenChanged(bool),
}

/// A language switch that has been started but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChange {
    pub from: Language,
    pub to: Language,
    pub code: String,
}

pub struct EditorSession {
    prefs: Preferences,
    language: Language,
    font_size: u8,
    editor_theme: EditorTheme,
    auto_suggest: bool,
    code: String,
    problem: Option<ProblemData>,
    is_fullscreen: bool,
    is_lang_changing: bool,
    error: Option<String>,
}

impl EditorSession {
    pub fn new(prefs: Preferences) -> Self {
        let stored = prefs.editor();
        Self {
            prefs,
            language: stored.language,
            font_size: stored.font_size,
            editor_theme: stored.editor_theme,
            auto_suggest: stored.auto_suggest,
            code: String::new(),
            problem: None,
            is_fullscreen: false,
            is_lang_changing: false,
            error: None,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn problem(&self) -> Option<&ProblemData> {
        self.problem.as_ref()
    }

    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    pub fn editor_theme(&self) -> EditorTheme {
        self.editor_theme
    }

    pub fn auto_suggest(&self) -> bool {
        self.auto_suggest
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn is_lang_changing(&self) -> bool {
        self.is_lang_changing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    /// Show a new problem and seed the buffer with its starter code.
    pub fn load_problem(&mut self, problem: ProblemData) {
        self.code = problem.initial_code.clone();
        self.problem = Some(problem);
        self.error = None;
    }

    pub fn handle_event(&mut self, event: &AppEvent) {
        if let AppEvent::UpdateProblemData(problem) = event {
            self.load_problem(problem.as_ref().clone());
        }
    }

    pub fn reset_code(&mut self) {
        self.code = self
            .problem
            .as_ref()
            .map(|p| p.initial_code.clone())
            .unwrap_or_default();
    }

    /// Start switching to `target`. `None` when it is already the current
    /// language or another switch is still pending.
    pub fn begin_language_change(&mut self, target: Language) -> Option<LanguageChange> {
        if target == self.language || self.is_lang_changing {
            return None;
        }
        self.is_lang_changing = true;
        self.error = None;

        let code = self
            .problem
            .as_ref()
            .map(|p| p.initial_code.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.code.clone());
        Some(LanguageChange {
            from: self.language,
            to: target,
            code,
        })
    }

    /// Apply the backend's answer. On failure the buffer and language stay
    /// exactly as they were.
    pub fn finish_language_change(
        &mut self,
        change: LanguageChange,
        result: Result<String, FetchError>,
    ) {
        self.is_lang_changing = false;
        match result {
            Ok(code) => {
                self.code = code;
                self.language = change.to;
                if let Err(e) = self.prefs.set_language(change.to) {
                    tracing::warn!(error = %e, "failed to persist editor language");
                }
                tracing::info!(from = %change.from, to = %change.to, "language changed");
            }
            Err(FetchError::Cancelled) => {}
            Err(e) => {
                tracing::error!(
                    from = %change.from,
                    to = %change.to,
                    error = %e,
                    "Error changing language"
                );
                self.error = Some(language_error_message(&e));
            }
        }
    }

    /// Round-trip a language switch through the backend. Returns whether the
    /// language actually changed.
    pub async fn change_language(
        &mut self,
        api: &PracticeApi,
        target: Language,
        cancel: &CancellationToken,
    ) -> bool {
        let Some(change) = self.begin_language_change(target) else {
            return false;
        };
        let result = api
            .change_language(&change.code, change.from.as_str(), change.to.as_str(), cancel)
            .await;
        let changed = result.is_ok();
        self.finish_language_change(change, result);
        changed
    }

    pub fn change_font_size(&mut self, delta: i64) -> u8 {
        let size = clamp_font_size(self.font_size as i64 + delta);
        self.font_size = size;
        if let Err(e) = self.prefs.set_font_size(size as i64) {
            tracing::warn!(error = %e, "failed to persist font size");
        }
        size
    }

    pub fn toggle_auto_suggest(&mut self) -> bool {
        self.auto_suggest = !self.auto_suggest;
        if let Err(e) = self.prefs.set_auto_suggest(self.auto_suggest) {
            tracing::warn!(error = %e, "failed to persist auto-suggest");
        }
        self.auto_suggest
    }

    pub fn toggle_editor_theme(&mut self) -> EditorTheme {
        self.editor_theme = self.editor_theme.toggled();
        if let Err(e) = self.prefs.set_editor_theme(self.editor_theme) {
            tracing::warn!(error = %e, "failed to persist editor theme");
        }
        self.editor_theme
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.is_fullscreen = !self.is_fullscreen;
        self.is_fullscreen
    }

    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            language: self.language.as_str().to_string(),
            code: self.code.clone(),
        }
    }

    pub fn submission(&self) -> SubmitPayload {
        SubmitPayload {
            description: self.problem.as_ref().map(|p| p.description.clone()),
            typed_solution: self.code.clone(),
            actual_solution: self.problem.as_ref().map(|p| p.solution.clone()),
            language: self.language.as_str().to_string(),
        }
    }

    pub fn handle_key(&mut self, chord: KeyChord) -> Option<EditorAction> {
        let action = match command_for(chord)? {
            EditorCommand::Run => EditorAction::Run(self.run_request()),
            EditorCommand::Submit => EditorAction::Submit(self.submission()),
            EditorCommand::ToggleFullscreen => {
                EditorAction::FullscreenChanged(self.toggle_fullscreen())
            }
        };
        Some(action)
    }
}

fn language_error_message(err: &FetchError) -> String {
    if let Some(detail) = err.detail() {
        return detail.to_string();
    }
    match err {
        FetchError::Client { .. } | FetchError::Server { .. } => {
            "Failed to change language".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BroadcastBus;
    use crate::prefs::{MemoryStore, PreferenceStore, EDITOR_FONT_KEY, EDITOR_LANG_KEY};
    use std::sync::Arc;

    fn session() -> (EditorSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let prefs = Preferences::new(store.clone(), Arc::new(BroadcastBus::new()));
        (EditorSession::new(prefs), store)
    }

    fn problem(initial_code: &str) -> ProblemData {
        ProblemData {
            title: "Two Sum".into(),
            description: "find two numbers".into(),
            solution: "use a hashmap".into(),
            testcases: Vec::new(),
            difficulty: "Easy".into(),
            time_complexity: "O(n)".into(),
            space_complexity: "O(n)".into(),
            initial_code: initial_code.into(),
        }
    }

    #[test]
    fn test_failed_language_change_keeps_buffer() {
        let (mut s, store) = session();
        s.set_code("my work in progress");

        let change = s.begin_language_change(Language::Python).unwrap();
        assert!(s.is_lang_changing());
        assert!(s.begin_language_change(Language::Java).is_none());

        s.finish_language_change(
            change,
            Err(FetchError::Client {
                status: 400,
                detail: Some("unsupported".into()),
            }),
        );
        assert_eq!(s.code(), "my work in progress");
        assert_eq!(s.language(), Language::Cpp);
        assert_eq!(s.error(), Some("unsupported"));
        assert!(!s.is_lang_changing());
        assert_eq!(store.get(EDITOR_LANG_KEY), None);
    }

    #[test]
    fn test_successful_language_change_persists() {
        let (mut s, store) = session();
        s.load_problem(problem("int main() {}"));

        let change = s.begin_language_change(Language::Python).unwrap();
        assert_eq!(change.code, "int main() {}");
        s.finish_language_change(change, Ok("def main(): pass".into()));

        assert_eq!(s.code(), "def main(): pass");
        assert_eq!(s.language(), Language::Python);
        assert_eq!(s.error(), None);
        assert_eq!(store.get(EDITOR_LANG_KEY).as_deref(), Some("python"));
    }

    #[test]
    fn test_same_language_is_noop() {
        let (mut s, _) = session();
        assert!(s.begin_language_change(Language::Cpp).is_none());
    }

    #[test]
    fn test_generic_error_message() {
        let (mut s, _) = session();
        let change = s.begin_language_change(Language::Java).unwrap();
        s.finish_language_change(change, Err(FetchError::Server { status: 500, detail: None }));
        assert_eq!(s.error(), Some("Failed to change language"));

        let change = s.begin_language_change(Language::Java).unwrap();
        s.finish_language_change(change, Err(FetchError::Cancelled));
        assert_eq!(s.error(), None);
    }

    #[test]
    fn test_font_size_changes_clamp() {
        let (mut s, store) = session();
        assert_eq!(s.change_font_size(21), 30);
        assert_eq!(store.get(EDITOR_FONT_KEY).as_deref(), Some("30"));
        assert_eq!(s.change_font_size(1), 30);
        assert_eq!(s.change_font_size(-25), 10);
    }

    #[test]
    fn test_reset_and_problem_event() {
        let (mut s, _) = session();
        s.handle_event(&AppEvent::UpdateProblemData(Box::new(problem("start"))));
        assert_eq!(s.code(), "start");
        s.set_code("edited");
        s.reset_code();
        assert_eq!(s.code(), "start");
    }

    #[test]
    fn test_key_actions() {
        let (mut s, _) = session();
        s.load_problem(problem(""));
        s.set_code("x = 1");

        let Some(EditorAction::Submit(payload)) = s.handle_key(KeyChord::ctrl(Key::Char('s')))
        else {
            panic!("expected submit");
        };
        assert_eq!(payload.typed_solution, "x = 1");
        assert_eq!(payload.actual_solution.as_deref(), Some("use a hashmap"));
        assert_eq!(payload.language, "cpp");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["typedSolution"], "x = 1");

        assert_eq!(
            s.handle_key(KeyChord::ctrl(Key::Enter)),
            Some(EditorAction::Run(RunRequest { language: "cpp".into(), code: "x = 1".into() }))
        );
        assert_eq!(
            s.handle_key(KeyChord::plain(Key::F11)),
            Some(EditorAction::FullscreenChanged(true))
        );
        assert_eq!(
            s.handle_key(KeyChord::alt(Key::Enter)),
            Some(EditorAction::FullscreenChanged(false))
        );
        assert_eq!(s.handle_key(KeyChord::plain(Key::Char('a'))), None);
    }

    #[test]
    fn test_toggles_persist() {
        let (mut s, store) = session();
        assert!(!s.toggle_auto_suggest());
        assert_eq!(store.get("editor-auto-suggest").as_deref(), Some("false"));
        assert_eq!(s.toggle_editor_theme(), EditorTheme::Light);
        assert_eq!(store.get("editor-theme").as_deref(), Some("light"));
    }
}
