use crate::fetch::FetchError;
use serde::{Deserialize, Deserializer, Serialize};

/// A practice topic as served by the topic endpoints. Never mutated after
/// decoding; filtering works on clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Only present on "recent" records. RFC 3339, epoch millis, or a free label.
    #[serde(default, deserialize_with = "string_or_number")]
    pub last_used: Option<String>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            difficulty: None,
            last_used: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// "merge_intervals" -> "Merge Intervals"
    pub fn display_name(&self) -> String {
        self.name
            .replace('_', " ")
            .split(' ')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn difficulty_level(&self) -> Difficulty {
        Difficulty::parse(self.difficulty.as_deref().unwrap_or(""))
    }

    pub fn last_used_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = self.last_used.as_deref()?.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&chrono::Utc));
        }
        raw.parse::<i64>()
            .ok()
            .and_then(chrono::DateTime::from_timestamp_millis)
    }

    /// Relative age for timestamps ("3h ago"), the raw label otherwise.
    pub fn last_used_label(&self, now: chrono::DateTime<chrono::Utc>) -> Option<String> {
        let Some(at) = self.last_used_at() else {
            return self.last_used.clone();
        };
        let secs = (now - at).num_seconds().max(0);
        let label = if secs < 60 {
            "just now".to_string()
        } else if secs < 3600 {
            format!("{}m ago", secs / 60)
        } else if secs < 86_400 {
            format!("{}h ago", secs / 3600)
        } else {
            format!("{}d ago", secs / 86_400)
        };
        Some(label)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Difficulty levels the UI distinguishes. Anything else is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(raw.to_string()),
        }
    }
}

/// Validate a `{ success, data }` topic envelope.
///
/// Anything other than `success: true` with a list of well-formed topics is a
/// `ParseError`. The body already decoded as JSON, so this is a semantic
/// failure and callers do not retry it.
pub fn parse_topic_envelope(value: serde_json::Value) -> Result<Vec<Topic>, FetchError> {
    let success = value.get("success").and_then(|s| s.as_bool()).unwrap_or(false);
    if !success {
        return Err(FetchError::Parse(
            "Invalid response format from server".to_string(),
        ));
    }
    let Some(data) = value.get("data").filter(|d| d.is_array()) else {
        return Err(FetchError::Parse(
            "Invalid response format from server: data is not a list".to_string(),
        ));
    };

    let topics: Vec<Topic> = serde_json::from_value(data.clone())
        .map_err(|e| FetchError::Parse(format!("invalid topic record: {}", e)))?;
    if let Some(pos) = topics.iter().position(|t| t.name.trim().is_empty()) {
        return Err(FetchError::Parse(format!("topic {} has an empty name", pos)));
    }
    Ok(topics)
}

/// Raw `/get_dsa_question` payload. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPayload {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub solution: Option<String>,
    pub testcases: Option<Vec<serde_json::Value>>,
    pub difficulty: Option<String>,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
    pub initial_code: Option<String>,
}

/// Problem shown on the problem surface and seeded into the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemData {
    pub title: String,
    pub description: String,
    pub solution: String,
    pub testcases: Vec<serde_json::Value>,
    pub difficulty: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub initial_code: String,
}

impl ProblemData {
    pub fn from_payload(payload: QuestionPayload, topic_name: &str) -> Self {
        fn or(value: Option<String>, default: &str) -> String {
            value.filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        }

        Self {
            title: or(payload.title, topic_name),
            description: or(payload.markdown, ""),
            solution: or(payload.solution, ""),
            testcases: payload.testcases.unwrap_or_default(),
            difficulty: or(payload.difficulty, "Medium"),
            time_complexity: or(payload.time_complexity, "O(n)"),
            space_complexity: or(payload.space_complexity, "O(1)"),
            initial_code: or(payload.initial_code, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FailureKind;
    use serde_json::json;

    #[test]
    fn test_display_name() {
        assert_eq!(Topic::new("merge_intervals").display_name(), "Merge Intervals");
        assert_eq!(Topic::new("two_sum").display_name(), "Two Sum");
        assert_eq!(Topic::new("graph").display_name(), "Graph");
        assert_eq!(Topic::new("dynamic programming_ii").display_name(), "Dynamic Programming Ii");
    }

    #[test]
    fn test_difficulty_levels() {
        assert_eq!(Topic::new("a").with_difficulty("EASY").difficulty_level(), Difficulty::Easy);
        assert_eq!(
            Topic::new("a").with_difficulty("medium").difficulty_level(),
            Difficulty::Medium
        );
        assert_eq!(Topic::new("a").with_difficulty("Hard").difficulty_level(), Difficulty::Hard);
        assert_eq!(
            Topic::new("a").with_difficulty("Insane").difficulty_level(),
            Difficulty::Other("Insane".into())
        );
        assert_eq!(Topic::new("a").difficulty_level(), Difficulty::Other(String::new()));
    }

    #[test]
    fn test_envelope_ok() {
        let topics = parse_topic_envelope(json!({
            "success": true,
            "data": [
                {"name": "two_sum", "category": "hashmap", "difficulty": "Easy"},
                {"name": "graph", "last_used": 1738364400000u64}
            ]
        }))
        .unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].category.as_deref(), Some("hashmap"));
        assert_eq!(topics[1].last_used.as_deref(), Some("1738364400000"));
        assert!(topics[1].last_used_at().is_some());
    }

    #[test]
    fn test_envelope_rejects_bad_shapes() {
        for body in [
            json!({"success": false}),
            json!({"success": false, "data": []}),
            json!({"data": []}),
            json!({"success": true, "data": {"name": "x"}}),
            json!({"success": true}),
            json!({"success": true, "data": [{"category": "x"}]}),
            json!({"success": true, "data": [{"name": "  "}]}),
            json!([]),
        ] {
            let err = parse_topic_envelope(body.clone()).unwrap_err();
            assert_eq!(err.kind(), FailureKind::ParseError, "body {}", body);
        }
    }

    #[test]
    fn test_last_used_label() {
        let now = chrono::DateTime::parse_from_rfc3339("2025-02-01T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let mut t = Topic::new("x");
        t.last_used = Some("2025-02-01T09:00:00Z".into());
        assert_eq!(t.last_used_label(now).as_deref(), Some("3h ago"));
        t.last_used = Some("yesterday".into());
        assert_eq!(t.last_used_label(now).as_deref(), Some("yesterday"));
        t.last_used = None;
        assert_eq!(t.last_used_label(now), None);
    }

    #[test]
    fn test_problem_defaults() {
        let p = ProblemData::from_payload(QuestionPayload::default(), "two_sum");
        assert_eq!(p.title, "two_sum");
        assert_eq!(p.description, "");
        assert_eq!(p.difficulty, "Medium");
        assert_eq!(p.time_complexity, "O(n)");
        assert_eq!(p.space_complexity, "O(1)");
        assert!(p.testcases.is_empty());

        let payload: QuestionPayload = serde_json::from_value(json!({
            "title": "Two Sum",
            "markdown": "# Two Sum",
            "difficulty": "Easy",
            "initial_code": "int main() {}",
            "testcases": [{"input": "1 2", "output": "3"}]
        }))
        .unwrap();
        let p = ProblemData::from_payload(payload, "two_sum");
        assert_eq!(p.title, "Two Sum");
        assert_eq!(p.description, "# Two Sum");
        assert_eq!(p.difficulty, "Easy");
        assert_eq!(p.initial_code, "int main() {}");
        assert_eq!(p.testcases.len(), 1);
    }
}
