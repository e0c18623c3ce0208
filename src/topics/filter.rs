use super::types::Topic;

/// Sentinel for "no category/difficulty restriction".
pub const ALL: &str = "all";

pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "string",
    "hashmap",
    "matrix",
    "interval",
    "binary-search",
    "sort",
    "stack",
    "queue",
    "tree",
    "graph",
    "backtracking",
    "dynamic-programming",
];

pub const DEFAULT_DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];

/// Client-side filter shared by both sidebar views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    pub search: String,
    pub category: String,
    pub difficulty: String,
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL.to_string(),
            difficulty: ALL.to_string(),
        }
    }
}

impl TopicFilter {
    /// All three clauses must hold.
    pub fn matches(&self, topic: &Topic) -> bool {
        self.matches_search(topic) && self.matches_category(topic) && self.matches_difficulty(topic)
    }

    fn matches_search(&self, topic: &Topic) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        topic.name.to_lowercase().contains(&needle)
            || topic
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }

    fn matches_category(&self, topic: &Topic) -> bool {
        self.category == ALL || eq_ignore_case(topic.category.as_deref(), &self.category)
    }

    fn matches_difficulty(&self, topic: &Topic) -> bool {
        self.difficulty == ALL || eq_ignore_case(topic.difficulty.as_deref(), &self.difficulty)
    }

    /// Matching topics in source order. The source is left untouched.
    pub fn apply(&self, topics: &[Topic]) -> Vec<Topic> {
        topics.iter().filter(|t| self.matches(t)).cloned().collect()
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.category != ALL || self.difficulty != ALL
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn eq_ignore_case(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase() == wanted.to_lowercase())
}

/// Default categories followed by any new ones seen in `topics`, first-seen order.
pub fn available_categories(topics: &[Topic]) -> Vec<String> {
    collect_options(
        &DEFAULT_CATEGORIES,
        topics.iter().filter_map(|t| t.category.as_deref()),
    )
}

pub fn available_difficulties(topics: &[Topic]) -> Vec<String> {
    collect_options(
        &DEFAULT_DIFFICULTIES,
        topics.iter().filter_map(|t| t.difficulty.as_deref()),
    )
}

fn collect_options<'a>(defaults: &[&str], seen: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    for value in seen {
        if !value.is_empty() && !out.iter().any(|o| o == value) {
            out.push(value.to_string());
        }
    }
    out
}
