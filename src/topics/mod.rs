pub mod filter;
pub mod types;

pub use filter::{available_categories, available_difficulties, TopicFilter, ALL};
pub use types::{parse_topic_envelope, Difficulty, ProblemData, QuestionPayload, Topic};
