use std::fmt;
use std::str::FromStr;

/// Languages the editor can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    JavaScript,
    Python,
    Java,
    #[default]
    Cpp,
}

impl Language {
    /// Menu order.
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::JavaScript => "Javascript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.as_str() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("unknown language: {}", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
