//! Recommendation domain types.

use crate::{BookreelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What the user wants recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Book,
    Movie,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Book, Category::Movie];

    /// Singular noun: `book` or `movie`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Movie => "movie",
        }
    }

    /// Plural noun used in prompts and tool output: `books` or `movies`.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Book => "books",
            Self::Movie => "movies",
        }
    }

    /// Name of the tool that serves this category.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Book => "recommend_books",
            Self::Movie => "recommend_movies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "book" | "books" => Ok(Self::Book),
            "movie" | "movies" | "film" | "films" => Ok(Self::Movie),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Free-form genre as the user said it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genre(String);

impl Genre {
    pub fn new(genre: impl Into<String>) -> Self {
        Self(genre.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Genre {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Genre {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub category: Category,
    pub genre: Genre,
}

impl RecommendationRequest {
    pub fn new(category: Category, genre: impl Into<Genre>) -> Self {
        Self { category, genre: genre.into() }
    }
}

/// Titles in the order the model listed them.
///
/// Nothing here guarantees three titles, non-empty titles, or uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationResult {
    pub category: Category,
    pub titles: Vec<String>,
}

impl RecommendationResult {
    pub fn new(category: Category, titles: Vec<String>) -> Self {
        Self { category, titles }
    }

    /// `{"books": [...]}` or `{"movies": [...]}`.
    pub fn to_tool_output(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(self.category.noun().to_string(), Value::from(self.titles.clone()));
        Value::Object(map)
    }

    pub fn from_tool_output(category: Category, output: &Value) -> Result<Self> {
        let titles = output.get(category.noun()).cloned().ok_or_else(|| {
            BookreelError::Tool(format!("tool output is missing '{}': {output}", category.noun()))
        })?;
        let titles: Vec<String> = serde_json::from_value(titles)?;
        Ok(Self { category, titles })
    }

    pub fn has_empty_title(&self) -> bool {
        self.titles.iter().any(|t| t.is_empty())
    }
}

/// The closed set of operations the conversation can dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    RequestBookRecommendation { genre: Genre },
    RequestMovieRecommendation { genre: Genre },
}

impl Command {
    pub fn new(category: Category, genre: impl Into<Genre>) -> Self {
        let genre = genre.into();
        match category {
            Category::Book => Self::RequestBookRecommendation { genre },
            Category::Movie => Self::RequestMovieRecommendation { genre },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::RequestBookRecommendation { .. } => Category::Book,
            Self::RequestMovieRecommendation { .. } => Category::Movie,
        }
    }

    pub fn genre(&self) -> &Genre {
        match self {
            Self::RequestBookRecommendation { genre } | Self::RequestMovieRecommendation { genre } => {
                genre
            }
        }
    }

    pub fn tool_name(&self) -> &'static str {
        self.category().tool_name()
    }

    /// Arguments for the tool call.
    pub fn tool_args(&self) -> Value {
        serde_json::json!({ "genre": self.genre().as_str() })
    }

    pub fn validate(&self) -> Result<()> {
        if self.genre().is_blank() {
            return Err(BookreelError::Agent(format!(
                "{} requires a non-empty genre",
                self.tool_name()
            )));
        }
        Ok(())
    }
}
