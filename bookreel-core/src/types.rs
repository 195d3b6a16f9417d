use serde::{Deserialize, Serialize};

/// One message in a model conversation. `role` is `system`, `user` or `model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
}

impl Content {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system").with_text(text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user").with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::text).collect()
    }
}

impl Part {
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_text_joins_text_parts() {
        let content = Content::new("model").with_text("Dune, ").with_text("Foundation");
        assert_eq!(content.text(), "Dune, Foundation");
    }

    #[test]
    fn part_serializes_untagged() {
        let part = Part::Text { text: "hello".to_string() };
        assert_eq!(serde_json::to_value(&part).unwrap(), serde_json::json!({"text": "hello"}));
    }

    #[test]
    fn role_helpers() {
        assert_eq!(Content::system("x").role, "system");
        assert_eq!(Content::user("x").role, "user");
    }
}
