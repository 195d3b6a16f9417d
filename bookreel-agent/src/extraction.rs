//! Structured extraction of category and genre from one user turn.
//!
//! The model only proposes values. The policy decides what they mean.

use crate::instructions::RECOMMENDER_INSTRUCTIONS;
use crate::policy::PolicyState;
use bookreel_core::{BookreelError, Category, Content, Genre, Llm, LlmExt, LlmRequest, Result};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryChoice {
    Book,
    Movie,
    None,
}

/// What the model heard in the user's turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extraction {
    pub category: CategoryChoice,
    #[serde(default)]
    pub genre: Option<String>,
    pub genre_recognized: bool,
    #[serde(default)]
    pub language: Option<String>,
}

impl Extraction {
    pub fn category(&self) -> Option<Category> {
        match self.category {
            CategoryChoice::Book => Some(Category::Book),
            CategoryChoice::Movie => Some(Category::Movie),
            CategoryChoice::None => None,
        }
    }

    /// Genre the model recognized, if any. Blank genres never count.
    pub fn recognized_genre(&self) -> Option<Genre> {
        if !self.genre_recognized {
            return None;
        }
        self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()).map(Genre::from)
    }

    /// Whether the user offered a genre at all, recognized or not.
    pub fn mentions_genre(&self) -> bool {
        self.genre.as_deref().is_some_and(|g| !g.trim().is_empty())
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

pub fn extraction_schema() -> Value {
    json!({
        "title": "Extraction",
        "type": "object",
        "properties": {
            "category": {
                "type": "string",
                "enum": ["book", "movie", "none"],
                "description": "What the user wants recommended, or none if unclear."
            },
            "genre": {
                "type": ["string", "null"],
                "description": "Genre in the user's words, translated to English, or null."
            },
            "genre_recognized": {
                "type": "boolean",
                "description": "True only if genre names a real book or movie genre."
            },
            "language": {
                "type": ["string", "null"],
                "description": "BCP-47 code of the language the user spoke, e.g. en, es, fr."
            }
        },
        "required": ["category", "genre", "genre_recognized", "language"],
        "additionalProperties": false
    })
}

fn state_hint(state: &PolicyState) -> String {
    match state {
        PolicyState::AwaitingGenre { category, .. } => format!(
            "The user already chose {}. You asked which genre they want.",
            category.noun()
        ),
        _ => "You asked whether the user wants a book or a movie recommendation.".to_string(),
    }
}

pub fn build_request(model: &str, state: &PolicyState, utterance: &str) -> LlmRequest {
    let system = format!(
        "{RECOMMENDER_INSTRUCTIONS}\n\nDo not answer the user. Classify their last message \
         and fill in the JSON fields. {}",
        state_hint(state)
    );
    LlmRequest::new(model, vec![Content::system(system), Content::user(utterance)])
        .with_response_schema(extraction_schema())
}

/// Ask the model to classify `utterance`. Transport failures propagate;
/// schema mismatches come back as `Ok(None)`.
pub async fn extract(model: &dyn Llm, state: &PolicyState, utterance: &str) -> Result<Option<Extraction>> {
    let request = build_request(model.name(), state, utterance);
    match model.generate_json::<Extraction>(request).await {
        Ok(extraction) => Ok(Some(extraction)),
        Err(BookreelError::Serde(e)) => {
            tracing::warn!(error = %e, "extraction did not match schema");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
