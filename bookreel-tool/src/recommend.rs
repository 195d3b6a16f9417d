//! Recommendation lookup: prompt construction, model call, and title parsing.

use crate::FunctionTool;
use bookreel_core::{
    BookreelError, Category, Content, Genre, Llm, LlmExt, LlmRequest, RecommendationRequest,
    RecommendationResult, Result, ToolContext,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Number of titles requested from the model.
pub const RECOMMENDATION_COUNT: usize = 3;

/// Arguments accepted by both recommendation tools.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenreArgs {
    /// Genre the user asked for, in their own words.
    pub genre: String,
}

pub fn build_prompt(category: Category, genre: &Genre) -> String {
    format!(
        "Please recommend {RECOMMENDATION_COUNT} popular {} in the {} genre. \
         List only the {} titles separated by commas.",
        category.noun(),
        genre,
        category.as_str()
    )
}

/// Split on `,` and trim each piece. `""` yields `[""]`.
pub fn parse_titles(text: &str) -> Vec<String> {
    text.split(',').map(|title| title.trim().to_string()).collect()
}

pub async fn lookup(model: &dyn Llm, request: &RecommendationRequest) -> Result<RecommendationResult> {
    let prompt = build_prompt(request.category, &request.genre);
    let llm_request = LlmRequest::new(model.name(), vec![Content::user(prompt)]);
    let text = model.generate_text(llm_request).await?;

    let result = RecommendationResult::new(request.category, parse_titles(&text));
    if result.has_empty_title() {
        tracing::warn!(
            category = %request.category,
            genre = %request.genre,
            raw = %text,
            "model output produced an empty title"
        );
    }
    Ok(result)
}

fn recommendation_tool(category: Category, description: &'static str) -> FunctionTool {
    FunctionTool::new(category.tool_name(), description, move |ctx: Arc<dyn ToolContext>, args: Value| async move {
        let args: GenreArgs = serde_json::from_value(args).map_err(|e| {
            BookreelError::Tool(format!("{}: invalid arguments: {e}", category.tool_name()))
        })?;
        let request = RecommendationRequest::new(category, args.genre);
        let span = bookreel_telemetry::tool_execute_span(category.tool_name());
        let model = ctx.model();
        let result = lookup(model.as_ref(), &request).instrument(span).await?;
        Ok(result.to_tool_output())
    })
    .with_parameters_schema::<GenreArgs>()
}

/// `recommend_books`: three popular books in a genre.
pub fn recommend_books() -> FunctionTool {
    recommendation_tool(Category::Book, "Recommend popular books in the given genre.")
}

/// `recommend_movies`: three popular movies in a genre.
pub fn recommend_movies() -> FunctionTool {
    recommendation_tool(Category::Movie, "Recommend popular movies in the given genre.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_matches_wording() {
        assert_eq!(
            build_prompt(Category::Book, &Genre::new("fantasy")),
            "Please recommend 3 popular books in the fantasy genre. \
             List only the book titles separated by commas."
        );
        assert_eq!(
            build_prompt(Category::Movie, &Genre::new("noir")),
            "Please recommend 3 popular movies in the noir genre. \
             List only the movie titles separated by commas."
        );
    }

    #[test]
    fn empty_text_yields_single_empty_title() {
        assert_eq!(parse_titles(""), vec![String::new()]);
    }

    #[test]
    fn trailing_comma_keeps_empty_title() {
        assert_eq!(parse_titles("Dune, Foundation,"), vec!["Dune", "Foundation", ""]);
    }

    #[test]
    fn no_dedup() {
        assert_eq!(parse_titles("Dune,Dune"), vec!["Dune", "Dune"]);
    }
}
