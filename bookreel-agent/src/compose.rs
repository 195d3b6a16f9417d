//! Turning lookup results and fixed lines into what gets spoken.

use crate::instructions::RECOMMENDER_INSTRUCTIONS;
use bookreel_core::{Content, Genre, Llm, LlmExt, LlmRequest, RecommendationResult, Result};

/// True for `en`, `en-US` and similar, and when the language is unknown.
pub fn is_english(language: Option<&str>) -> bool {
    language.is_none_or(|l| {
        let l = l.trim().to_ascii_lowercase();
        l.is_empty() || l == "en" || l.starts_with("en-") || l.starts_with("en_") || l == "english"
    })
}

fn join_titles(titles: &[&str]) -> String {
    match titles {
        [] => String::new(),
        [one] => (*one).to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

fn non_empty_titles(result: &RecommendationResult) -> Vec<&str> {
    result.titles.iter().map(String::as_str).filter(|t| !t.is_empty()).collect()
}

/// Plain English reply listing every title.
pub fn template_reply(result: &RecommendationResult, genre: &Genre) -> String {
    let titles = non_empty_titles(result);
    if titles.is_empty() {
        return format!(
            "I couldn't come up with any {} {} right now.",
            genre,
            result.category.noun()
        );
    }
    format!(
        "Here are some {} {} you might enjoy: {}.",
        genre,
        result.category.noun(),
        join_titles(&titles)
    )
}

/// Whether `reply` names every non-empty title.
pub fn mentions_all_titles(reply: &str, result: &RecommendationResult) -> bool {
    let reply = reply.to_lowercase();
    non_empty_titles(result).iter().all(|title| reply.contains(&title.to_lowercase()))
}

/// Ask the model for a friendly reply listing the titles. Falls back to
/// [`template_reply`], in the user's language, when the model drops a title.
pub async fn compose_reply(
    model: &dyn Llm,
    result: &RecommendationResult,
    genre: &Genre,
    language: Option<&str>,
) -> Result<String> {
    let titles = non_empty_titles(result);
    if titles.is_empty() {
        return fallback_reply(model, result, genre, language).await;
    }

    let target = language.unwrap_or("en");
    let prompt = format!(
        "The user asked for {} in the {} genre. The recommended titles are: {}. \
         Tell the user about them in a friendly tone, in the language with code '{}', \
         in at most two sentences. \
         Use every title exactly as written and do not add other titles.",
        result.category.noun(),
        genre,
        titles.join("; "),
        target
    );
    let request = LlmRequest::new(
        model.name(),
        vec![Content::system(RECOMMENDER_INSTRUCTIONS), Content::user(prompt)],
    );
    let reply = model.generate_text(request).await?;
    let reply = reply.trim();

    if reply.is_empty() || !mentions_all_titles(reply, result) {
        tracing::debug!(reply = %reply, "composed reply dropped a title; using template");
        return fallback_reply(model, result, genre, language).await;
    }
    Ok(reply.to_string())
}

/// The template, translated when the user is not speaking English. Titles
/// must survive translation verbatim, otherwise the English template wins.
async fn fallback_reply(
    model: &dyn Llm,
    result: &RecommendationResult,
    genre: &Genre,
    language: Option<&str>,
) -> Result<String> {
    let template = template_reply(result, genre);
    let Some(language) = language.filter(|l| !is_english(Some(l))) else {
        return Ok(template);
    };

    let titles = non_empty_titles(result);
    let translated = translate(model, &template, language, &titles).await?;
    if !mentions_all_titles(&translated, result) {
        tracing::warn!(language, "translated template lost a title; speaking English");
        return Ok(template);
    }
    Ok(translated)
}

/// Translate a fixed line into `language`. English and unknown languages
/// are returned unchanged without a model call.
pub async fn localize(model: &dyn Llm, line: &str, language: Option<&str>) -> Result<String> {
    match language.filter(|l| !is_english(Some(l))) {
        Some(language) => translate(model, line, language, &[]).await,
        None => Ok(line.to_string()),
    }
}

async fn translate(model: &dyn Llm, line: &str, language: &str, keep: &[&str]) -> Result<String> {
    let mut prompt = format!(
        "Translate this assistant line into the language with code '{language}'. \
         Reply with the translation only."
    );
    if !keep.is_empty() {
        prompt.push_str(&format!(" Keep these titles exactly as written: {}.", keep.join("; ")));
    }
    prompt.push_str("\n\n");
    prompt.push_str(line);

    let request = LlmRequest::new(
        model.name(),
        vec![Content::system(RECOMMENDER_INSTRUCTIONS), Content::user(prompt)],
    );
    let translated = model.generate_text(request).await?;
    let translated = translated.trim();
    if translated.is_empty() {
        return Ok(line.to_string());
    }
    Ok(translated.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookreel_core::Category;

    fn books() -> RecommendationResult {
        RecommendationResult::new(
            Category::Book,
            vec!["Dune".into(), "Foundation".into(), "Neuromancer".into()],
        )
    }

    #[test]
    fn english_detection() {
        assert!(is_english(None));
        assert!(is_english(Some("en")));
        assert!(is_english(Some("en-US")));
        assert!(!is_english(Some("es")));
        assert!(!is_english(Some("fr-CA")));
    }

    #[test]
    fn template_lists_titles() {
        assert_eq!(
            template_reply(&books(), &Genre::new("science fiction")),
            "Here are some science fiction books you might enjoy: Dune, Foundation, and Neuromancer."
        );
    }

    #[test]
    fn template_handles_degenerate_results() {
        let empty = RecommendationResult::new(Category::Movie, vec![String::new()]);
        assert_eq!(
            template_reply(&empty, &Genre::new("noir")),
            "I couldn't come up with any noir movies right now."
        );
        let two = RecommendationResult::new(Category::Movie, vec!["Heat".into(), "".into(), "Ronin".into()]);
        assert_eq!(
            template_reply(&two, &Genre::new("crime")),
            "Here are some crime movies you might enjoy: Heat and Ronin."
        );
    }

    #[test]
    fn title_check_is_case_insensitive() {
        assert!(mentions_all_titles("You'll love dune, FOUNDATION and Neuromancer!", &books()));
        assert!(!mentions_all_titles("You'll love Dune and Foundation!", &books()));
    }
}
